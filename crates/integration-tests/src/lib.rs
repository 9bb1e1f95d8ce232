//! Integration tests for Latchkey.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the server against a migrated database
//! LATCHKEY_DATABASE_URL=postgres://... cargo run -p latchkey-server
//!
//! # Run the ignored integration tests
//! LATCHKEY_DATABASE_URL=postgres://... cargo test -p latchkey-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `LATCHKEY_BASE_URL` - Server under test (default `http://localhost:3000`)
//! - `LATCHKEY_DATABASE_URL` - The same database the server uses, for seeding

use latchkey_core::IdentifierCase;
use latchkey_server::db::{self, PgCredentialStore};
use latchkey_server::models::Credential;
use latchkey_server::services::auth::register_with_password;
use reqwest::Client;
use secrecy::SecretString;
use uuid::Uuid;

/// Shared handles for a test run.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub store: PgCredentialStore,
    /// Sent as `X-Forwarded-For` so each test gets its own rate limit bucket.
    pub client_ip: String,
}

impl TestContext {
    /// Connect to the server and its database.
    ///
    /// # Panics
    ///
    /// Panics if `LATCHKEY_DATABASE_URL` is not set or the database is
    /// unreachable.
    pub async fn new() -> Self {
        let base_url = std::env::var("LATCHKEY_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let database_url = std::env::var("LATCHKEY_DATABASE_URL")
            .map(SecretString::from)
            .expect("LATCHKEY_DATABASE_URL must be set for integration tests");

        let pool = db::create_pool(&database_url)
            .await
            .expect("Failed to connect to test database");

        Self {
            client: Client::new(),
            base_url,
            store: PgCredentialStore::new(pool),
            client_ip: unique_client_ip(),
        }
    }

    /// Build a full URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Register a fresh user with `password` and return it.
    ///
    /// # Panics
    ///
    /// Panics if registration fails.
    pub async fn register(&self, password: &str) -> Credential {
        register_with_password(
            &self.store,
            &unique_email("first"),
            password,
            IdentifierCase::Insensitive,
        )
        .await
        .expect("Failed to register test user")
    }
}

/// An email address no other test run will use.
#[must_use]
pub fn unique_email(local: &str) -> String {
    format!("{local}+{}@gmail.com", Uuid::new_v4().simple())
}

/// An address in the 198.18.0.0/15 benchmarking range.
#[must_use]
pub fn unique_client_ip() -> String {
    let [a, b, c, ..] = Uuid::new_v4().into_bytes();
    format!("198.{}.{b}.{c}", 18 + (a & 1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn test_unique_client_ip_is_in_benchmark_range() {
        for _ in 0..32 {
            let ip: Ipv4Addr = unique_client_ip().parse().unwrap();
            let [first, second, ..] = ip.octets();
            assert_eq!(first, 198);
            assert!(second == 18 || second == 19);
        }
    }
}
