//! Credential store capabilities.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use super::StoreError;
use super::password;
use crate::models::Credential;

/// Read and bookkeeping access to registered credentials.
///
/// Implementations must make [`record_authentication`](Self::record_authentication)
/// a single atomic update of the matched credential. Concurrent successful
/// logins for the same credential may race; the last write wins.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a credential by its normalized identifier.
    ///
    /// Returns `Ok(None)` when no credential matches.
    async fn find_by_identifier(&self, identifier: &str)
    -> Result<Option<Credential>, StoreError>;

    /// Check `secret` against the credential's stored hash.
    ///
    /// The default implementation verifies an Argon2 PHC string, which
    /// compares digests in constant time. Hashing runs on the blocking pool.
    async fn verify_secret(&self, credential: &Credential, secret: &str) -> Result<bool, StoreError> {
        let hash = credential.secret_hash().clone();
        let secret = SecretString::from(secret);

        tokio::task::spawn_blocking(move || password::verify_password(secret.expose_secret(), &hash))
            .await
            .map_err(|e| StoreError::Unavailable(format!("password verification task failed: {e}")))
    }

    /// Record a successful authentication at `at`.
    ///
    /// Sets `last_authenticated_at` and increments `sign_in_count`, returning
    /// the updated credential.
    async fn record_authentication(
        &self,
        credential: &Credential,
        at: DateTime<Utc>,
    ) -> Result<Credential, StoreError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Creation of new credentials.
///
/// Kept apart from [`CredentialStore`] so the authentication path has no way
/// to register a user.
#[async_trait]
pub trait CredentialRegistry: Send + Sync {
    /// Insert a credential with an already-normalized identifier and an
    /// Argon2 PHC hash.
    ///
    /// Returns [`StoreError::Conflict`] if the identifier is taken.
    async fn create(
        &self,
        identifier: &latchkey_core::Email,
        secret_hash: &str,
    ) -> Result<Credential, StoreError>;
}
