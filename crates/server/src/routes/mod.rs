//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (pings the credential store)
//!
//! # Sessions
//! POST /sessions               - Log in with email and password
//! GET  /sessions/current       - Describe the bearer token's session
//! ```

pub mod health;
pub mod sessions;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the health check routes router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// Create the session routes router.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(sessions::create))
        .route("/sessions/current", get(sessions::current))
}

/// Create all routes, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new().merge(health_routes()).merge(session_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{Router, response::Response};
    use chrono::{DateTime, TimeDelta, Utc};
    use secrecy::SecretString;

    use latchkey_core::IdentifierCase;

    use crate::config::TokenConfig;
    use crate::models::Credential;
    use crate::services::auth::{
        CredentialStore, InMemoryCredentialStore, StoreError, register_with_password,
    };
    use crate::state::AppState;

    const SECRET: &str = "kX9#mQ2$vL7@nP4!wR8&tY3*zB6^cF1%";

    /// Router over an in-memory store.
    pub struct TestApp {
        pub store: Arc<InMemoryCredentialStore>,
        state: AppState,
    }

    impl TestApp {
        pub async fn with_user(email: &str, password: &str) -> Self {
            let store = Arc::new(InMemoryCredentialStore::new());
            register_with_password(
                store.as_ref(),
                email,
                password,
                IdentifierCase::Insensitive,
            )
            .await
            .unwrap();

            let state = AppState::new(store.clone(), &token_config(), IdentifierCase::Insensitive);
            Self { store, state }
        }

        /// An app whose store refuses every call.
        pub fn unreachable() -> Self {
            let state = AppState::new(
                Arc::new(UnreachableStore),
                &token_config(),
                IdentifierCase::Insensitive,
            );
            Self {
                store: Arc::new(InMemoryCredentialStore::new()),
                state,
            }
        }

        pub fn state(&self) -> AppState {
            self.state.clone()
        }

        pub fn router(&self) -> Router {
            super::routes().with_state(self.state())
        }
    }

    fn token_config() -> TokenConfig {
        TokenConfig {
            secret: SecretString::from(SECRET),
            issuer: "latchkey".to_string(),
            ttl: TimeDelta::hours(1),
        }
    }

    pub async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    struct UnreachableStore;

    #[async_trait]
    impl CredentialStore for UnreachableStore {
        async fn find_by_identifier(
            &self,
            _identifier: &str,
        ) -> Result<Option<Credential>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn record_authentication(
            &self,
            _credential: &Credential,
            _at: DateTime<Utc>,
        ) -> Result<Credential, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }
}
