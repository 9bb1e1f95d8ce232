//! Application state shared across handlers.

use std::sync::Arc;

use latchkey_core::IdentifierCase;

use crate::config::TokenConfig;
use crate::services::auth::{Authenticator, CredentialStore};
use crate::services::token::JwtSigner;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// authenticator and the token signer.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    authenticator: Authenticator,
    signer: Arc<JwtSigner>,
}

impl AppState {
    /// Create a new application state over `store`.
    ///
    /// The same [`JwtSigner`] issues tokens for the authenticator and
    /// verifies them for bearer-protected routes.
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        token: &TokenConfig,
        identifier_case: IdentifierCase,
    ) -> Self {
        let signer = Arc::new(JwtSigner::new(&token.secret, &token.issuer, token.ttl));
        let authenticator = Authenticator::new(store, signer.clone(), identifier_case);

        Self {
            inner: Arc::new(AppStateInner {
                authenticator,
                signer,
            }),
        }
    }

    /// Get a reference to the authenticator.
    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.inner.authenticator
    }

    /// Get a reference to the token signer.
    #[must_use]
    pub fn signer(&self) -> &JwtSigner {
        &self.inner.signer
    }
}
