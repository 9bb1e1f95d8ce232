//! Authentication service.
//!
//! Decides whether an (email, password) pair is valid and, if so, records the
//! sign-in and issues a signed token.
//!
//! Rejections are ordinary results, not errors: [`Authenticator::authenticate`]
//! returns `Ok(AuthResult::Failure(..))` for an unknown email and for a wrong
//! password alike, with the same reason in both cases. Only collaborator faults
//! come back as `Err(SystemError)`.

mod error;
pub mod memory;
pub mod password;
mod registration;
mod store;

pub use error::{RegistrationError, StoreError, SystemError};
pub use memory::InMemoryCredentialStore;
pub use registration::register_with_password;
pub use store::{CredentialRegistry, CredentialStore};

use std::sync::Arc;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use latchkey_core::IdentifierCase;

use crate::models::Credential;
use crate::services::token::{SessionClaims, SignedToken, TokenSigner};

/// Why a login attempt did not succeed.
///
/// There is deliberately a single reason: callers must not be able to tell an
/// unknown email from a wrong password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureReason {
    /// The email/password pair does not match a credential.
    InvalidCredentials,
}

impl AuthFailureReason {
    /// The user-facing message for this reason.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Invalid Email or password.",
        }
    }
}

/// Outcome of one authentication attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthResult {
    /// The credentials matched.
    Success {
        /// Token issued for this sign-in.
        token: SignedToken,
        /// The credential, with tracking fields already updated.
        principal: Credential,
    },
    /// The credentials did not match.
    Failure {
        /// Always [`AuthFailureReason::InvalidCredentials`].
        reason: AuthFailureReason,
    },
}

impl AuthResult {
    const fn invalid_credentials() -> Self {
        Self::Failure {
            reason: AuthFailureReason::InvalidCredentials,
        }
    }

    /// Returns `true` for [`AuthResult::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Email/password authenticator.
///
/// Cheap to clone; holds shared handles to its collaborators and takes no
/// locks of its own.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    signer: Arc<dyn TokenSigner>,
    identifier_case: IdentifierCase,
}

impl Authenticator {
    /// Create a new authenticator.
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        signer: Arc<dyn TokenSigner>,
        identifier_case: IdentifierCase,
    ) -> Self {
        Self {
            store,
            signer,
            identifier_case,
        }
    }

    /// Get a reference to the credential store.
    #[must_use]
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// Get the identifier lookup policy.
    #[must_use]
    pub const fn identifier_case(&self) -> IdentifierCase {
        self.identifier_case
    }

    /// Authenticate with email and password.
    ///
    /// The identifier is normalized under the configured [`IdentifierCase`]
    /// and looked up as-is; its format is not validated, so a malformed email
    /// is just one that matches nothing. Nothing is written unless the
    /// password verifies.
    ///
    /// # Errors
    ///
    /// Returns `SystemError::Store` if the credential store fails and
    /// `SystemError::Signer` if the token cannot be issued. Neither is retried.
    #[instrument(skip_all)]
    pub async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<AuthResult, SystemError> {
        let identifier = self.identifier_case.normalize(identifier);

        let Some(credential) = self.store.find_by_identifier(&identifier).await? else {
            verify_decoy(secret).await;
            tracing::debug!("Authentication rejected: unknown identifier");
            tracing::info!("Authentication rejected");
            return Ok(AuthResult::invalid_credentials());
        };

        if !self.store.verify_secret(&credential, secret).await? {
            tracing::debug!(user_id = %credential.id, "Authentication rejected: secret mismatch");
            tracing::info!("Authentication rejected");
            return Ok(AuthResult::invalid_credentials());
        }

        let now = Utc::now();
        let principal = self.store.record_authentication(&credential, now).await?;

        let claims = SessionClaims::new(principal.email.as_str(), principal.id, now);
        let token = self.signer.issue(&claims).await?;

        tracing::info!(
            user_id = %principal.id,
            sign_in_count = principal.sign_in_count,
            "Authentication succeeded"
        );

        Ok(AuthResult::Success { token, principal })
    }
}

/// Spend one password verification when no credential matched, so unknown
/// and known emails take the same time to reject.
async fn verify_decoy(secret: &str) {
    let secret = SecretString::from(secret);

    if let Err(e) =
        tokio::task::spawn_blocking(move || password::verify_decoy(secret.expose_secret())).await
    {
        tracing::warn!(error = %e, "Decoy password verification task failed");
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("identifier_case", &self.identifier_case)
            .finish_non_exhaustive()
    }
}
