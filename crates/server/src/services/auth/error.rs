//! Authentication error types.
//!
//! Rejected logins are not errors: they come back as
//! [`AuthResult::Failure`](super::AuthResult::Failure). The types here are for
//! faults in the collaborators and for registration.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::token::SignerError;

/// Errors raised by a [`CredentialStore`](super::CredentialStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// The store could not be reached.
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    /// A credential with the same identifier already exists.
    #[error("credential already exists")]
    Conflict,
}

/// A collaborator fault during authentication.
///
/// Propagated to the caller unchanged; the HTTP boundary renders it as a 5xx.
#[derive(Debug, Error)]
pub enum SystemError {
    /// The credential store failed.
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    /// The token signer failed.
    #[error("token signer error: {0}")]
    Signer(#[from] SignerError),
}

/// Errors that can occur while registering a credential.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] latchkey_core::EmailError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// The credential store failed.
    #[error("credential store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for RegistrationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::UserAlreadyExists,
            other => Self::Store(other),
        }
    }
}
