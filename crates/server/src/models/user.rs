//! Credential domain type.
//!
//! Separate from the database row type so the password hash stays behind the
//! store boundary.

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use latchkey_core::{Email, UserId};

/// A registered principal (domain type).
///
/// The password hash is held privately and is never serialized or printed.
/// Only code inside this crate can read it, through
/// [`CredentialStore::verify_secret`](crate::services::auth::CredentialStore::verify_secret).
#[derive(Clone)]
pub struct Credential {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address, normalized under the configured identifier case.
    pub email: Email,
    /// When the user last authenticated successfully.
    pub last_authenticated_at: Option<DateTime<Utc>>,
    /// Number of successful authentications.
    pub sign_in_count: i32,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    secret_hash: SecretString,
}

impl Credential {
    /// Assemble a credential loaded from a store.
    #[must_use]
    pub fn new(
        id: UserId,
        email: Email,
        secret_hash: SecretString,
        last_authenticated_at: Option<DateTime<Utc>>,
        sign_in_count: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            last_authenticated_at,
            sign_in_count,
            created_at,
            secret_hash,
        }
    }

    pub(crate) const fn secret_hash(&self) -> &SecretString {
        &self.secret_hash
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("last_authenticated_at", &self.last_authenticated_at)
            .field("sign_in_count", &self.sign_in_count)
            .field("created_at", &self.created_at)
            .field("secret_hash", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.email == other.email
            && self.last_authenticated_at == other.last_authenticated_at
            && self.sign_in_count == other.sign_in_count
            && self.created_at == other.created_at
    }
}
