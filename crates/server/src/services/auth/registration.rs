//! Credential registration.
//!
//! The only way a credential comes into existence. Login never calls this.

use latchkey_core::{Email, IdentifierCase};

use super::{CredentialRegistry, RegistrationError, password};
use crate::models::Credential;

/// Register a new credential with email and password.
///
/// The email is normalized under `case` before validation, so it is stored in
/// the form that later lookups use.
///
/// # Errors
///
/// Returns `RegistrationError::InvalidEmail` if the email format is invalid.
/// Returns `RegistrationError::WeakPassword` if the password doesn't meet requirements.
/// Returns `RegistrationError::UserAlreadyExists` if the email is already registered.
pub async fn register_with_password(
    registry: &dyn CredentialRegistry,
    email: &str,
    password: &str,
    case: IdentifierCase,
) -> Result<Credential, RegistrationError> {
    let email = Email::parse_with(email, case)?;

    password::validate_password(password)?;
    let password_hash = password::hash_password(password)?;

    let credential = registry.create(&email, &password_hash).await?;

    tracing::info!(user_id = %credential.id, "Credential registered");
    Ok(credential)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::auth::{CredentialStore, InMemoryCredentialStore};

    #[tokio::test]
    async fn test_register_normalizes_email() {
        let store = InMemoryCredentialStore::new();
        let credential = register_with_password(
            &store,
            "  First@Gmail.com ",
            "password",
            IdentifierCase::Insensitive,
        )
        .await
        .unwrap();

        assert_eq!(credential.email.as_str(), "first@gmail.com");
        assert_eq!(credential.sign_in_count, 0);
        assert!(credential.last_authenticated_at.is_none());

        let stored = store.find_by_identifier("first@gmail.com").await.unwrap().unwrap();
        assert!(store.verify_secret(&stored, "password").await.unwrap());
    }

    #[tokio::test]
    async fn test_register_keeps_case_when_sensitive() {
        let store = InMemoryCredentialStore::new();
        let credential = register_with_password(
            &store,
            "First@Gmail.com",
            "password",
            IdentifierCase::Sensitive,
        )
        .await
        .unwrap();

        assert_eq!(credential.email.as_str(), "First@Gmail.com");
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let store = InMemoryCredentialStore::new();
        let case = IdentifierCase::Insensitive;

        assert!(matches!(
            register_with_password(&store, "bad", "password", case).await,
            Err(RegistrationError::InvalidEmail(_))
        ));
        assert!(matches!(
            register_with_password(&store, "first@gmail.com", "almost", case).await,
            Err(RegistrationError::WeakPassword(_))
        ));
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let store = InMemoryCredentialStore::new();
        let case = IdentifierCase::Insensitive;
        register_with_password(&store, "first@gmail.com", "password", case)
            .await
            .unwrap();

        assert!(matches!(
            register_with_password(&store, "FIRST@gmail.com", "password2", case).await,
            Err(RegistrationError::UserAlreadyExists)
        ));
    }
}
