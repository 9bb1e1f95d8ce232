//! Password hashing and verification with Argon2id.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::OnceLock;

use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use super::RegistrationError;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `RegistrationError::WeakPassword` if the password is too short or too long.
pub fn validate_password(password: &str) -> Result<(), RegistrationError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(RegistrationError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(RegistrationError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password into an Argon2id PHC string.
///
/// # Errors
///
/// Returns `RegistrationError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, RegistrationError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| RegistrationError::PasswordHash)
}

/// Verify a password against a stored PHC hash.
///
/// The digest comparison is constant-time. A hash that cannot be parsed never
/// verifies.
#[must_use]
pub fn verify_password(password: &str, hash: &SecretString) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash.expose_secret()) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };

    // Parameters come from the PHC string, so the default instance verifies
    // hashes made with any cost settings.
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Verify `password` against a hash no credential owns.
///
/// Costs the same as checking a real credential, so a lookup that matched
/// nothing takes as long as a wrong password. Returns `false` unless the
/// caller guesses a random per-process password.
#[must_use]
pub fn verify_decoy(password: &str) -> bool {
    decoy_hash().is_some_and(|hash| verify_password(password, hash))
}

/// Hash of a random password, built once with the production cost settings.
fn decoy_hash() -> Option<&'static SecretString> {
    static DECOY: OnceLock<Option<SecretString>> = OnceLock::new();

    DECOY
        .get_or_init(|| {
            hash_password(&Uuid::new_v4().to_string())
                .inspect_err(|_| tracing::warn!("Failed to build decoy password hash"))
                .ok()
                .map(SecretString::from)
        })
        .as_ref()
}

#[cfg(not(test))]
fn hasher() -> Argon2<'static> {
    Argon2::default()
}

// Minimum cost keeps unit tests fast.
#[cfg(test)]
fn hasher() -> Argon2<'static> {
    use argon2::{Algorithm, Params, Version};

    let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap_or_default();
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}
