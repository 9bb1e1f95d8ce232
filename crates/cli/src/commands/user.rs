//! User registration command.
//!
//! # Usage
//!
//! ```bash
//! latchkey user create -e first@gmail.com -p password
//! ```
//!
//! # Environment Variables
//!
//! - `LATCHKEY_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `LATCHKEY_IDENTIFIER_CASE` - `insensitive` (default) or `sensitive`; must
//!   match the server so stored emails are found at login

use latchkey_core::IdentifierCase;
use latchkey_server::db::{self, PgCredentialStore};
use latchkey_server::services::auth::{RegistrationError, register_with_password};
use thiserror::Error;

use super::{CommandError, database_url};

/// Errors that can occur while registering a user.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Register a user with email and password.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `UserError::Registration` if the email is invalid, the password
/// is too weak, or the email is already registered.
pub async fn create(email: &str, password: &str) -> Result<i32, UserError> {
    let case = identifier_case()?;
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url)
        .await
        .map_err(CommandError::from)?;
    let store = PgCredentialStore::new(pool);

    let credential = register_with_password(&store, email, password, case).await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}",
        credential.id,
        credential.email
    );

    Ok(credential.id.as_i32())
}

fn identifier_case() -> Result<IdentifierCase, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("LATCHKEY_IDENTIFIER_CASE").map_or(Ok(IdentifierCase::default()), |value| {
        value
            .parse()
            .map_err(|e: latchkey_core::ParseIdentifierCaseError| {
                CommandError::InvalidEnvVar("LATCHKEY_IDENTIFIER_CASE", e.to_string())
            })
    })
}
