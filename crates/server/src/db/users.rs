//! Postgres-backed credential store.
//!
//! Queries are checked at runtime (`query_as` with `FromRow` rows) so the crate
//! builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use sqlx::PgPool;

use latchkey_core::{Email, UserId};

use super::RepositoryError;
use crate::models::Credential;
use crate::services::auth::{CredentialRegistry, CredentialStore, StoreError};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `latchkey.user` queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    password_hash: String,
    last_authenticated_at: Option<DateTime<Utc>>,
    sign_in_count: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for Credential {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self::new(
            UserId::new(row.id),
            email,
            SecretString::from(row.password_hash),
            row.last_authenticated_at,
            row.sign_in_count,
            row.created_at,
        ))
    }
}

// =============================================================================
// Store
// =============================================================================

/// Credential store over the `latchkey.user` table.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new store on `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a credential by its normalized email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Credential>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, password_hash, last_authenticated_at, sign_in_count, created_at
            FROM latchkey.user
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Mark a successful sign-in in one statement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user no longer exists.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn track_sign_in(
        &self,
        id: UserId,
        at: DateTime<Utc>,
    ) -> Result<Credential, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE latchkey.user
            SET last_authenticated_at = $2,
                sign_in_count = sign_in_count + 1,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, last_authenticated_at, sign_in_count, created_at
            ",
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Create a new user with email and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<Credential, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO latchkey.user (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, last_authenticated_at, sign_in_count, created_at
            ",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Credential>, StoreError> {
        Ok(self.get_by_email(identifier).await?)
    }

    async fn record_authentication(
        &self,
        credential: &Credential,
        at: DateTime<Utc>,
    ) -> Result<Credential, StoreError> {
        Ok(self.track_sign_in(credential.id, at).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}

#[async_trait]
impl CredentialRegistry for PgCredentialStore {
    async fn create(&self, identifier: &Email, secret_hash: &str) -> Result<Credential, StoreError> {
        self.create_with_password(identifier, secret_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => StoreError::Conflict,
                other => StoreError::Repository(other),
            })
    }
}
