//! Session route handlers.
//!
//! `POST /sessions` exchanges an email and password for a signed token.
//! `GET /sessions/current` echoes back who a bearer token belongs to.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use latchkey_core::UserId;

use crate::error::{Result, set_sentry_user};
use crate::middleware::RequireToken;
use crate::models::Credential;
use crate::services::auth::AuthResult;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Body of `POST /sessions`.
///
/// Absent or `null` fields become empty strings so they reach the
/// authenticator and fail like any other wrong credential.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateSessionRequest {
    pub user: Option<SessionCredentials>,
}

/// Login credentials as submitted.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct SessionCredentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl CreateSessionRequest {
    /// Fold missing values into `(email, password)`.
    fn into_credentials(self) -> (String, String) {
        let user = self.user.unwrap_or_default();
        (
            user.email.unwrap_or_default(),
            user.password.unwrap_or_default(),
        )
    }
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Body of a successful `POST /sessions`.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserView,
}

/// Public view of an authenticated user.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub last_authenticated_at: Option<DateTime<Utc>>,
    pub sign_in_count: i32,
}

impl From<Credential> for UserView {
    fn from(credential: Credential) -> Self {
        Self {
            id: credential.id,
            email: credential.email.into_inner(),
            last_authenticated_at: credential.last_authenticated_at,
            sign_in_count: credential.sign_in_count,
        }
    }
}

/// Body of `GET /sessions/current`.
#[derive(Debug, Serialize)]
pub struct CurrentSessionResponse {
    pub id: UserId,
    pub email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle login.
///
/// # Errors
///
/// Returns `AppError::AuthFailure` (401) for a wrong email or password,
/// `AppError::System` (500) when a collaborator fails, and
/// `AppError::BadRequest` when the body is not JSON.
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let Json(request) = payload?;
    let (email, password) = request.into_credentials();

    match state
        .authenticator()
        .authenticate(&email, &password)
        .await?
    {
        AuthResult::Success { token, principal } => {
            set_sentry_user(&principal.id);
            Ok((
                StatusCode::CREATED,
                Json(SessionResponse {
                    token: token.into_inner(),
                    user: principal.into(),
                }),
            ))
        }
        AuthResult::Failure { reason } => Err(reason.into()),
    }
}

/// Describe the session behind a bearer token.
pub async fn current(RequireToken(claims): RequireToken) -> Json<CurrentSessionResponse> {
    Json(CurrentSessionResponse {
        id: claims.session.uid,
        email: claims.session.sub,
        issued_at: claims.session.iat,
        expires_at: claims.exp,
    })
}
