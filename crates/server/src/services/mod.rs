//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Email/password authentication and credential registration
//! - `token` - Signed session tokens (JWT)

pub mod auth;
pub mod token;

pub use auth::{AuthFailureReason, AuthResult, Authenticator, SystemError};
pub use token::{JwtSigner, SignedToken, TokenSigner};
