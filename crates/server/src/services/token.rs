//! Signed session tokens.
//!
//! The authenticator hands a [`TokenSigner`] the minimal [`SessionClaims`]
//! (who and when). The signer decides everything else about the token: the
//! production [`JwtSigner`] issues HS256 JSON Web Tokens and adds expiry,
//! issuer, and a unique token ID.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use latchkey_core::UserId;

/// Errors from issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum SignerError {
    /// The token could not be encoded.
    #[error("failed to encode token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    /// The expiry would overflow the representable time range.
    #[error("token lifetime overflows the issue time")]
    InvalidLifetime,

    /// The token has expired.
    #[error("token expired")]
    Expired,

    /// The token is malformed, has a bad signature, or the wrong issuer.
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// An opaque bearer token.
///
/// `Debug` output is redacted; use [`SignedToken::as_str`] to get the value
/// for a response.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedToken(String);

impl SignedToken {
    /// Wrap an already-signed token string.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for SignedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SignedToken").field(&"[REDACTED]").finish()
    }
}

/// The claims the authenticator asks a signer to embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Normalized identifier (email) of the principal.
    pub sub: String,
    /// Database ID of the principal.
    pub uid: UserId,
    /// Issue time, whole seconds.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,
}

impl SessionClaims {
    /// Build claims for `sub`/`uid` issued at `issued_at`.
    ///
    /// Sub-second precision is dropped so the claims survive encoding unchanged.
    #[must_use]
    pub fn new(sub: impl Into<String>, uid: UserId, issued_at: DateTime<Utc>) -> Self {
        Self {
            sub: sub.into(),
            uid,
            iat: issued_at.trunc_subsecs(0),
        }
    }
}

/// The full claim set of a JWT issued by [`JwtSigner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Claims supplied by the authenticator.
    #[serde(flatten)]
    pub session: SessionClaims,
    /// Expiry time.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,
    /// Issuer.
    pub iss: String,
    /// Unique token ID.
    pub jti: Uuid,
}

/// Issues signed tokens for authenticated principals.
#[async_trait]
pub trait TokenSigner: Send + Sync {
    /// Sign a token carrying at least `claims`.
    async fn issue(&self, claims: &SessionClaims) -> Result<SignedToken, SignerError>;
}

/// HS256 JSON Web Token signer and verifier.
#[derive(Clone)]
pub struct JwtSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: TimeDelta,
}

impl JwtSigner {
    /// Create a signer using `secret` as the HMAC key.
    #[must_use]
    pub fn new(secret: &SecretString, issuer: impl Into<String>, ttl: TimeDelta) -> Self {
        let key = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(key),
            decoding_key: DecodingKey::from_secret(key),
            issuer: issuer.into(),
            ttl,
        }
    }

    /// Sign `claims` into a JWT.
    ///
    /// # Errors
    ///
    /// Returns `SignerError::InvalidLifetime` if the expiry overflows, or
    /// `SignerError::Encode` if encoding fails.
    pub fn sign(&self, claims: &SessionClaims) -> Result<SignedToken, SignerError> {
        let exp = claims
            .iat
            .checked_add_signed(self.ttl)
            .ok_or(SignerError::InvalidLifetime)?;

        let token_claims = TokenClaims {
            session: claims.clone(),
            exp,
            iss: self.issuer.clone(),
            jti: Uuid::new_v4(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &token_claims, &self.encoding_key)
            .map(SignedToken)
            .map_err(SignerError::Encode)
    }

    /// Verify a token's signature, expiry, and issuer.
    ///
    /// # Errors
    ///
    /// Returns `SignerError::Expired` for an expired token and
    /// `SignerError::Invalid` for any other verification failure.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, SignerError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SignerError::Expired,
                _ => SignerError::Invalid(e),
            })
    }
}

impl std::fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSigner")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .field("key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenSigner for JwtSigner {
    async fn issue(&self, claims: &SessionClaims) -> Result<SignedToken, SignerError> {
        self.sign(claims)
    }
}
