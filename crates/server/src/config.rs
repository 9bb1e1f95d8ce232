//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LATCHKEY_TOKEN_SECRET` - HMAC key for signing tokens (min 32 chars, high entropy)
//!
//! ## Optional
//! - `LATCHKEY_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; without either, credentials are kept in memory)
//! - `LATCHKEY_HOST` - Bind address (default: 127.0.0.1)
//! - `LATCHKEY_PORT` - Listen port (default: 3000)
//! - `LATCHKEY_TOKEN_ISSUER` - `iss` claim of issued tokens (default: latchkey)
//! - `LATCHKEY_TOKEN_TTL_SECS` - Token lifetime in seconds (default: 86400, max: ten years)
//! - `LATCHKEY_IDENTIFIER_CASE` - `insensitive` or `sensitive` email lookup (default: insensitive)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use chrono::TimeDelta;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use latchkey_core::IdentifierCase;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_TOKEN_TTL_SECS: &str = "86400";
/// Ten years. Keeps `iat + ttl` far inside the range `chrono` can represent.
const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Token signing configuration
    pub token: TokenConfig,
    /// How emails are compared at login
    pub identifier_case: IdentifierCase,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Token signing configuration.
///
/// Implements `Debug` manually to redact the signing key.
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC signing key
    pub secret: SecretString,
    /// `iss` claim
    pub issuer: String,
    /// Token lifetime
    pub ttl: TimeDelta,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("LATCHKEY_DATABASE_URL");
        let host = get_env_or_default("LATCHKEY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("LATCHKEY_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("LATCHKEY_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("LATCHKEY_PORT".to_string(), e.to_string()))?;
        let identifier_case = get_env_or_default("LATCHKEY_IDENTIFIER_CASE", "insensitive")
            .parse::<IdentifierCase>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("LATCHKEY_IDENTIFIER_CASE".to_string(), e.to_string())
            })?;

        let token = TokenConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            token,
            identifier_case,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl TokenConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = get_validated_secret("LATCHKEY_TOKEN_SECRET")?;
        validate_secret_length(&secret, "LATCHKEY_TOKEN_SECRET")?;

        let ttl = parse_ttl(
            "LATCHKEY_TOKEN_TTL_SECS",
            &get_env_or_default("LATCHKEY_TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS),
        )?;

        Ok(Self {
            secret,
            issuer: get_env_or_default("LATCHKEY_TOKEN_ISSUER", "latchkey"),
            ttl,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a positive number of seconds into a token lifetime.
fn parse_ttl(var_name: &str, value: &str) -> Result<TimeDelta, ConfigError> {
    let secs = value
        .trim()
        .parse::<i64>()
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if secs <= 0 {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be a positive number of seconds".to_string(),
        ));
    }

    if secs > MAX_TOKEN_TTL_SECS {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must be at most {MAX_TOKEN_TTL_SECS} seconds"),
        ));
    }

    TimeDelta::try_seconds(secs).ok_or_else(|| {
        ConfigError::InvalidEnvVar(var_name.to_string(), "lifetime is too large".to_string())
    })
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("q8Z!v3Lr#T0m^Kp2@Xw7&Nd5*Hs9$Bj4") > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_validate_secret_strength_rejects_placeholders() {
        for value in ["your-signing-key", "changeme123", "my-jwt-secret-value"] {
            let err = validate_secret_strength(value, "TEST_VAR").unwrap_err();
            assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        }
    }

    #[test]
    fn test_validate_secret_strength_rejects_low_entropy() {
        let err = validate_secret_strength(&"ab".repeat(20), "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_accepts_random() {
        assert!(validate_secret_strength("q8Z!v3Lr#T0m^Kp2@Xw7&Nd5*Hs9$Bj4", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "TEST_VAR").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "TEST_VAR").is_ok());
    }

    #[test]
    fn test_parse_ttl() {
        assert_eq!(parse_ttl("TTL", "3600").unwrap(), TimeDelta::hours(1));
        assert_eq!(parse_ttl("TTL", " 60 ").unwrap(), TimeDelta::minutes(1));
        assert!(parse_ttl("TTL", "0").is_err());
        assert!(parse_ttl("TTL", "-5").is_err());
        assert!(parse_ttl("TTL", "soon").is_err());
        assert!(parse_ttl("TTL", &i64::MAX.to_string()).is_err());
        assert!(parse_ttl("TTL", "100000000000000").is_err());
        assert!(parse_ttl("TTL", &(MAX_TOKEN_TTL_SECS + 1).to_string()).is_err());
    }

    #[test]
    fn test_longest_ttl_still_signs() {
        use latchkey_core::UserId;

        use crate::services::token::{JwtSigner, SessionClaims};

        let ttl = parse_ttl("TTL", &MAX_TOKEN_TTL_SECS.to_string()).unwrap();
        let signer = JwtSigner::new(
            &SecretString::from("q8Z!v3Lr#T0m^Kp2@Xw7&Nd5*Hs9$Bj4"),
            "latchkey",
            ttl,
        );
        let claims = SessionClaims::new("first@gmail.com", UserId::new(1), chrono::Utc::now());

        let token = signer.sign(&claims).unwrap();
        let verified = signer.verify(token.as_str()).unwrap();
        assert_eq!(verified.exp, claims.iat + ttl);
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: None,
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            token: TokenConfig {
                secret: SecretString::from("q8Z!v3Lr#T0m^Kp2@Xw7&Nd5*Hs9$Bj4"),
                issuer: "latchkey".to_string(),
                ttl: TimeDelta::days(1),
            },
            identifier_case: IdentifierCase::Insensitive,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_token_config_debug_redacts_secret() {
        let config = TokenConfig {
            secret: SecretString::from("super_hidden_signing_key_value_0123"),
            issuer: "latchkey".to_string(),
            ttl: TimeDelta::days(1),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("latchkey"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_hidden_signing_key_value_0123"));
    }
}
