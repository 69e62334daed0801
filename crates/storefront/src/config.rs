//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `SESSION_KEY` - Cookie signing secret (min 32 chars, high entropy).
//!   `SESSION_STORE_KEY` is accepted as a fallback name.
//! - `ADMIN_USER` - HTTP Basic Auth username for `/admin`
//! - `ADMIN_PASS` - HTTP Basic Auth password for `/admin`
//!
//! ## Optional
//! - `APP_ENV` - `development` (default) or `production`
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 8080)
//! - `STATIC_DIR` - Stylesheets and scripts (default: crates/storefront/static)
//! - `UPLOADS_DIR` - Product images served under `/images` (default: uploads)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `TRUST_PROXY_HEADERS` - `true` to rate limit by `X-Forwarded-For` /
//!   `X-Real-IP` (default: false). Only enable behind a reverse proxy that
//!   overwrites these headers; otherwise clients choose their own key.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_KEY_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

impl AppEnv {
    /// Whether this is the production environment.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Name reported to Sentry.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "dev" | "development" => Ok(Self::Development),
            "prod" | "production" => Ok(Self::Production),
            other => Err(format!("expected 'development' or 'production', got '{other}'")),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Deployment environment
    pub app_env: AppEnv,
    /// Session cookie signing secret
    pub session_key: SecretString,
    /// Admin Basic Auth credentials
    pub admin: AdminCredentials,
    /// Directory with static assets
    pub static_dir: PathBuf,
    /// Directory with uploaded product images
    pub uploads_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Key the rate limiter on proxy headers instead of the peer address
    pub trust_proxy_headers: bool,
}

/// Admin HTTP Basic Auth credentials.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct AdminCredentials {
    /// Expected username
    pub username: String,
    /// Expected password
    pub password: SecretString,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the session key fails validation (length, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let app_env = get_env_or_default("APP_ENV", "development")
            .parse::<AppEnv>()
            .map_err(|e| ConfigError::InvalidEnvVar("APP_ENV".to_string(), e))?;
        let trust_proxy_headers = get_env_or_default("TRUST_PROXY_HEADERS", "false")
            .trim()
            .parse::<bool>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TRUST_PROXY_HEADERS".to_string(), e.to_string())
            })?;

        let (key_var, session_key) = get_session_key()?;
        validate_session_key(&session_key, key_var)?;
        validate_secret_strength(session_key.expose_secret(), key_var)?;

        let admin = AdminCredentials::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            app_env,
            session_key,
            admin,
            static_dir: PathBuf::from(get_env_or_default(
                "STATIC_DIR",
                "crates/storefront/static",
            )),
            uploads_dir: PathBuf::from(get_env_or_default("UPLOADS_DIR", "uploads")),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            trust_proxy_headers,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub const fn secure_cookies(&self) -> bool {
        self.app_env.is_production()
    }
}

impl AdminCredentials {
    fn from_env() -> Result<Self, ConfigError> {
        let username = get_required_env("ADMIN_USER")?;
        if username.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_USER".to_string(),
                "must not be empty".to_string(),
            ));
        }
        let password = get_required_secret("ADMIN_PASS")?;
        if password.expose_secret().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_PASS".to_string(),
                "must not be empty".to_string(),
            ));
        }
        Ok(Self { username, password })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get the session key, preferring `SESSION_KEY` over the older `SESSION_STORE_KEY`.
///
/// Returns the name of the variable the key was read from, for error messages.
fn get_session_key() -> Result<(&'static str, SecretString), ConfigError> {
    for key in ["SESSION_KEY", "SESSION_STORE_KEY"] {
        if let Ok(value) = std::env::var(key) {
            return Ok((key, SecretString::from(value)));
        }
    }
    Err(ConfigError::MissingEnvVar("SESSION_KEY".to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session key meets minimum length requirements.
fn validate_session_key(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_KEY_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_KEY_LENGTH,
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

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated key."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/w4w_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            app_env: AppEnv::Development,
            session_key: SecretString::from("k".repeat(32)),
            admin: AdminCredentials {
                username: "admin".to_string(),
                password: SecretString::from("hunter2-but-longer"),
            },
            static_dir: PathBuf::from("static"),
            uploads_dir: PathBuf::from("uploads"),
            sentry_dsn: None,
            trust_proxy_headers: false,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("changeme-session-key-0123456789abcdef", "SESSION_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"ab".repeat(20), "SESSION_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "SESSION_KEY");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_key_too_short() {
        let key = SecretString::from("short");
        assert!(validate_session_key(&key, "SESSION_KEY").is_err());
    }

    #[test]
    fn test_app_env_parse() {
        assert_eq!("production".parse::<AppEnv>().unwrap(), AppEnv::Production);
        assert_eq!("PROD".parse::<AppEnv>().unwrap(), AppEnv::Production);
        assert_eq!("".parse::<AppEnv>().unwrap(), AppEnv::Development);
        assert_eq!("development".parse::<AppEnv>().unwrap(), AppEnv::Development);
        assert!("staging".parse::<AppEnv>().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_secure_cookies_only_in_production() {
        let mut config = test_config();
        assert!(!config.secure_cookies());
        config.app_env = AppEnv::Production;
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_admin_credentials_debug_redacts_password() {
        let creds = AdminCredentials {
            username: "shopkeeper".to_string(),
            password: SecretString::from("super_secret_admin_pass"),
        };
        let debug_output = format!("{creds:?}");
        assert!(debug_output.contains("shopkeeper"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_admin_pass"));
    }
}
