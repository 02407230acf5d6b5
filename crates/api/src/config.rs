//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `RESTCRUD_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; when neither is set the API runs on the in-memory store)
//! - `RESTCRUD_HOST` - Bind address (default: 127.0.0.1)
//! - `RESTCRUD_PORT` - Listen port (default: 8000)
//! - `RESTCRUD_BASE_URL` - Public URL (default: <http://localhost:8000>); an
//!   `https://` URL turns on secure session cookies
//! - `RESTCRUD_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `RESTCRUD_LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate, 0.0-1.0 (default: 0.0)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password).
    /// `None` selects the in-memory store.
    pub database_url: Option<SecretString>,
    /// Maximum number of pooled database connections
    pub max_connections: u32,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    /// Sentry error tracking configuration
    pub sentry: SentryConfig,
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    /// Sentry DSN; tracking is disabled when absent
    pub dsn: Option<String>,
    /// Environment tag (e.g. "production")
    pub environment: Option<String>,
    /// Fraction of errors sent
    pub sample_rate: f32,
    /// Fraction of transactions traced
    pub traces_sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
        }
    }
}

impl Default for ApiConfig {
    /// Local development settings: in-memory store on 127.0.0.1:8000.
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 10,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
            base_url: "http://localhost:8000".to_string(),
            log_json: false,
            sentry: SentryConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database_url = lookup("RESTCRUD_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .filter(|url| !url.trim().is_empty())
            .map(SecretString::from);

        let sentry = SentryConfig {
            dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            environment: lookup("SENTRY_ENVIRONMENT"),
            sample_rate: parse_rate(&lookup, "SENTRY_SAMPLE_RATE", 1.0)?,
            traces_sample_rate: parse_rate(&lookup, "SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        };

        Ok(Self {
            database_url,
            max_connections: parse_or(&lookup, "RESTCRUD_DB_MAX_CONNECTIONS", defaults.max_connections)?,
            host: parse_or(&lookup, "RESTCRUD_HOST", defaults.host)?,
            port: parse_or(&lookup, "RESTCRUD_PORT", defaults.port)?,
            base_url: lookup("RESTCRUD_BASE_URL").unwrap_or(defaults.base_url),
            log_json: lookup("RESTCRUD_LOG_FORMAT")
                .is_some_and(|format| format.trim().eq_ignore_ascii_case("json")),
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable if present, otherwise return the default.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse a sample rate and check it lies in `0.0..=1.0`.
fn parse_rate(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: f32,
) -> Result<f32, ConfigError> {
    let rate = parse_or(lookup, key, default)?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("{rate} is outside 0.0..=1.0"),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = load(&[]).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8000");
        assert_eq!(config.max_connections, 10);
        assert!(!config.secure_cookies());
        assert!(config.sentry.dsn.is_none());
        assert!(!config.log_json);
    }

    #[test]
    fn test_json_log_format() {
        assert!(load(&[("RESTCRUD_LOG_FORMAT", "JSON")]).unwrap().log_json);
        assert!(!load(&[("RESTCRUD_LOG_FORMAT", "text")]).unwrap().log_json);
    }

    #[test]
    fn test_database_url_prefers_specific_variable() {
        let config = load(&[
            ("DATABASE_URL", "postgres://fallback/db"),
            ("RESTCRUD_DATABASE_URL", "postgres://primary/db"),
        ])
        .unwrap();
        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://primary/db"
        );

        let config = load(&[("DATABASE_URL", "postgres://fallback/db")]).unwrap();
        assert_eq!(
            config.database_url.unwrap().expose_secret(),
            "postgres://fallback/db"
        );
    }

    #[test]
    fn test_invalid_port_is_reported() {
        let err = load(&[("RESTCRUD_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "RESTCRUD_PORT"));
    }

    #[test]
    fn test_sample_rate_must_be_a_fraction() {
        assert!(load(&[("SENTRY_SAMPLE_RATE", "0.25")]).is_ok());
        assert!(load(&[("SENTRY_SAMPLE_RATE", "1.5")]).is_err());
    }

    #[test]
    fn test_https_base_url_enables_secure_cookies() {
        let config = load(&[
            ("RESTCRUD_BASE_URL", "https://shop.example.com"),
            ("RESTCRUD_HOST", "0.0.0.0"),
            ("RESTCRUD_PORT", "9000"),
        ])
        .unwrap();
        assert!(config.secure_cookies());
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = load(&[("RESTCRUD_DATABASE_URL", "postgres://user:hunter2@db/shop")]).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
