//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPFORGE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SHOPFORGE_BASE_URL` - Public URL of the API (`https://` enables secure cookies)
//!
//! ## Optional
//! - `SHOPFORGE_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPFORGE_PORT` - Listen port (default: 8080)
//! - `SHOPFORGE_DEFAULT_PAGE_SIZE` - Rows per page when `limit` is absent (default: 20)
//! - `SHOPFORGE_MAX_PAGE_SIZE` - Upper bound for `limit` (default: 100)
//! - `SHOPFORGE_PRICE_TOLERANCE` - Allowed drift between a displayed and the
//!   current product price at checkout (default: 0.00)
//! - `SHOPFORGE_LOG_JSON` - Emit JSON logs when set (any value)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use shopforge_core::pagination::{DEFAULT_LIMIT, MAX_LIMIT};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: String,
    /// Listing defaults and bounds
    pub pagination: PaginationConfig,
    /// Maximum accepted difference between a displayed and current price
    pub price_tolerance: Decimal,
    /// Emit structured JSON logs instead of text
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Page-size settings shared by every listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
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
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(&|key: &str| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub(crate) fn from_source(
        source: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env = Env(source);

        let database_url = env.database_url("SHOPFORGE_DATABASE_URL")?;
        let host = env.parsed_or("SHOPFORGE_HOST", "127.0.0.1".parse::<IpAddr>())?;
        let port = env.parsed_or("SHOPFORGE_PORT", Ok::<u16, std::num::ParseIntError>(8080))?;

        let base_url = env.required("SHOPFORGE_BASE_URL")?;
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("SHOPFORGE_BASE_URL".to_string(), e.to_string())
        })?;

        let default_limit = env.parsed_or(
            "SHOPFORGE_DEFAULT_PAGE_SIZE",
            Ok::<u32, std::num::ParseIntError>(DEFAULT_LIMIT),
        )?;
        let max_limit = env.parsed_or(
            "SHOPFORGE_MAX_PAGE_SIZE",
            Ok::<u32, std::num::ParseIntError>(MAX_LIMIT),
        )?;
        if max_limit == 0 || default_limit == 0 || default_limit > max_limit {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPFORGE_DEFAULT_PAGE_SIZE".to_string(),
                format!("must be between 1 and SHOPFORGE_MAX_PAGE_SIZE ({max_limit})"),
            ));
        }

        let price_tolerance = env.parsed_or(
            "SHOPFORGE_PRICE_TOLERANCE",
            Ok::<Decimal, rust_decimal::Error>(Decimal::ZERO),
        )?;
        if price_tolerance.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPFORGE_PRICE_TOLERANCE".to_string(),
                "must not be negative".to_string(),
            ));
        }

        let sentry_sample_rate = env
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .optional("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            pagination: PaginationConfig {
                default_limit,
                max_limit,
            },
            price_tolerance,
            log_json: env.optional("SHOPFORGE_LOG_JSON").is_some(),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Thin wrapper over a key lookup with the usual required/optional helpers.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable; empty strings count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }

    /// Parse a variable, or use `default` when it is unset.
    fn parsed_or<T, E>(&self, key: &str, default: Result<T, E>) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
        E: std::fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
            None => default.map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        }
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
        ApiConfig::from_source(&move |key: &str| map.get(key).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("SHOPFORGE_DATABASE_URL", "postgres://localhost/shopforge"),
        ("SHOPFORGE_BASE_URL", "http://localhost:8080"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(MINIMAL).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.pagination, PaginationConfig::default());
        assert_eq!(config.price_tolerance, Decimal::ZERO);
        assert!(!config.is_secure());
        assert!(!config.log_json);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[
            ("DATABASE_URL", "postgres://fly/db"),
            ("SHOPFORGE_BASE_URL", "https://shops.example.com"),
        ])
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fly/db");
        assert!(config.is_secure());
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[("SHOPFORGE_BASE_URL", "http://localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "SHOPFORGE_DATABASE_URL"));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("SHOPFORGE_PORT", "eighty"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "SHOPFORGE_PORT"));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = load(&[
            ("SHOPFORGE_DATABASE_URL", "postgres://localhost/shopforge"),
            ("SHOPFORGE_BASE_URL", "not a url"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "SHOPFORGE_BASE_URL"));
    }

    #[test]
    fn test_page_size_bounds() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("SHOPFORGE_DEFAULT_PAGE_SIZE", "50"));
        vars.push(("SHOPFORGE_MAX_PAGE_SIZE", "25"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_price_tolerance() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("SHOPFORGE_PRICE_TOLERANCE", "0.05"));
        let config = load(&vars).unwrap();
        assert_eq!(config.price_tolerance, "0.05".parse::<Decimal>().unwrap());

        let mut vars = MINIMAL.to_vec();
        vars.push(("SHOPFORGE_PRICE_TOLERANCE", "-1"));
        assert!(load(&vars).is_err());
    }
}
