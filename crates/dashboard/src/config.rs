//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DASHBOARD_BACKEND_URL` - Base URL of the analytics backend API
//!
//! ## Optional
//! - `DASHBOARD_HOST` - Bind address (default: 127.0.0.1)
//! - `DASHBOARD_PORT` - Listen port (default: 3002)
//! - `DASHBOARD_BASE_URL` - Public URL of the dashboard (default: <http://localhost:3002>)
//! - `DASHBOARD_REQUEST_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `DASHBOARD_CACHE_TTL_SECS` - Query cache time-to-live (default: 60)
//! - `DASHBOARD_CACHE_CAPACITY` - Maximum cached responses (default: 2000)
//! - `DASHBOARD_CURRENCY_SYMBOL` - Symbol used for revenue figures (default: ₹)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 1.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Dashboard application configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Analytics backend base URL
    pub backend_url: Url,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the dashboard
    pub base_url: String,
    /// Timeout for each backend request
    pub request_timeout: Duration,
    /// How long cached backend reads stay fresh
    pub cache_ttl: Duration,
    /// Maximum number of cached backend reads
    pub cache_capacity: u64,
    /// Currency symbol for revenue figures
    pub currency_symbol: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl DashboardConfig {
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let backend_url = env.required("DASHBOARD_BACKEND_URL")?;
        let backend_url = Url::parse(backend_url.trim()).map_err(|e| {
            ConfigError::InvalidEnvVar("DASHBOARD_BACKEND_URL".to_string(), e.to_string())
        })?;
        if !matches!(backend_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "DASHBOARD_BACKEND_URL".to_string(),
                "must be an http or https URL".to_string(),
            ));
        }

        let host = env.parsed::<IpAddr>("DASHBOARD_HOST", "127.0.0.1")?;
        let port = env.parsed::<u16>("DASHBOARD_PORT", "3002")?;
        let base_url = env.or_default("DASHBOARD_BASE_URL", "http://localhost:3002");
        let request_timeout =
            Duration::from_secs(env.parsed::<u64>("DASHBOARD_REQUEST_TIMEOUT_SECS", "15")?);
        let cache_ttl = Duration::from_secs(env.parsed::<u64>("DASHBOARD_CACHE_TTL_SECS", "60")?);
        let cache_capacity = env.parsed::<u64>("DASHBOARD_CACHE_CAPACITY", "2000")?;
        let currency_symbol = env.or_default("DASHBOARD_CURRENCY_SYMBOL", "₹");

        let sentry_dsn = env.optional("SENTRY_DSN");
        let sentry_environment = env.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .optional("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            backend_url,
            host,
            port,
            base_url,
            request_timeout,
            cache_ttl,
            cache_capacity,
            currency_symbol,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the dashboard is served over HTTPS (decides secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get a variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<DashboardConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        DashboardConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DASHBOARD_BACKEND_URL", "http://localhost:3000/api")]).unwrap();
        assert_eq!(config.backend_url.as_str(), "http://localhost:3000/api");
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3002");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.cache_capacity, 2000);
        assert_eq!(config.currency_symbol, "₹");
        assert!(!config.is_secure());
        assert!(config.sentry_dsn.is_none());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_backend_url_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "DASHBOARD_BACKEND_URL"));

        let err = load(&[("DASHBOARD_BACKEND_URL", "   ")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn test_backend_url_must_be_http() {
        let err = load(&[("DASHBOARD_BACKEND_URL", "ftp://files.test")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        let err = load(&[("DASHBOARD_BACKEND_URL", "localhost:3000")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = load(&[
            ("DASHBOARD_BACKEND_URL", "http://localhost:3000"),
            ("DASHBOARD_PORT", "99999"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "DASHBOARD_PORT"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DASHBOARD_BACKEND_URL", "https://api.storepulse.test"),
            ("DASHBOARD_HOST", "0.0.0.0"),
            ("DASHBOARD_PORT", "8080"),
            ("DASHBOARD_BASE_URL", "https://dash.storepulse.test"),
            ("DASHBOARD_CACHE_TTL_SECS", "5"),
            ("DASHBOARD_CURRENCY_SYMBOL", "$"),
            ("SENTRY_TRACES_SAMPLE_RATE", "0.1"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert!(config.is_secure());
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
        assert_eq!(config.currency_symbol, "$");
        assert!((config.sentry_traces_sample_rate - 0.1).abs() < f32::EPSILON);
    }
}
