//! Configuration for the subscription API service.

use std::time::Duration;

/// Subscription API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
    /// Session token seeded for a demo Pro tenant at startup
    pub demo_session_token: Option<String>,
    /// Length of a subscription term
    pub subscription_term: chrono::Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8000,
            request_timeout: Duration::from_secs(30),
            metrics_enabled: true,
            demo_session_token: None,
            subscription_term: chrono::Duration::days(365),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let demo_session_token = std::env::var("DEMO_SESSION_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        let term_days: i64 = std::env::var("SUBSCRIPTION_TERM_DAYS")
            .unwrap_or_else(|_| "365".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("SUBSCRIPTION_TERM_DAYS"))?;
        if term_days <= 0 {
            return Err(ConfigError::Invalid("SUBSCRIPTION_TERM_DAYS"));
        }

        Ok(Self {
            http_port,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
            demo_session_token,
            subscription_term: chrono::Duration::days(term_days),
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
