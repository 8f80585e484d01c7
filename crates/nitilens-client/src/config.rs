//! Client configuration

use std::time::Duration;

use thiserror::Error;

/// Default API base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Where usage snapshots come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientMode {
    /// Fetch from the subscription API
    #[default]
    Live,
    /// Serve a fixed in-process snapshot
    Demo,
}

impl std::str::FromStr for ClientMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "demo" => Ok(Self::Demo),
            _ => Err(ConfigError::Invalid("NITILENS_CLIENT_MODE")),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid environment variable: {0}")]
    Invalid(&'static str),
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, without a trailing slash
    pub base_url: String,
    /// Per-request timeout; `None` leaves requests unbounded
    pub request_timeout: Option<Duration>,
    pub mode: ClientMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    /// Create a live configuration for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: None,
            mode: ClientMode::Live,
        }
    }

    /// Load configuration from the environment
    ///
    /// Reads `NITILENS_API_URL`, `NITILENS_CLIENT_MODE` and
    /// `NITILENS_REQUEST_TIMEOUT_SECS`; all are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            std::env::var("NITILENS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let mode = match std::env::var("NITILENS_CLIENT_MODE") {
            Ok(raw) => raw.parse()?,
            Err(_) => ClientMode::Live,
        };

        let request_timeout = match std::env::var("NITILENS_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => Some(Duration::from_secs(
                raw.parse()
                    .map_err(|_| ConfigError::Invalid("NITILENS_REQUEST_TIMEOUT_SECS"))?,
            )),
            Err(_) => None,
        };

        Ok(Self::new(base_url)
            .with_mode(mode)
            .with_optional_timeout(request_timeout))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    #[must_use]
    fn with_optional_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ClientMode) -> Self {
        self.mode = mode;
        self
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ClientConfig::new("https://api.nitilens.test/");
        assert_eq!(
            config.url("/api/subscription/usage"),
            "https://api.nitilens.test/api/subscription/usage"
        );
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Demo".parse(), Ok(ClientMode::Demo));
        assert_eq!(" live".parse(), Ok(ClientMode::Live));
        assert_eq!(
            "offline".parse::<ClientMode>(),
            Err(ConfigError::Invalid("NITILENS_CLIENT_MODE"))
        );
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.mode, ClientMode::Live);
        assert!(config.request_timeout.is_none());
    }
}
