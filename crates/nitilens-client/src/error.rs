//! Client errors

use thiserror::Error;

use crate::config::ConfigError;

/// Errors from subscription API calls
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// No session token is stored; no request was sent
    #[error("no session token")]
    NoSession,

    /// Network failure or timeout before a response arrived
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("request failed with status {status}")]
    Status {
        status: u16,
        /// `detail` field of the error body, when the server sent one
        detail: Option<String>,
    },

    /// Response body did not parse
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Message to show the user, falling back when the server gave none
    pub fn detail(&self, fallback: &str) -> String {
        match self {
            Self::Status {
                detail: Some(detail),
                ..
            } if !detail.is_empty() => detail.clone(),
            _ => fallback.to_string(),
        }
    }

    /// HTTP status, for status errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Label used in request metrics
    pub(crate) fn metric_label(&self) -> &'static str {
        match self {
            Self::NoSession => "no_session",
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Malformed(_) => "malformed",
            Self::Config(_) => "config",
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_prefers_server_message() {
        let err = ClientError::Status {
            status: 400,
            detail: Some("Invalid plan name".to_string()),
        };
        assert_eq!(err.detail("Failed to upgrade plan"), "Invalid plan name");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_detail_fallbacks() {
        let no_detail = ClientError::Status {
            status: 500,
            detail: None,
        };
        assert_eq!(
            no_detail.detail("Failed to cancel subscription"),
            "Failed to cancel subscription"
        );

        let empty = ClientError::Status {
            status: 500,
            detail: Some(String::new()),
        };
        assert_eq!(empty.detail("fallback"), "fallback");

        let transport = ClientError::Transport("connection refused".to_string());
        assert_eq!(transport.detail("Failed to upgrade plan"), "Failed to upgrade plan");
        assert_eq!(transport.status(), None);
    }
}
