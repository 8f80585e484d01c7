//! Session token handling
//!
//! The token is an opaque bearer credential. It is never logged and its
//! `Debug` output is redacted.

/// Opaque bearer token identifying the tenant
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token; blank input is treated as no token
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw: String = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw token, for the `Authorization` header only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// The per-browser session store
///
/// Holds at most one token. Gates and pages read it when they mount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    token: Option<SessionToken>,
}

impl SessionContext {
    /// A session with no stored token
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session holding the given token
    pub fn with_token(token: SessionToken) -> Self {
        Self { token: Some(token) }
    }

    /// Build from a raw stored value, where blank means absent
    pub fn from_stored(raw: Option<&str>) -> Self {
        Self {
            token: raw.and_then(SessionToken::new),
        }
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Replace the stored token
    pub fn set_token(&mut self, token: Option<SessionToken>) {
        self.token = token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let token = SessionToken::new("secret-token").unwrap();
        let printed = format!("{:?}", SessionContext::with_token(token));
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("redacted"));
    }

    #[test]
    fn test_blank_token_is_absent() {
        assert!(SessionToken::new("   ").is_none());
        assert!(!SessionContext::from_stored(Some("")).is_authenticated());
        assert!(!SessionContext::from_stored(None).is_authenticated());
        assert!(SessionContext::from_stored(Some("tok")).is_authenticated());
    }
}
