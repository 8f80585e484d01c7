//! Gate state machine

/// Why a gate is locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockReason {
    /// No session token; nothing was fetched
    NoSession,
    /// The fetch failed in transport or with a non-success status
    FetchFailed,
    /// The snapshot was missing sections
    Malformed,
    /// The subscription is not active
    Inactive,
    /// The plan does not include the feature
    NotInPlan,
}

impl LockReason {
    /// Label used in metrics and logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoSession => "no_session",
            Self::FetchFailed => "fetch_failed",
            Self::Malformed => "malformed",
            Self::Inactive => "inactive",
            Self::NotInPlan => "not_in_plan",
        }
    }
}

impl std::fmt::Display for LockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `LOADING -> {UNLOCKED, LOCKED}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Loading,
    Unlocked,
    Locked(LockReason),
}

impl GateState {
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub const fn is_unlocked(&self) -> bool {
        matches!(self, Self::Unlocked)
    }

    pub const fn is_locked(&self) -> bool {
        matches!(self, Self::Locked(_))
    }

    /// Label used in metrics and logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Unlocked => "unlocked",
            Self::Locked(reason) => reason.as_str(),
        }
    }
}
