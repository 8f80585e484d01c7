//! Feature and resource keys

use serde::{Deserialize, Serialize};

use crate::{FeatureParseError, ResourceParseError};

/// Product capabilities gated by plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKey {
    /// Transaction anomaly detection
    AnomalyDetection,
    /// Remediation case workflows
    Remediation,
    /// Mapping of policies to regulations
    RegulatoryMapping,
    /// Continuous monitoring
    Monitoring,
    /// Policy impact analysis
    PolicyImpact,
    /// Multi-language policy documents
    MultiLanguage,
}

impl FeatureKey {
    /// Every feature key, in wire order
    pub const ALL: [FeatureKey; 6] = [
        Self::AnomalyDetection,
        Self::Remediation,
        Self::RegulatoryMapping,
        Self::Monitoring,
        Self::PolicyImpact,
        Self::MultiLanguage,
    ];

    /// Get the feature key string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AnomalyDetection => "anomaly_detection",
            Self::Remediation => "remediation",
            Self::RegulatoryMapping => "regulatory_mapping",
            Self::Monitoring => "monitoring",
            Self::PolicyImpact => "policy_impact",
            Self::MultiLanguage => "multi_language",
        }
    }

    /// Human-readable name used in locked banners
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::AnomalyDetection => "Anomaly Detection",
            Self::Remediation => "Remediation",
            Self::RegulatoryMapping => "Regulatory Mapping",
            Self::Monitoring => "Monitoring",
            Self::PolicyImpact => "Policy Impact",
            Self::MultiLanguage => "Multi Language",
        }
    }
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FeatureKey {
    type Err = FeatureParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| FeatureParseError(s.to_string()))
    }
}

/// Per-feature enablement flags
///
/// Absent fields deserialize as `false`, so a partial body never unlocks
/// anything it does not name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub anomaly_detection: bool,
    pub remediation: bool,
    pub regulatory_mapping: bool,
    pub monitoring: bool,
    pub policy_impact: bool,
    pub multi_language: bool,
}

impl FeatureFlags {
    /// Flags with every feature enabled
    pub const fn all() -> Self {
        Self {
            anomaly_detection: true,
            remediation: true,
            regulatory_mapping: true,
            monitoring: true,
            policy_impact: true,
            multi_language: true,
        }
    }

    /// Flags with every feature disabled
    pub const fn none() -> Self {
        Self {
            anomaly_detection: false,
            remediation: false,
            regulatory_mapping: false,
            monitoring: false,
            policy_impact: false,
            multi_language: false,
        }
    }

    /// Look up a single feature
    pub const fn get(&self, key: FeatureKey) -> bool {
        match key {
            FeatureKey::AnomalyDetection => self.anomaly_detection,
            FeatureKey::Remediation => self.remediation,
            FeatureKey::RegulatoryMapping => self.regulatory_mapping,
            FeatureKey::Monitoring => self.monitoring,
            FeatureKey::PolicyImpact => self.policy_impact,
            FeatureKey::MultiLanguage => self.multi_language,
        }
    }

    /// Set a single feature
    #[must_use]
    pub fn with(mut self, key: FeatureKey, enabled: bool) -> Self {
        match key {
            FeatureKey::AnomalyDetection => self.anomaly_detection = enabled,
            FeatureKey::Remediation => self.remediation = enabled,
            FeatureKey::RegulatoryMapping => self.regulatory_mapping = enabled,
            FeatureKey::Monitoring => self.monitoring = enabled,
            FeatureKey::PolicyImpact => self.policy_impact = enabled,
            FeatureKey::MultiLanguage => self.multi_language = enabled,
        }
        self
    }

    /// Iterate `(key, enabled)` pairs in wire order
    pub fn iter(&self) -> impl Iterator<Item = (FeatureKey, bool)> + '_ {
        FeatureKey::ALL.into_iter().map(|key| (key, self.get(key)))
    }
}

/// Metered resources with plan limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKey {
    /// Active policies
    Policies,
    /// Transactions scanned this month
    Transactions,
    /// Active users
    Users,
}

impl ResourceKey {
    /// Every resource key, in wire order
    pub const ALL: [ResourceKey; 3] = [Self::Policies, Self::Transactions, Self::Users];

    /// Get the resource key string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Policies => "policies",
            Self::Transactions => "transactions",
            Self::Users => "users",
        }
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKey {
    type Err = ResourceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ResourceParseError(s.to_string()))
    }
}
