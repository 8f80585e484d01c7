//! Plan tiers and limits

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{FeatureFlags, PlanParseError, ResourceKey};

/// Plan tier levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Free tier - $0/mo, 1 policy, 10K transactions, 3 users
    Basic,
    /// Pro tier - $299/mo, 10 policies, 1M transactions, 20 users
    Pro,
    /// Enterprise tier - $999/mo, unlimited
    Enterprise,
}

impl PlanTier {
    /// Every tier, cheapest first
    pub const ALL: [PlanTier; 3] = [Self::Basic, Self::Pro, Self::Enterprise];

    /// Get the tier name as sent on the wire
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Get the full plan definition for this tier
    pub fn plan(&self) -> Plan {
        match self {
            Self::Basic => Plan {
                name: *self,
                max_policies: Limit::Limited(1),
                max_transactions_per_month: Limit::Limited(10_000),
                max_users: Limit::Limited(3),
                price_monthly: 0.0,
                features: FeatureFlags::none(),
            },
            Self::Pro => Plan {
                name: *self,
                max_policies: Limit::Limited(10),
                max_transactions_per_month: Limit::Limited(1_000_000),
                max_users: Limit::Limited(20),
                price_monthly: 299.0,
                features: FeatureFlags::all(),
            },
            Self::Enterprise => Plan {
                name: *self,
                max_policies: Limit::Unlimited,
                max_transactions_per_month: Limit::Unlimited,
                max_users: Limit::Unlimited,
                price_monthly: 999.0,
                features: FeatureFlags::all(),
            },
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlanTier {
    type Err = PlanParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" | "free" => Ok(Self::Basic),
            "pro" | "professional" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(PlanParseError(s.to_string())),
        }
    }
}

/// A numeric cap or the "unlimited" sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limit {
    /// Hard cap
    Limited(u64),
    /// No cap
    Unlimited,
}

impl Limit {
    /// The numeric cap, if any
    pub const fn value(self) -> Option<u64> {
        match self {
            Self::Limited(n) => Some(n),
            Self::Unlimited => None,
        }
    }

    pub const fn is_unlimited(self) -> bool {
        matches!(self, Self::Unlimited)
    }
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Limited(n) => write!(f, "{n}"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Limited(n) => serializer.serialize_u64(*n),
            Self::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Negative(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self::Limited(n)),
            Raw::Negative(n) => Err(serde::de::Error::custom(format!(
                "limit must not be negative, got {n}"
            ))),
            Raw::Text(s) if s.eq_ignore_ascii_case("unlimited") => Ok(Self::Unlimited),
            Raw::Text(s) => Err(serde::de::Error::custom(format!(
                "expected integer or \"unlimited\", got {s:?}"
            ))),
        }
    }
}

/// A named pricing tier with its limits and features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Tier name
    pub name: PlanTier,
    /// Maximum active policies
    pub max_policies: Limit,
    /// Maximum transactions scanned per calendar month
    pub max_transactions_per_month: Limit,
    /// Maximum active users
    pub max_users: Limit,
    /// Monthly price in dollars
    pub price_monthly: f64,
    /// Features unlocked by this plan
    pub features: FeatureFlags,
}

impl Plan {
    /// The limit that applies to a resource
    pub const fn limit_for(&self, resource: ResourceKey) -> Limit {
        match resource {
            ResourceKey::Policies => self.max_policies,
            ResourceKey::Transactions => self.max_transactions_per_month,
            ResourceKey::Users => self.max_users,
        }
    }
}

/// The full plan catalog, cheapest first
pub fn plan_catalog() -> Vec<Plan> {
    PlanTier::ALL.iter().map(PlanTier::plan).collect()
}
