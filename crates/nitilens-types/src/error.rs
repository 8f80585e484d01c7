//! Parse errors for the closed key sets

use thiserror::Error;

/// Error parsing a plan tier name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid plan name: {0}")]
pub struct PlanParseError(pub String);

/// Error parsing a feature key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown feature: {0}")]
pub struct FeatureParseError(pub String);

/// Error parsing a resource key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown resource: {0}")]
pub struct ResourceParseError(pub String);
