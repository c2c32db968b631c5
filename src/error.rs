//! Error types for the route optimizer.
//!
//! Only [`ValidationError`] is ever surfaced to a caller as a rejected
//! request. [`RoutingError`] is caught at the enrichment boundary and
//! downgraded to "no geometry".

use crate::catalog::LocationId;
use thiserror::Error;

/// Request rejected before any evolutionary work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A mandatory stop is not present in the location catalog.
    #[error("required stop {0} is not in the location catalog")]
    UnknownRequiredStop(LocationId),
    /// A location referenced by an explicit ordering is not in the catalog.
    #[error("location {0} is not in the location catalog")]
    UnknownLocation(LocationId),
}

/// Failure of an `optimize_routes` call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    /// Algorithm parameters out of range (e.g. min > max locations).
    #[error("invalid optimizer configuration: {0}")]
    Config(String),
}

/// Failure reported by a routing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// Credentials or endpoint missing for the requested provider.
    #[error("routing provider not configured: {0}")]
    Configuration(String),
    /// Network error, timeout, non-2xx status or malformed payload.
    #[error("routing provider failed: {0}")]
    Transient(String),
}

impl From<reqwest::Error> for RoutingError {
    fn from(e: reqwest::Error) -> Self {
        RoutingError::Transient(e.to_string())
    }
}

/// Failure while loading a location catalog from disk.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV catalog: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate location id {0}")]
    DuplicateId(LocationId),
    #[error("location {0} has a non-finite coordinate")]
    InvalidCoordinate(LocationId),
    #[error("location {0} has a non-finite sentiment")]
    InvalidSentiment(LocationId),
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(String),
}
