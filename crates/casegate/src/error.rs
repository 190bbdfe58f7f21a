//! Rule provider error types.

use thiserror::Error;

/// A rule provider could not answer.
///
/// The engine never surfaces these to the rendering layer: a failed fetch
/// takes the most restrictive path (empty FID set, catalog-default rules).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backing store is unreachable or refused the request.
    #[error("Rule provider unavailable: {0}")]
    Unavailable(String),

    /// A rule set was rejected on write.
    #[error("Invalid rule set: {0}")]
    InvalidRuleSet(String),

    /// Any other backend failure.
    #[error("Rule provider failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for rule provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
