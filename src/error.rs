//! Error taxonomy for a correlation run.
//!
//! Every step surfaces one of these instead of substituting a placeholder value.

use thiserror::Error;

/// Result type alias for correlation operations.
pub type Result<T> = std::result::Result<T, CorrelationError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorrelationError {
    /// A job, build, snapshot or host line that should exist does not.
    #[error("{what} not found: {detail}")]
    NotFound { what: String, detail: String },

    /// A payload from either service did not have the expected shape.
    #[error("unexpected payload shape: {detail}")]
    SchemaMismatch { detail: String },

    /// Aggregation was requested over zero samples.
    #[error("metric {metric} has no samples in the requested window")]
    EmptySeries { metric: String },

    /// More than one candidate matched where exactly one was required.
    #[error("{what} is ambiguous: {count} matches")]
    Ambiguous { what: String, count: usize },

    /// Network or HTTP failure talking to an external service.
    #[error("{service} request failed: {detail}")]
    Upstream { service: String, detail: String },
}

impl CorrelationError {
    pub fn not_found(what: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            detail: detail.into(),
        }
    }

    pub fn schema(detail: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            detail: detail.into(),
        }
    }

    pub fn upstream(service: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            detail: detail.into(),
        }
    }

    /// Only transport failures are worth retrying. A missing "Running on" line
    /// means the log format changed or the build had no agent; retrying will not help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}
