//! Analytics error types.
//!
//! Every failure mode has a named variant. No stringly-typed errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Input data that cannot support the requested computation and has
    /// no documented fallback (e.g. an empty feature matrix handed to the
    /// clusterer).
    #[error("Degenerate data for {op}: {reason}")]
    DegenerateData { op: &'static str, reason: String },

    /// The k-means solver failed to fit.
    #[error("Clustering failed: {0}")]
    Clustering(String),
}

/// Result type alias for analytics operations.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
