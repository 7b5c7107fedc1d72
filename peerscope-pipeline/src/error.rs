//! Pipeline error types.
//!
//! Every failure mode has a named variant. No stringly-typed errors.

use std::path::PathBuf;

use peerscope_analytics::error::AnalyticsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required input file is absent. Distinct from "not configured":
    /// an input that was never configured is simply skipped, while a
    /// configured path that does not exist aborts the run with the
    /// input's name in the diagnostic.
    #[error("Missing required input '{name}': {} not found", path.display())]
    MissingInput { name: &'static str, path: PathBuf },

    /// CSV parsing failed; the message carries line context.
    #[error("CSV error in {}: {message}", path.display())]
    Csv { path: PathBuf, message: String },

    /// Filesystem failure while reading or publishing artifacts.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failure bubbled up from the analytics core.
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
