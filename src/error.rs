use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading inputs or writing outputs. Everything that
/// happens between those two points is best-effort: bad records are logged
/// and skipped, never bubbled up (a nightly full recompute must not die on
/// one dirty row).
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },

    #[error("failed to parse JSON payload {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error
    },

    #[error("failed to parse table {path}")]
    Table {
        path: PathBuf,
        #[source]
        source: csv::Error
    },

    #[error("invalid seed boundary date: {0} (expected YYYY-MM-DD)")]
    InvalidBoundaryDate(String)
}
