use crate::types::PartitionKey;
use thiserror::Error;

/// Every failure the retention engine can surface.
///
/// Clone so one in-flight recompute can hand the same outcome to all of
/// its waiters. Foreign errors are carried by their display text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetentionError {
    #[error("Transaction source unavailable at offset {offset}: {reason}")]
    SourceUnavailable { offset: usize, reason: String },

    #[error("Bulk scan truncated: hit the {pages}-page ceiling after {rows} rows")]
    ScanTruncated { pages: usize, rows: usize },

    #[error("Invalid page request: page={page}, limit={limit} (both must be >= 1)")]
    InvalidPage { page: usize, limit: usize },

    #[error("Recompute for partition {partition} aborted before publishing a result")]
    ComputationAborted { partition: PartitionKey },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for RetentionError {
    fn from(e: rusqlite::Error) -> Self {
        RetentionError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for RetentionError {
    fn from(e: serde_json::Error) -> Self {
        RetentionError::Serialization(e.to_string())
    }
}

pub type RetentionResult<T> = Result<T, RetentionError>;
