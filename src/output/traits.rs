//! Record sink traits and types
//!
//! This module defines the interface every record sink implements and the
//! errors a sink can report when it is opened or finalized.

use crate::record::NormalizedRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format record: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Sink already closed")]
    Closed,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Final status of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
        }
    }
}

/// Append-only destination for normalized records
///
/// `append` hands the record off and returns at once; it never waits for the
/// record to reach storage. Implementations must be thread-safe.
pub trait RecordSink: Send + Sync {
    /// Queues one record for writing
    fn append(&self, record: NormalizedRecord);

    /// Drains pending records and closes the sink
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Number of records written over the sink's lifetime
    /// * `Err(OutputError)` - Writing or closing failed
    fn finalize(&self, status: RunStatus) -> OutputResult<u64>;
}
