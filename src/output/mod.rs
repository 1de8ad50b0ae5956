//! Output module for normalized records and run reports
//!
//! This module handles:
//! - Appending records to a JSON-lines file or a SQLite database
//! - Keeping records in memory for dry runs and tests
//! - Recording and printing run statistics

mod jsonl;
mod memory;
mod sqlite;
pub mod stats;
mod traits;
mod writer;

pub use jsonl::JsonlSink;
pub use memory::MemorySink;
pub use sqlite::{SqliteSink, SCHEMA_SQL};
pub use stats::{print_statistics, RunStatistics};
pub use traits::{OutputError, OutputResult, RecordSink, RunStatus};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;
use std::sync::Arc;

/// Opens the sink selected by the output configuration
///
/// # Arguments
///
/// * `config` - Output format and path
/// * `config_hash` - Hash of the configuration file, stored with SQLite runs
///
/// # Returns
///
/// * `Ok(Arc<dyn RecordSink>)` - The opened sink
/// * `Err(OutputError)` - The file or database could not be opened
pub fn open_sink(config: &OutputConfig, config_hash: &str) -> OutputResult<Arc<dyn RecordSink>> {
    let path = Path::new(&config.path);
    let sink: Arc<dyn RecordSink> = match config.format {
        OutputFormat::Jsonl => Arc::new(JsonlSink::create(path)?),
        OutputFormat::Sqlite => Arc::new(SqliteSink::open(path, config_hash)?),
    };
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_sink_by_format() {
        let dir = TempDir::new().unwrap();

        for (format, file) in [(OutputFormat::Jsonl, "r.jsonl"), (OutputFormat::Sqlite, "r.db")] {
            let config = OutputConfig {
                format,
                path: dir.path().join(file).to_string_lossy().into_owned(),
            };
            let sink = open_sink(&config, "hash").unwrap();
            assert_eq!(sink.finalize(RunStatus::Completed).unwrap(), 0);
            assert!(dir.path().join(file).exists());
        }
    }
}
