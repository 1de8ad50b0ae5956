use super::traits::{OutputError, OutputResult, RecordSink, RunStatus};
use crate::record::NormalizedRecord;
use crate::url::ContentType;
use std::sync::Mutex;

/// Keeps records in memory; used by dry runs and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<NormalizedRecord>>,
    status: Mutex<Option<RunStatus>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record appended so far
    pub fn records(&self) -> Vec<NormalizedRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn records_of(&self, content_type: ContentType) -> Vec<NormalizedRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.content_type() == content_type)
            .collect()
    }

    /// Status passed to `finalize`, if it was called
    pub fn status(&self) -> Option<RunStatus> {
        self.status.lock().ok().and_then(|s| *s)
    }
}

impl RecordSink for MemorySink {
    fn append(&self, record: NormalizedRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }

    fn finalize(&self, status: RunStatus) -> OutputResult<u64> {
        let mut slot = self
            .status
            .lock()
            .map_err(|_| OutputError::Write("status lock poisoned".to_string()))?;
        if slot.is_some() {
            return Err(OutputError::Closed);
        }
        *slot = Some(status);
        Ok(self.records().len() as u64)
    }
}
