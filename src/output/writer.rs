//! Background writer shared by the file-backed sinks
//!
//! Records travel over a channel to a dedicated thread, so `append` never
//! blocks on disk. A final `Finish` message carries the run status; the
//! thread answers by returning its write count when joined.

use super::traits::{OutputError, OutputResult, RunStatus};
use crate::record::NormalizedRecord;
use flume::Sender;
use std::sync::Mutex;
use std::thread;
use tracing::{error, warn};

/// Storage backend driven by a [`WriterThread`]
pub(crate) trait RecordWriter: Send + 'static {
    fn write(&mut self, record: &NormalizedRecord) -> OutputResult<()>;

    /// Flushes and records the final status
    fn finish(&mut self, status: RunStatus) -> OutputResult<()>;
}

enum Message {
    Record(Box<NormalizedRecord>),
    Finish(RunStatus),
}

/// Handle for the writer thread
pub(crate) struct WriterThread {
    tx: Sender<Message>,
    handle: Mutex<Option<thread::JoinHandle<OutputResult<u64>>>>,
}

impl WriterThread {
    /// Spawns a writer thread around `writer`
    pub fn spawn<W: RecordWriter>(name: &str, writer: W) -> OutputResult<Self> {
        let (tx, rx) = flume::unbounded::<Message>();

        let handle = thread::Builder::new()
            .name(format!("{}-writer", name))
            .spawn(move || writer_loop(writer, rx))?;

        Ok(Self {
            tx,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn send(&self, record: NormalizedRecord) {
        if self.tx.send(Message::Record(Box::new(record))).is_err() {
            warn!("Record dropped: sink already closed");
        }
    }

    /// Sends the final status and waits for the thread to drain
    pub fn finish(&self, status: RunStatus) -> OutputResult<u64> {
        let handle = self
            .handle
            .lock()
            .map_err(|_| OutputError::Write("writer handle poisoned".to_string()))?
            .take()
            .ok_or(OutputError::Closed)?;

        // The thread may already have exited on a fatal error; join reports it
        let _ = self.tx.send(Message::Finish(status));

        handle
            .join()
            .map_err(|_| OutputError::Write("writer thread panicked".to_string()))?
    }
}

fn writer_loop<W: RecordWriter>(mut writer: W, rx: flume::Receiver<Message>) -> OutputResult<u64> {
    let mut written = 0u64;

    for message in rx.iter() {
        match message {
            Message::Record(record) => match writer.write(&record) {
                Ok(()) => written += 1,
                Err(e) => error!("Failed to write {} record: {}", record.content_type(), e),
            },
            Message::Finish(status) => {
                writer.finish(status)?;
                return Ok(written);
            }
        }
    }

    // Every sender dropped without a final status
    writer.finish(RunStatus::Interrupted)?;
    Ok(written)
}
