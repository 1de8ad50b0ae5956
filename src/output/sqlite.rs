//! SQLite record sink
//!
//! Each run gets a row in `runs` carrying the configuration hash and its
//! final status. Records land in `records` with their fields stored as one
//! JSON object, keyed back to the run.

use super::traits::{OutputResult, RecordSink, RunStatus};
use super::writer::{RecordWriter, WriterThread};
use crate::record::NormalizedRecord;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQL schema for the record database
pub const SCHEMA_SQL: &str = r#"
-- Track scrape runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- One row per normalized record
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    type TEXT NOT NULL,
    url TEXT,
    fields TEXT NOT NULL,
    scraped_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_run ON records(run_id);
CREATE INDEX IF NOT EXISTS idx_records_type ON records(type);
"#;

/// Opens a database and applies the schema
fn open_database(path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
    ",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(conn)
}

struct SqliteWriter {
    conn: Connection,
    run_id: i64,
}

impl RecordWriter for SqliteWriter {
    fn write(&mut self, record: &NormalizedRecord) -> OutputResult<()> {
        let fields = serde_json::to_string(record.fields())?;
        self.conn.execute(
            "INSERT INTO records (run_id, type, url, fields, scraped_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.run_id,
                record.content_type().as_str(),
                record.source_url(),
                fields,
                record.scraped_at().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self, status: RunStatus) -> OutputResult<()> {
        self.conn.execute(
            "UPDATE runs SET finished_at = ?1, status = ?2 WHERE id = ?3",
            params![Utc::now().to_rfc3339(), status.to_db_string(), self.run_id],
        )?;
        Ok(())
    }
}

/// Writes records to a SQLite database
pub struct SqliteSink {
    run_id: i64,
    writer: WriterThread,
}

impl SqliteSink {
    /// Opens the database and starts a new run
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `config_hash` - Hash of the configuration driving this run
    pub fn open(path: &Path, config_hash: &str) -> OutputResult<Self> {
        let conn = open_database(path)?;
        conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![
                Utc::now().to_rfc3339(),
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        let run_id = conn.last_insert_rowid();

        let writer = WriterThread::spawn("sqlite", SqliteWriter { conn, run_id })?;
        Ok(Self { run_id, writer })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }
}

impl RecordSink for SqliteSink {
    fn append(&self, record: NormalizedRecord) {
        self.writer.send(record);
    }

    fn finalize(&self, status: RunStatus) -> OutputResult<u64> {
        self.writer.finish(status)
    }
}
