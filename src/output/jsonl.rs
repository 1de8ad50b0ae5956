//! JSON-lines record sink

use super::traits::{OutputResult, RecordSink, RunStatus};
use super::writer::{RecordWriter, WriterThread};
use crate::record::NormalizedRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

struct JsonlWriter {
    path: PathBuf,
    out: BufWriter<File>,
}

impl RecordWriter for JsonlWriter {
    fn write(&mut self, record: &NormalizedRecord) -> OutputResult<()> {
        let line = record.to_json()?;
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self, status: RunStatus) -> OutputResult<()> {
        self.out.flush()?;
        debug!("Closed {} ({})", self.path.display(), status.to_db_string());
        Ok(())
    }
}

/// Appends one JSON object per line to a file
pub struct JsonlSink {
    writer: WriterThread,
}

impl JsonlSink {
    /// Opens `path` for appending, creating it and its parent directory
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let writer = WriterThread::spawn(
            "jsonl",
            JsonlWriter {
                path: path.to_path_buf(),
                out: BufWriter::new(file),
            },
        )?;
        Ok(Self { writer })
    }
}

impl RecordSink for JsonlSink {
    fn append(&self, record: NormalizedRecord) {
        self.writer.send(record);
    }

    fn finalize(&self, status: RunStatus) -> OutputResult<u64> {
        self.writer.finish(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordBuilder;
    use crate::url::ContentType;
    use serde_json::Value;
    use tempfile::TempDir;

    #[test]
    fn test_one_object_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/records.jsonl");
        let sink = JsonlSink::create(&path).unwrap();

        sink.append(
            RecordBuilder::new(ContentType::Hashtag)
                .url("https://www.instagram.com/explore/tags/food/")
                .set("name", "food")
                .set("mediaCount", 12i64)
                .build(),
        );
        sink.append(RecordBuilder::new(ContentType::Hashtag).set("name", "coffee").build());
        assert_eq!(sink.finalize(RunStatus::Completed).unwrap(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "hashtag");
        assert_eq!(lines[0]["name"], "food");
        assert_eq!(lines[0]["mediaCount"], 12);
        assert_eq!(lines[0]["url"], "https://www.instagram.com/explore/tags/food/");
        assert!(lines[0]["scrapedAt"].is_string());
        assert!(lines[1].get("url").is_none());
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        std::fs::write(&path, "{\"type\":\"hashtag\",\"name\":\"old\"}\n").unwrap();

        let sink = JsonlSink::create(&path).unwrap();
        sink.append(RecordBuilder::new(ContentType::Hashtag).set("name", "new").build());
        sink.finalize(RunStatus::Completed).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
