//! JSON Lines record sink

use super::traits::{CrawlRecord, RecordSink, SinkError, SinkResult};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Appends one JSON object per line to a file
///
/// The file is opened in append mode, so records from earlier runs are kept.
/// Each record is serialized up front and written with a single `write_all`
/// while holding the lock.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlSink {
    /// Opens (creating if needed) the record file at `path`
    pub fn open(path: impl AsRef<Path>) -> SinkResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        tracing::debug!("Appending records to {}", path.display());

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonlSink {
    fn append(&self, record: &CrawlRecord) -> SinkResult<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = self.file.lock().map_err(|_| SinkError::Poisoned)?;
        append_line(&mut *file, &line)?;

        Ok(())
    }
}

/// A log file that can be cut back to an earlier length
trait Truncate {
    fn current_len(&self) -> io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl Truncate for File {
    fn current_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Writes one full line, or rolls the file back to where it was
///
/// A failed write never leaves a partial line for the next record to be
/// glued onto.
fn append_line<F: Write + Truncate>(file: &mut F, line: &[u8]) -> io::Result<()> {
    let len = file.current_len()?;

    let written = file.write_all(line).and_then(|()| file.flush());
    if let Err(e) = written {
        if let Err(rollback) = file.truncate_to(len) {
            tracing::error!("Failed to roll back partial record: {}", rollback);
        }
        return Err(e);
    }

    Ok(())
}
