//! Record sink trait and the record it stores
//!
//! A sink is shared by every worker of a level, so implementations must be
//! thread-safe and must write each record atomically with respect to other
//! writers.

use crate::url::Address;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while appending a record
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Sink lock poisoned by a panicked writer")]
    Poisoned,
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// One stored page: where it came from and what the pipeline made of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlRecord {
    /// Normalized address of the page
    pub reference: Address,

    /// Pipeline output
    pub content: String,
}

impl CrawlRecord {
    pub fn new(reference: Address, content: impl Into<String>) -> Self {
        Self {
            reference,
            content: content.into(),
        }
    }
}

/// Append-only destination for crawl records
pub trait RecordSink: Send + Sync {
    /// Appends one record
    ///
    /// A record is either written whole or not at all; concurrent calls never
    /// interleave their bytes.
    fn append(&self, record: &CrawlRecord) -> SinkResult<()>;
}
