//! Output module: the record sink and crawl statistics
//!
//! This module handles:
//! - Appending one record per processed page to a JSON Lines file
//! - Recording per-level and run-wide crawl statistics

mod jsonl;
pub mod stats;
mod traits;

pub use jsonl::JsonlSink;
pub use stats::{print_summary, CrawlSummary, LevelStats};
pub use traits::{CrawlRecord, RecordSink, SinkError, SinkResult};
