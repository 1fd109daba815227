//! Crawl statistics gathered per depth level
//!
//! The coordinator fills one [`LevelStats`] per level and folds it into the
//! run-wide [`CrawlSummary`], which `main` prints at the end of a run.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Failure label for pipeline errors
pub const PIPELINE_FAILURE: &str = "pipeline_error";

/// Failure label for sink write errors
pub const SINK_FAILURE: &str = "sink_error";

/// Counters for one depth level
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelStats {
    /// 0-based depth
    pub depth: u32,

    /// Addresses dispatched this level
    pub processed: u64,

    /// Addresses whose fetch returned HTML
    pub fetched: u64,

    /// Records appended to the sink
    pub records_written: u64,

    /// Distinct addresses discovered across the level
    pub discovered: u64,

    /// Failure counts keyed by kind label
    pub failures: BTreeMap<String, u64>,

    /// Wall time spent on the level
    pub elapsed: Duration,
}

impl LevelStats {
    pub fn new(depth: u32) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    /// Counts one failure of the given kind
    pub fn record_failure(&mut self, kind: &str) {
        *self.failures.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn total_failures(&self) -> u64 {
        self.failures.values().sum()
    }
}

/// Summary of a whole crawl run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// One entry per level actually run, in order
    pub levels: Vec<LevelStats>,

    pub pages_fetched: u64,
    pub records_written: u64,

    /// Failure counts across all levels, keyed by kind label
    pub failures_by_kind: BTreeMap<String, u64>,
}

impl CrawlSummary {
    /// Starts an empty summary stamped with the current time
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            levels: Vec::new(),
            pages_fetched: 0,
            records_written: 0,
            failures_by_kind: BTreeMap::new(),
        }
    }

    /// Folds a completed level into the run totals
    pub fn push_level(&mut self, level: LevelStats) {
        self.pages_fetched += level.fetched;
        self.records_written += level.records_written;
        for (kind, count) in &level.failures {
            *self.failures_by_kind.entry(kind.clone()).or_insert(0) += count;
        }
        self.levels.push(level);
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn pages_processed(&self) -> u64 {
        self.levels.iter().map(|level| level.processed).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.failures_by_kind.values().sum()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Returns the share of processed addresses that produced a record
    pub fn success_rate(&self) -> f64 {
        let processed = self.pages_processed();
        if processed == 0 {
            return 0.0;
        }
        (self.records_written as f64 / processed as f64) * 100.0
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Run:");
    println!("  Started:  {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!(
        "  Duration: {:.1}s",
        summary.duration().num_milliseconds() as f64 / 1000.0
    );
    println!();

    println!("Levels:");
    for level in &summary.levels {
        println!(
            "  Depth {}: {} processed, {} records, {} discovered, {} failures ({:.2}s)",
            level.depth,
            level.processed,
            level.records_written,
            level.discovered,
            level.total_failures(),
            level.elapsed.as_secs_f64()
        );
    }
    println!();

    if !summary.failures_by_kind.is_empty() {
        println!("Failures:");
        let mut counts: Vec<_> = summary.failures_by_kind.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages recorded)",
        summary.success_rate(),
        summary.records_written,
        summary.pages_processed()
    );
}
