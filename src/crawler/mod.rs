//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with failure classification
//! - HTML parsing and link extraction
//! - The depth-bounded frontier state machine
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, FetchError, FetchErrorKind, FetchOutcome, Fetcher};
pub use frontier::{CrawlPhase, FrontierState};
pub use parser::{extract_links, parse_html, ParsedPage};

use crate::config::Config;
use crate::output::{CrawlSummary, JsonlSink};
use crate::pipeline::build_pipeline;
use crate::url::Address;
use crate::ScribeError;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the content pipeline (reading its credential and prompt)
/// 2. Open the JSON Lines record file for appending
/// 3. Crawl level by level from `seed`
///
/// Pipeline and sink setup failures abort before any page is fetched.
///
/// # Arguments
///
/// * `config` - The validated crawler configuration
/// * `seed` - The root address
pub async fn crawl(config: Config, seed: Address) -> Result<CrawlSummary, ScribeError> {
    let pipeline = build_pipeline(&config.pipeline)?;
    let sink = Arc::new(JsonlSink::open(&config.output.records_path)?);

    tracing::info!(
        "Crawling from {} into {}",
        seed,
        config.output.records_path.display()
    );

    let mut coordinator = Coordinator::new(&config, seed, pipeline, sink)?;
    coordinator.run().await
}
