//! Crawler coordinator - level-by-level crawl orchestration
//!
//! Each depth level is a fan-out over the frontier's pending set:
//! - Every address gets its own task, bounded by a global semaphore
//! - A task runs fetch → link extraction → content pipeline → sink
//! - The coordinator collects each task's discovered links, then applies
//!   the frontier barrier once the whole level has joined

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, FetchErrorKind, Fetcher};
use crate::crawler::frontier::{CrawlPhase, FrontierState};
use crate::crawler::parser::parse_html;
use crate::output::stats::{PIPELINE_FAILURE, SINK_FAILURE};
use crate::output::{CrawlRecord, CrawlSummary, LevelStats, RecordSink};
use crate::pipeline::{ContentPipeline, PipelineError};
use crate::url::Address;
use crate::ScribeError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// How a single page ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageOutcome {
    Recorded,
    FetchFailed(FetchErrorKind),
    PipelineFailed,
    SinkFailed,
}

/// What a worker hands back to the collector
#[derive(Debug)]
struct PageReport {
    outcome: PageOutcome,
    discovered: HashSet<Address>,
}

/// Everything a worker task needs, cheap to clone per task
#[derive(Clone)]
struct PageWorker {
    fetcher: Fetcher,
    pipeline: Arc<dyn ContentPipeline>,
    sink: Arc<dyn RecordSink>,
    pipeline_timeout: Duration,
}

impl PageWorker {
    /// Processes one address end to end
    ///
    /// A fetch failure skips the page entirely. Once HTML is in hand its
    /// links are always reported, even if the pipeline or sink fails later.
    async fn process(&self, address: Address) -> PageReport {
        let html = match self.fetcher.fetch(&address).await {
            Ok(html) => html,
            Err(error) => {
                tracing::warn!("Failed to fetch {}: {}", address, error);
                return PageReport {
                    outcome: PageOutcome::FetchFailed(error.kind),
                    discovered: HashSet::new(),
                };
            }
        };

        // Parse synchronously so the DOM never lives across an await
        let parsed = parse_html(&html, &address);
        tracing::debug!(
            "Parsed {} ({}): {} links",
            address,
            parsed.title.as_deref().unwrap_or("untitled"),
            parsed.links.len()
        );

        let outcome = match self.transform(&html).await {
            Ok(content) => {
                let record = CrawlRecord::new(address.clone(), content);
                let sink = Arc::clone(&self.sink);

                // File I/O stays off the async workers
                match tokio::task::spawn_blocking(move || sink.append(&record)).await {
                    Ok(Ok(())) => PageOutcome::Recorded,
                    Ok(Err(e)) => {
                        tracing::error!("Failed to write record for {}: {}", address, e);
                        PageOutcome::SinkFailed
                    }
                    Err(e) => {
                        tracing::error!("Record writer for {} failed: {}", address, e);
                        PageOutcome::SinkFailed
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    "{} pipeline failed for {}: {}",
                    self.pipeline.name(),
                    address,
                    e
                );
                PageOutcome::PipelineFailed
            }
        };

        PageReport {
            outcome,
            discovered: parsed.links,
        }
    }

    async fn transform(&self, html: &str) -> Result<String, PipelineError> {
        tokio::time::timeout(self.pipeline_timeout, self.pipeline.transform(html))
            .await
            .map_err(|_| PipelineError::Timeout(self.pipeline_timeout.as_secs()))?
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    worker: PageWorker,
    frontier: FrontierState,
    semaphore: Arc<Semaphore>,
}

impl Coordinator {
    /// Creates a coordinator for one run
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `seed` - The root address
    /// * `pipeline` - Content pipeline applied to every fetched page
    /// * `sink` - Destination for crawl records
    pub fn new(
        config: &Config,
        seed: Address,
        pipeline: Arc<dyn ContentPipeline>,
        sink: Arc<dyn RecordSink>,
    ) -> Result<Self, ScribeError> {
        let client = build_http_client(&config.crawler, &config.user_agent)?;

        let worker = PageWorker {
            fetcher: Fetcher::new(client),
            pipeline,
            sink,
            pipeline_timeout: config.pipeline.call_timeout(),
        };

        Ok(Self {
            worker,
            frontier: FrontierState::new(seed, config.crawler.max_depth),
            semaphore: Arc::new(Semaphore::new(
                config.crawler.max_concurrent_pages_open as usize,
            )),
        })
    }

    /// Runs every level until depth or frontier is exhausted
    pub async fn run(&mut self) -> Result<CrawlSummary, ScribeError> {
        let mut summary = CrawlSummary::start();
        let max_depth = self.frontier.max_depth();

        tracing::info!(
            "Starting crawl (max depth {}, {} pipeline)",
            max_depth,
            self.worker.pipeline.name()
        );

        let mut phase = self.frontier.start()?;

        while let CrawlPhase::Running { depth } = phase {
            let (level, discovered) = self.run_level(depth).await;

            tracing::info!(
                "Depth {}/{}: {} sites crawled | {:.2} seconds",
                depth + 1,
                max_depth,
                level.processed,
                level.elapsed.as_secs_f64()
            );
            tracing::info!(
                "Depth {}/{}: {} records written, {} failures, {} links discovered",
                depth + 1,
                max_depth,
                level.records_written,
                level.total_failures(),
                level.discovered
            );

            summary.push_level(level);
            phase = self.frontier.complete_level(discovered)?;
        }

        summary.finish();
        tracing::info!(
            "Crawl complete: {} pages visited, {} records written",
            self.frontier.visited().len(),
            summary.records_written
        );

        Ok(summary)
    }

    /// Processes the current pending set and returns its stats and links
    async fn run_level(&self, depth: u32) -> (LevelStats, HashSet<Address>) {
        let start = Instant::now();
        let mut stats = LevelStats::new(depth);
        let mut tasks = JoinSet::new();

        for address in self.frontier.level_batch() {
            // The semaphore is never closed
            let Ok(permit) = Arc::clone(&self.semaphore).acquire_owned().await else {
                break;
            };

            let worker = self.worker.clone();
            tasks.spawn(async move {
                let _permit = permit;
                worker.process(address).await
            });
            stats.processed += 1;
        }

        let mut discovered = HashSet::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => {
                    match report.outcome {
                        PageOutcome::Recorded => {
                            stats.fetched += 1;
                            stats.records_written += 1;
                        }
                        PageOutcome::FetchFailed(kind) => stats.record_failure(kind.as_str()),
                        PageOutcome::PipelineFailed => {
                            stats.fetched += 1;
                            stats.record_failure(PIPELINE_FAILURE);
                        }
                        PageOutcome::SinkFailed => {
                            stats.fetched += 1;
                            stats.record_failure(SINK_FAILURE);
                        }
                    }
                    discovered.extend(report.discovered);
                }
                Err(e) => {
                    tracing::error!("Page task failed: {}", e);
                    stats.record_failure(FetchErrorKind::UnknownError.as_str());
                }
            }
        }

        stats.discovered = discovered.len() as u64;
        stats.elapsed = start.elapsed();
        (stats, discovered)
    }

    pub fn frontier(&self) -> &FrontierState {
        &self.frontier
    }
}
