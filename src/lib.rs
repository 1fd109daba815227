//! Sumi-Scribe: a depth-bounded content crawler
//!
//! This crate crawls breadth-first outward from a single seed address,
//! converts every HTML page it reaches into markdown (optionally rewritten
//! by a language model) and appends one JSON record per page to an
//! append-only log.

pub mod config;
pub mod crawler;
pub mod output;
pub mod pipeline;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Scribe operations
///
/// Only startup and orchestration failures surface as a `ScribeError`.
/// Per-page failures are reported through logging and the crawl summary.
#[derive(Debug, Error)]
pub enum ScribeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Sink error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] pipeline::PipelineError),

    #[error("Invalid frontier transition from {0:?}")]
    InvalidTransition(crawler::CrawlPhase),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Sumi-Scribe operations
pub type Result<T> = std::result::Result<T, ScribeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, Coordinator, FetchError, FetchErrorKind, FrontierState};
pub use output::{CrawlRecord, CrawlSummary};
pub use url::{normalize, Address};
