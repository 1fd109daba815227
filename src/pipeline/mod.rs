//! Content pipeline: raw HTML in, stored text out
//!
//! The crawler treats the pipeline as an injected collaborator behind the
//! [`ContentPipeline`] trait. Two implementations ship with the crate:
//!
//! - [`MarkdownPipeline`] converts HTML to markdown locally
//! - [`RewritePipeline`] converts to markdown, then has a chat model
//!   rewrite the result using a configured system prompt

mod markdown;
mod rewrite;

pub use markdown::{html_to_markdown, MarkdownPipeline};
pub use rewrite::{ChatMessage, ChatRequest, RewritePipeline};

use crate::config::{PipelineConfig, PipelineMode};
use crate::ConfigError;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while producing page content
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("HTML conversion failed: {0}")]
    Conversion(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Pipeline call exceeded {0}s")]
    Timeout(u64),
}

/// Turns the raw HTML of one page into the text that gets stored
///
/// Implementations may be slow and may fail; a failure only costs the
/// record for that page.
#[async_trait]
pub trait ContentPipeline: Send + Sync {
    /// Produces stored content from raw HTML
    async fn transform(&self, html: &str) -> Result<String, PipelineError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Builds the pipeline selected by the configuration
///
/// The rewrite pipeline reads its credential and system prompt here, so a
/// missing key or prompt file aborts the run before any crawling starts.
pub fn build_pipeline(config: &PipelineConfig) -> Result<Arc<dyn ContentPipeline>, ConfigError> {
    match config.mode {
        PipelineMode::Markdown => Ok(Arc::new(MarkdownPipeline)),
        PipelineMode::Rewrite => Ok(Arc::new(RewritePipeline::from_config(config)?)),
    }
}
