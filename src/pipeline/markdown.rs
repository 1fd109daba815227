//! Local HTML to markdown conversion

use super::{ContentPipeline, PipelineError};
use async_trait::async_trait;

/// Converts HTML to markdown
pub fn html_to_markdown(html: &str) -> Result<String, PipelineError> {
    htmd::convert(html).map_err(|e| PipelineError::Conversion(e.to_string()))
}

/// Local HTML → markdown conversion with no external calls
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownPipeline;

#[async_trait]
impl ContentPipeline for MarkdownPipeline {
    async fn transform(&self, html: &str) -> Result<String, PipelineError> {
        html_to_markdown(html)
    }

    fn name(&self) -> &'static str {
        "markdown"
    }
}
