//! Markdown rewriting through an OpenAI-compatible chat completion API

use super::{html_to_markdown, ContentPipeline, PipelineError};
use crate::config::PipelineConfig;
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";
const DEFAULT_MODEL: &str = "grok-4-fast-non-reasoning";

/// One chat message
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseRaw {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTML → markdown, then a chat model rewrite with a fixed system prompt
#[derive(Clone)]
pub struct RewritePipeline {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    system_prompt: String,
}

impl RewritePipeline {
    /// Creates a pipeline against the default endpoint and model
    pub fn new(api_key: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: system_prompt.into(),
        }
    }

    /// Builds the pipeline from configuration
    ///
    /// Reads the API key from the configured environment variable and the
    /// system prompt from disk. Both are read exactly once.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredential(config.api_key_env.clone()))?;

        let system_prompt = std::fs::read_to_string(&config.system_prompt_path)?;

        Ok(Self::new(api_key, system_prompt)
            .with_base_url(&config.base_url)
            .with_model(&config.model))
    }

    /// Set a custom base URL (proxies, other OpenAI-compatible providers)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends markdown to the model and returns its rewrite
    pub async fn rewrite(&self, markdown: &str) -> Result<String, PipelineError> {
        let start = std::time::Instant::now();

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(self.system_prompt.as_str()),
                ChatMessage::user(markdown),
            ],
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!("Chat completion failed with {}: {}", status, detail);
            return Err(PipelineError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let body: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| PipelineError::Parse(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(PipelineError::EmptyResponse)?;

        tracing::debug!(
            "Chat completion with {} took {}ms",
            self.model,
            start.elapsed().as_millis()
        );

        Ok(content)
    }
}

impl fmt::Debug for RewritePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewritePipeline")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl ContentPipeline for RewritePipeline {
    async fn transform(&self, html: &str) -> Result<String, PipelineError> {
        let markdown = html_to_markdown(html)?;
        self.rewrite(&markdown).await
    }

    fn name(&self) -> &'static str {
        "rewrite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pipeline_for(server: &MockServer) -> RewritePipeline {
        RewritePipeline::new("test-key", "Clean this up")
            .with_base_url(format!("{}/v1/", server.uri()))
            .with_model("test-model")
    }

    #[test]
    fn test_builder() {
        let pipeline = RewritePipeline::new("secret", "prompt")
            .with_base_url("https://custom.api.com/v1/")
            .with_model("custom");

        assert_eq!(pipeline.base_url(), "https://custom.api.com/v1");
        assert_eq!(pipeline.model(), "custom");
        assert!(!format!("{:?}", pipeline).contains("secret"));
    }

    #[test]
    fn test_from_config_reads_credential_and_prompt() {
        let mut prompt = NamedTempFile::new().unwrap();
        prompt.write_all(b"You tidy markdown.").unwrap();
        prompt.flush().unwrap();

        std::env::set_var("SUMI_SCRIBE_TEST_REWRITE_KEY", "abc123");
        let config = PipelineConfig {
            api_key_env: "SUMI_SCRIBE_TEST_REWRITE_KEY".to_string(),
            system_prompt_path: prompt.path().to_path_buf(),
            model: "m".to_string(),
            ..PipelineConfig::default()
        };

        let pipeline = RewritePipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.system_prompt, "You tidy markdown.");
        assert_eq!(pipeline.api_key, "abc123");
        assert_eq!(pipeline.model(), "m");
    }

    #[test]
    fn test_from_config_missing_prompt_file() {
        std::env::set_var("SUMI_SCRIBE_TEST_PROMPTLESS_KEY", "abc123");
        let config = PipelineConfig {
            api_key_env: "SUMI_SCRIBE_TEST_PROMPTLESS_KEY".to_string(),
            system_prompt_path: "/nonexistent/system-prompt.md".into(),
            ..PipelineConfig::default()
        };

        assert!(matches!(
            RewritePipeline::from_config(&config),
            Err(ConfigError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_transform_rewrites_markdown() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({ "model": "test-model" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Clean text" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let content = pipeline_for(&server)
            .transform("<h1>Messy</h1>")
            .await
            .unwrap();
        assert_eq!(content, "Clean text");
    }

    #[tokio::test]
    async fn test_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let error = pipeline_for(&server).rewrite("text").await.unwrap_err();
        assert!(matches!(
            error,
            PipelineError::Api { status: 500, ref detail } if detail == "overloaded"
        ));
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let error = pipeline_for(&server).rewrite("text").await.unwrap_err();
        assert!(matches!(error, PipelineError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
            .mount(&server)
            .await;

        let error = pipeline_for(&server).rewrite("text").await.unwrap_err();
        assert!(matches!(error, PipelineError::Parse(_)));
    }
}
