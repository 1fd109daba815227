use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Connect timeout used when none is configured (seconds)
const DEFAULT_CONNECT_TIMEOUT: u64 = 5;

/// Main configuration structure for Sumi-Scribe
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Seed address; the command line value takes precedence
    #[serde(default)]
    pub seed: Option<String>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of depth levels to process (the seed is level 0)
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of pages processed concurrently within one level
    #[serde(
        rename = "max-concurrent-pages-open",
        default = "default_max_concurrent_pages_open"
    )]
    pub max_concurrent_pages_open: u32,

    /// Total time allowed for a single fetch (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Time allowed to establish a connection (seconds)
    ///
    /// Unset means 5s, capped at `request_timeout`.
    #[serde(rename = "connect-timeout", default)]
    pub connect_timeout: Option<u64>,
}

impl CrawlerConfig {
    /// Per-fetch timeout as a `Duration`
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Connection timeout as a `Duration`
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.effective_connect_timeout())
    }

    /// Connection timeout in seconds, with the default applied
    pub fn effective_connect_timeout(&self) -> u64 {
        self.connect_timeout
            .unwrap_or_else(|| DEFAULT_CONNECT_TIMEOUT.min(self.request_timeout))
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_concurrent_pages_open: default_max_concurrent_pages_open(),
            request_timeout: default_request_timeout(),
            connect_timeout: None,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the append-only JSON-lines record file
    #[serde(rename = "records-path", default = "default_records_path")]
    pub records_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            records_path: default_records_path(),
        }
    }
}

/// How page content is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// HTML to markdown, then rewritten by the language model
    Rewrite,
    /// HTML to markdown only
    Markdown,
}

/// Content pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_pipeline_mode")]
    pub mode: PipelineMode,

    /// File holding the system prompt for the rewrite model
    #[serde(rename = "system-prompt-path", default = "default_system_prompt_path")]
    pub system_prompt_path: PathBuf,

    /// Chat model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Upper bound on one pipeline call (seconds)
    #[serde(default = "default_pipeline_timeout")]
    pub timeout: u64,
}

impl PipelineConfig {
    /// Pipeline call timeout as a `Duration`
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: default_pipeline_mode(),
            system_prompt_path: default_system_prompt_path(),
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout: default_pipeline_timeout(),
        }
    }
}

fn default_max_depth() -> u32 {
    2
}

fn default_max_concurrent_pages_open() -> u32 {
    8
}

fn default_request_timeout() -> u64 {
    7
}

fn default_crawler_name() -> String {
    "SumiScribe".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_records_path() -> PathBuf {
    PathBuf::from("crawled-sites.jsonl")
}

fn default_pipeline_mode() -> PipelineMode {
    PipelineMode::Rewrite
}

fn default_system_prompt_path() -> PathBuf {
    PathBuf::from("system-prompt.md")
}

fn default_model() -> String {
    "grok-4-fast-non-reasoning".to_string()
}

fn default_base_url() -> String {
    "https://api.x.ai/v1".to_string()
}

fn default_api_key_env() -> String {
    "XAI_API_KEY".to_string()
}

fn default_pipeline_timeout() -> u64 {
    120
}
