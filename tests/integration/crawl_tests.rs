//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, writing records to a temporary
//! JSON Lines file.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use sumi_scribe::config::{Config, PipelineMode};
use sumi_scribe::crawler::{crawl, Coordinator};
use sumi_scribe::output::{JsonlSink, RecordSink};
use sumi_scribe::pipeline::{ContentPipeline, PipelineError};
use sumi_scribe::url::Address;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Stores the raw HTML unchanged
struct IdentityPipeline;

#[async_trait]
impl ContentPipeline for IdentityPipeline {
    async fn transform(&self, html: &str) -> Result<String, PipelineError> {
        Ok(html.to_string())
    }

    fn name(&self) -> &'static str {
        "identity"
    }
}

/// Fails every call
struct FailingPipeline;

#[async_trait]
impl ContentPipeline for FailingPipeline {
    async fn transform(&self, _html: &str) -> Result<String, PipelineError> {
        Err(PipelineError::Api {
            status: 503,
            detail: "unavailable".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Creates a test configuration with the given depth and records file
fn create_test_config(max_depth: u32, records_path: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.max_depth = max_depth;
    config.crawler.max_concurrent_pages_open = 4;
    config.crawler.request_timeout = 5;
    config.crawler.connect_timeout = Some(2);
    config.user_agent.crawler_name = "TestBot".to_string();
    config.output.records_path = records_path.to_path_buf();
    config.pipeline.mode = PipelineMode::Markdown;
    config
}

/// Serves an HTML page with the given anchors
async fn mount_page(server: &MockServer, page: &str, links: &[&str], expected: u64) {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();

    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(
                "<html><head><title>{}</title></head><body><p>Page {}</p>{}</body></html>",
                page, page, anchors
            ),
            "text/html; charset=utf-8",
        ))
        .expect(expected)
        .mount(server)
        .await;
}

fn seed(server: &MockServer, page: &str) -> Address {
    Address::parse(&format!("{}{}", server.uri(), page)).expect("valid seed")
}

fn read_records(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is a JSON object"))
        .collect()
}

fn references(records: &[Value]) -> HashSet<String> {
    records
        .iter()
        .map(|record| record["reference"].as_str().unwrap().to_string())
        .collect()
}

async fn run_with(
    config: &Config,
    seed: Address,
    pipeline: Arc<dyn ContentPipeline>,
) -> sumi_scribe::CrawlSummary {
    let sink: Arc<dyn RecordSink> = Arc::new(JsonlSink::open(&config.output.records_path).unwrap());
    let mut coordinator = Coordinator::new(config, seed, pipeline, sink).unwrap();
    coordinator.run().await.unwrap()
}

#[tokio::test]
async fn test_two_level_scenario_writes_three_records() {
    let server = MockServer::start().await;
    let base = server.uri();

    // a links to b (absolute) and c (root-relative)
    mount_page(&server, "/a", &[&format!("{}/b", base), "/c"], 1).await;
    mount_page(&server, "/b", &["/d"], 1).await;
    mount_page(&server, "/c", &["/a", "/e"], 1).await;
    // Discovered at level 1, never fetched with max_depth 2
    mount_page(&server, "/d", &[], 0).await;
    mount_page(&server, "/e", &[], 0).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(2, &dir.path().join("records.jsonl"));

    let summary = run_with(&config, seed(&server, "/a"), Arc::new(IdentityPipeline)).await;

    let records = read_records(&config.output.records_path);
    assert_eq!(records.len(), 3);
    assert_eq!(
        references(&records),
        HashSet::from([format!("{}/a", base), format!("{}/b", base), format!("{}/c", base)])
    );
    assert!(records[0]["content"].as_str().unwrap().contains("<p>Page"));

    assert_eq!(summary.levels.len(), 2);
    assert_eq!(summary.levels[0].processed, 1);
    assert_eq!(summary.levels[0].discovered, 2);
    assert_eq!(summary.levels[1].processed, 2);
    assert_eq!(summary.records_written, 3);
    assert_eq!(summary.total_failures(), 0);
}

#[tokio::test]
async fn test_http_error_page_is_skipped() {
    let server = MockServer::start().await;

    mount_page(&server, "/a", &["/broken", "/good"], 1).await;
    mount_page(&server, "/good", &[], 1).await;

    // The error body links somewhere, but nothing is extracted from it
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_raw(r#"<html><a href="/hidden">x</a></html>"#, "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/hidden", &[], 0).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(3, &dir.path().join("records.jsonl"));

    let summary = run_with(&config, seed(&server, "/a"), Arc::new(IdentityPipeline)).await;

    let records = read_records(&config.output.records_path);
    assert_eq!(records.len(), 2);
    assert!(!references(&records).contains(&format!("{}/broken", server.uri())));
    assert_eq!(summary.failures_by_kind["http_status"], 1);
    assert_eq!(summary.levels[1].discovered, 0);
}

#[tokio::test]
async fn test_non_html_response_is_skipped() {
    let server = MockServer::start().await;

    mount_page(&server, "/a", &["/report.pdf"], 1).await;

    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"%PDF-1.4 <a href="/inside-pdf">x</a>"#, "application/pdf"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/inside-pdf", &[], 0).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(3, &dir.path().join("records.jsonl"));

    let summary = run_with(&config, seed(&server, "/a"), Arc::new(IdentityPipeline)).await;

    assert_eq!(read_records(&config.output.records_path).len(), 1);
    assert_eq!(summary.failures_by_kind["unsupported_content_type"], 1);
    // Level 1 found nothing, so the frontier is exhausted before depth 3
    assert_eq!(summary.levels.len(), 2);
}

#[tokio::test]
async fn test_no_address_is_fetched_twice() {
    let server = MockServer::start().await;

    // Every page links to every other page, including itself
    let all = ["/a", "/b", "/c", "/a#top", "/b?utm_source=nav"];
    mount_page(&server, "/a", &all, 1).await;
    mount_page(&server, "/b", &all, 1).await;
    mount_page(&server, "/c", &all, 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(10, &dir.path().join("records.jsonl"));

    let summary = run_with(&config, seed(&server, "/a"), Arc::new(IdentityPipeline)).await;

    assert_eq!(read_records(&config.output.records_path).len(), 3);

    // Level 0: a. Level 1: b, c. Level 2 would only revisit, so it never runs
    assert_eq!(summary.levels.len(), 2);
    assert!(summary.levels.len() < config.crawler.max_depth as usize);
}

#[tokio::test]
async fn test_depth_limit_stops_an_endless_chain() {
    let server = MockServer::start().await;

    mount_page(&server, "/0", &["/1"], 1).await;
    mount_page(&server, "/1", &["/2"], 1).await;
    mount_page(&server, "/2", &["/3"], 1).await;
    mount_page(&server, "/3", &["/4"], 0).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(3, &dir.path().join("records.jsonl"));

    let seed = seed(&server, "/0");
    let pipeline: Arc<dyn ContentPipeline> = Arc::new(IdentityPipeline);
    let sink: Arc<dyn RecordSink> = Arc::new(JsonlSink::open(&config.output.records_path).unwrap());
    let mut coordinator = Coordinator::new(&config, seed, pipeline, sink).unwrap();

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.levels.len(), 3);
    assert_eq!(read_records(&config.output.records_path).len(), 3);

    // /3 is left pending when the depth runs out
    let pending: Vec<String> = coordinator
        .frontier()
        .pending()
        .iter()
        .map(|a| a.to_string())
        .collect();
    assert_eq!(pending, vec![format!("{}/3", server.uri())]);
}

#[tokio::test]
async fn test_pipeline_failure_still_discovers_links() {
    let server = MockServer::start().await;

    mount_page(&server, "/a", &["/b"], 1).await;
    mount_page(&server, "/b", &[], 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(2, &dir.path().join("records.jsonl"));

    let summary = run_with(&config, seed(&server, "/a"), Arc::new(FailingPipeline)).await;

    assert!(read_records(&config.output.records_path).is_empty());
    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.records_written, 0);
    assert_eq!(summary.failures_by_kind["pipeline_error"], 2);
}

#[tokio::test]
async fn test_unreachable_seed_completes_without_records() {
    // Nothing listens on port 1
    let seed = Address::parse("http://127.0.0.1:1/a").unwrap();

    let dir = TempDir::new().unwrap();
    let config = create_test_config(2, &dir.path().join("records.jsonl"));

    let summary = run_with(&config, seed, Arc::new(IdentityPipeline)).await;

    assert_eq!(summary.levels.len(), 1);
    assert_eq!(summary.failures_by_kind["transport_error"], 1);
    assert!(read_records(&config.output.records_path).is_empty());
}

#[tokio::test]
async fn test_crawl_markdown_mode_appends_to_existing_file() {
    let server = MockServer::start().await;

    mount_page(&server, "/a", &["/b"], 2).await;
    mount_page(&server, "/b", &[], 2).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(2, &dir.path().join("out/records.jsonl"));

    crawl(config.clone(), seed(&server, "/a")).await.unwrap();
    crawl(config.clone(), seed(&server, "/a")).await.unwrap();

    // Two runs, two records each, nothing truncated
    let records = read_records(&config.output.records_path);
    assert_eq!(records.len(), 4);

    let content = records[0]["content"].as_str().unwrap();
    assert!(content.contains("Page"));
    assert!(!content.contains("<p>"));
}

#[tokio::test]
async fn test_crawl_rewrite_mode_uses_chat_api() {
    let server = MockServer::start().await;

    mount_page(&server, "/a", &[], 1).await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer integration-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "Rewritten page" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let prompt_path = dir.path().join("system-prompt.md");
    std::fs::write(&prompt_path, "Rewrite the page.").unwrap();
    std::env::set_var("SUMI_SCRIBE_INTEGRATION_KEY", "integration-key");

    let mut config = create_test_config(1, &dir.path().join("records.jsonl"));
    config.pipeline.mode = PipelineMode::Rewrite;
    config.pipeline.base_url = format!("{}/v1", server.uri());
    config.pipeline.api_key_env = "SUMI_SCRIBE_INTEGRATION_KEY".to_string();
    config.pipeline.system_prompt_path = prompt_path;

    let summary = crawl(config.clone(), seed(&server, "/a")).await.unwrap();

    assert_eq!(summary.records_written, 1);
    let records = read_records(&config.output.records_path);
    assert_eq!(records[0]["content"], "Rewritten page");
}

#[tokio::test]
async fn test_crawl_rewrite_mode_without_credential_fails_before_fetching() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", &[], 0).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(1, &dir.path().join("records.jsonl"));
    config.pipeline.mode = PipelineMode::Rewrite;
    config.pipeline.api_key_env = "SUMI_SCRIBE_INTEGRATION_MISSING_KEY".to_string();

    let result = crawl(config, seed(&server, "/a")).await;

    assert!(matches!(
        result,
        Err(sumi_scribe::ScribeError::Config(
            sumi_scribe::ConfigError::MissingCredential(_)
        ))
    ));
}
