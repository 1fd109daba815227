//! Sumi-Scribe main entry point
//!
//! This is the command-line interface for the Sumi-Scribe content crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_scribe::config::{load_config_with_hash, validate, validate_seed, Config, PipelineMode};
use sumi_scribe::crawler::crawl;
use sumi_scribe::output::print_summary;
use sumi_scribe::url::Address;
use tracing_subscriber::EnvFilter;

/// Sumi-Scribe: a depth-bounded content crawler
///
/// Sumi-Scribe crawls breadth-first from a seed address, converts each HTML
/// page to markdown (optionally rewritten by a chat model) and appends one
/// JSON record per page to a JSON Lines file.
#[derive(Parser, Debug)]
#[command(name = "sumi-scribe")]
#[command(version)]
#[command(about = "A depth-bounded content crawler", long_about = None)]
struct Cli {
    /// Seed address (overrides `seed` in the config file)
    #[arg(value_name = "SEED")]
    seed: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the records file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Override the maximum crawl depth
    #[arg(short = 'd', long, value_name = "N")]
    max_depth: Option<u32>,

    /// Override the number of pages processed concurrently
    #[arg(short = 'j', long, value_name = "N")]
    concurrency: Option<u32>,

    /// Store plain markdown and skip the model rewrite
    #[arg(long)]
    markdown_only: bool,

    /// Validate configuration and seed, then exit without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // The credential may live in a .env file
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let config = load_configuration(&cli)?;

    let raw_seed = cli
        .seed
        .as_deref()
        .or(config.seed.as_deref())
        .context("No seed address given on the command line or in the config file")?;
    let seed = validate_seed(raw_seed)?;

    if cli.dry_run {
        handle_dry_run(&config, &seed);
        return Ok(());
    }

    handle_crawl(config, seed).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_scribe=info,warn"),
            1 => EnvFilter::new("sumi_scribe=debug,info"),
            2 => EnvFilter::new("sumi_scribe=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (or defaults), then applies CLI overrides
fn load_configuration(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(output) = &cli.output {
        config.output.records_path = output.clone();
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.max_concurrent_pages_open = concurrency;
    }
    if cli.markdown_only {
        config.pipeline.mode = PipelineMode::Markdown;
    }

    // Overrides can break limits the file satisfied
    validate(&config)?;

    Ok(config)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, seed: &Address) {
    println!("=== Sumi-Scribe Dry Run ===\n");

    println!("Seed: {}", seed);

    println!("\nCrawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!(
        "  Max concurrent pages: {}",
        config.crawler.max_concurrent_pages_open
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!(
        "  Connect timeout: {}s",
        config.crawler.effective_connect_timeout()
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path.display());

    println!("\nPipeline:");
    match config.pipeline.mode {
        PipelineMode::Markdown => println!("  Mode: markdown"),
        PipelineMode::Rewrite => {
            println!("  Mode: rewrite");
            println!("  Model: {}", config.pipeline.model);
            println!("  Endpoint: {}", config.pipeline.base_url);
            println!(
                "  System prompt: {}",
                config.pipeline.system_prompt_path.display()
            );
            println!("  API key variable: {}", config.pipeline.api_key_env);
        }
    }
    println!("  Timeout: {}s", config.pipeline.timeout);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, seed: Address) -> anyhow::Result<()> {
    match crawl(config, seed).await {
        Ok(summary) => {
            tracing::info!("Crawl completed successfully");
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
