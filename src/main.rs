//! Sumi-Spider main entry point
//!
//! This is the command-line interface for the Sumi-Spider polite crawler.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sumi_spider::config::{dedup_seeds, load_config_with_hash, load_seed_file, Config};
use sumi_spider::crawler::{HtmlLinkExtractor, HttpTransport};
use sumi_spider::output::print_statistics;
use sumi_spider::storage::{prepare_output_dir, FsDocStore};
use sumi_spider::CrawlSession;
use tracing_subscriber::EnvFilter;

/// Sumi-Spider: A polite, host-aware web crawler
///
/// Sumi-Spider crawls the hosts of its seed URLs while respecting
/// robots.txt, per-host page quotas and a pause between requests, and
/// saves every fetched page to the docs directory.
#[derive(Parser, Debug)]
#[command(name = "sumi-spider")]
#[command(version)]
#[command(about = "A polite, host-aware web crawler", long_about = None)]
struct Cli {
    /// Seed URLs to start crawling from
    #[arg(value_name = "URL")]
    seeds: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// JSON file of seeds: {"links": ["http://...", ...]}
    #[arg(short, long, value_name = "FILE")]
    seed_file: Option<PathBuf>,

    /// Number of workers to start with
    #[arg(short, long)]
    workers: Option<usize>,

    /// Pause after every page, in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Maximum pages per host (0 = unlimited)
    #[arg(long)]
    quota: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };
    apply_overrides(&mut config, &cli);
    sumi_spider::config::validate(&config).context("Invalid configuration")?;

    let seeds = collect_seeds(&cli)?;
    if seeds.is_empty() {
        bail!("No seed URLs given: pass URLs as arguments or use --seed-file");
    }

    if cli.dry_run {
        handle_dry_run(&config, &seeds);
        return Ok(());
    }

    handle_crawl(config, seeds).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_spider=info,warn"),
            1 => EnvFilter::new("sumi_spider=debug,info"),
            2 => EnvFilter::new("sumi_spider=trace,debug"),
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

/// Command-line flags take precedence over the configuration file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
        config.supervisor.max_workers = config.supervisor.max_workers.max(workers);
    }
    if let Some(delay) = cli.delay_ms {
        config.crawler.crawl_delay_ms = delay;
    }
    if let Some(quota) = cli.quota {
        config.crawler.per_host_page_quota = quota;
    }
}

/// Seeds from the command line followed by the seed file, duplicates removed
fn collect_seeds(cli: &Cli) -> anyhow::Result<Vec<String>> {
    let mut seeds = cli.seeds.clone();
    if let Some(path) = &cli.seed_file {
        let from_file = load_seed_file(path)
            .with_context(|| format!("Failed to load seed file {}", path.display()))?;
        tracing::info!("Loaded {} seeds from {}", from_file.len(), path.display());
        seeds.extend(from_file);
    }
    Ok(dedup_seeds(seeds))
}

/// Handles the --dry-run mode: shows the effective configuration and seeds
fn handle_dry_run(config: &Config, seeds: &[String]) {
    println!("=== Sumi-Spider Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Crawl delay: {}ms", config.crawler.crawl_delay_ms);
    match config.crawler.quota() {
        Some(quota) => println!("  Per-host page quota: {}", quota),
        None => println!("  Per-host page quota: unlimited"),
    }
    if let Some(limit) = config.crawler.max_run_time_secs {
        println!("  Max run time: {}s", limit);
    }

    println!("\nSupervisor:");
    println!("  Sample interval: {}ms", config.supervisor.sample_interval_ms);
    println!("  Backlog threshold: {}", config.supervisor.backlog_threshold);
    println!("  Stagnation rounds: {}", config.supervisor.stagnation_rounds);
    println!("  Max workers: {}", config.supervisor.max_workers);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nHTTP:");
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Accept invalid certs: {}", config.http.accept_invalid_certs);

    println!("\nOutput:");
    println!("  Docs directory: {}", config.output.docs_dir.display());
    println!("  Clear on start: {}", config.output.clear_on_start);

    println!("\nContent Filter:");
    println!("  Denied suffixes: {}", config.filter.deny_suffixes.join(" "));
    println!("  Denied substrings: {}", config.filter.deny_substrings.join(" "));

    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, seeds: Vec<String>) -> anyhow::Result<()> {
    prepare_output_dir(&config.output.docs_dir, config.output.clear_on_start)
        .await
        .context("Failed to prepare docs directory")?;

    let transport = HttpTransport::new(&config.http).context("Failed to build HTTP client")?;
    let storage = FsDocStore::new(&config.output.docs_dir);
    let max_run_time = config.crawler.max_run_time();

    let mut session = CrawlSession::new(
        config,
        Arc::new(transport),
        Arc::new(storage),
        Arc::new(HtmlLinkExtractor::new()),
    )?;

    let queued = session.seed(&seeds).await;
    tracing::info!("Queued {} of {} seeds", queued, seeds.len());

    let report = match max_run_time {
        Some(limit) => match tokio::time::timeout(limit, session.run()).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!("Crawl exceeded max run time of {}s, stopping", limit.as_secs());
                return Ok(());
            }
        },
        None => session.run().await?,
    };

    print_statistics(&report);
    Ok(())
}
