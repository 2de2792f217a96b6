//! Scope-Crawl main entry point
//!
//! This is the command-line interface for the Scope-Crawl web crawler.

use anyhow::Context;
use clap::Parser;
use scope_crawl::config::{load_config, validate, Config};
use scope_crawl::crawler::{shutdown_signal, Coordinator, CrawlOutcome};
use scope_crawl::output::{load_statistics, log_statistics, print_statistics, CrawlStatistics};
use scope_crawl::storage::bootstrap;
use scope_crawl::url::ScopePolicy;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Scope-Crawl: a resumable, scope-limited web crawler
///
/// Fetches the initial URL, records every link on the page, and recursively
/// fetches the links that start with the initial URL. Press Ctrl+C to save
/// progress to the working file; run again with --resume to continue.
#[derive(Parser, Debug)]
#[command(name = "scope-crawl")]
#[command(version)]
#[command(about = "A resumable, scope-limited web crawler", long_about = None)]
struct Cli {
    /// Initial URL to fetch
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// Resume last execution from the working file
    #[arg(short, long)]
    resume: bool,

    /// Output filename
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Working (checkpoint) filename
    #[arg(long, value_name = "FILE")]
    checkpoint: Option<String>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Maximum concurrent fetches
    #[arg(long, value_name = "N")]
    max_concurrent: Option<u32>,

    /// How links are matched against the initial URL
    #[arg(long, value_enum)]
    scope_policy: Option<ScopePolicy>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show statistics from the output file (or working file) and exit
    #[arg(long, conflicts_with_all = ["url", "resume"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = build_config(&cli)?;

    tracing::debug!("Resume: {}", cli.resume);
    tracing::debug!("InitialURL: {}", cli.url.as_deref().unwrap_or(""));
    tracing::debug!("OutputFile: {}", config.output.output_path);

    if cli.stats {
        handle_stats(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    handle_crawl(&config, cli.url.as_deref(), cli.resume).await?;
    Ok(ExitCode::SUCCESS)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scope_crawl=info,warn"),
            1 => EnvFilter::new("scope_crawl=debug,info"),
            _ => EnvFilter::new("scope_crawl=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the config file (if any), applies flag overrides and validates
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(output) = &cli.output {
        config.output.output_path = output.clone();
    }
    if let Some(checkpoint) = &cli.checkpoint {
        config.output.checkpoint_path = checkpoint.clone();
    }
    if let Some(max) = cli.max_concurrent {
        config.crawler.max_concurrent_fetches = max;
    }
    if let Some(policy) = cli.scope_policy {
        config.crawler.scope_policy = policy;
    }

    validate(&config)?;
    Ok(config)
}

/// Handles the --stats mode: shows statistics from a previous run's file
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    for path in [&config.output.output_path, &config.output.checkpoint_path] {
        if let Some(stats) = load_statistics(Path::new(path))? {
            println!("File: {}\n", path);
            print_statistics(&stats);
            return Ok(());
        }
    }

    anyhow::bail!(
        "Neither {} nor {} exists",
        config.output.output_path,
        config.output.checkpoint_path
    )
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, seed: Option<&str>, resume: bool) -> anyhow::Result<()> {
    let start = bootstrap(Path::new(&config.output.checkpoint_path), seed, resume)?;

    let coordinator = Coordinator::new(config, start)?;
    let registry = coordinator.registry();
    tracing::info!(
        "Crawling {} (scope policy: {}, up to {} concurrent fetches)",
        coordinator.seed(),
        config.crawler.scope_policy,
        config.crawler.max_concurrent_fetches
    );

    let outcome = coordinator.run(shutdown_signal()).await;
    log_statistics(&CrawlStatistics::from_records(&registry.snapshot()));

    match outcome? {
        CrawlOutcome::Completed { records } => {
            tracing::info!("All done! {} saved with {} urls", config.output.output_path, records);
        }
        CrawlOutcome::Interrupted { records, pending } => {
            tracing::info!(
                "Interrupted; {} urls saved to {} ({} pending). Run again with --resume to continue",
                records,
                config.output.checkpoint_path,
                pending
            );
        }
    }

    Ok(())
}
