//! Doc-Harvest main entry point
//!
//! This is the command-line interface for the Doc-Harvest documentation
//! harvester.

use anyhow::Context;
use clap::Parser;
use doc_harvest::config::{load_config_with_hash, Config};
use doc_harvest::crawler::crawl;
use doc_harvest::ledger::{JsonlLedger, LedgerPaths};
use doc_harvest::output::{load_statistics, print_statistics, print_summary};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Doc-Harvest: a resumable documentation-site harvester
///
/// Doc-Harvest crawls one documentation site below its base URL while
/// respecting robots.txt, extracts and cleans the text of every page and
/// appends it to a JSON-lines ledger. Interrupted runs resume where they
/// stopped.
#[derive(Parser, Debug)]
#[command(name = "doc-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable documentation-site harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Revisit every page and retry unreachable URLs; existing records are kept
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the ledger and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    setup_logging(cli.verbose, cli.quiet, config.output.log_path.as_deref())?;
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber
///
/// Logs go to stderr and, when configured, to a log file without colors.
fn setup_logging(verbose: u8, quiet: bool, log_path: Option<&str>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("doc_harvest=info,warn"),
            1 => EnvFilter::new("doc_harvest=debug,info"),
            2 => EnvFilter::new("doc_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = match log_path {
        Some(path) => {
            let path = Path::new(path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Doc-Harvest Dry Run ===\n");

    println!("Project:");
    println!("  Name: {}", config.project.name);
    println!("  Base URL: {}", config.project.base_url);

    println!("\nCrawler Configuration:");
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  Retry delay: {}ms", config.crawler.retry_delay_ms);
    println!("  Min content length: {}", config.crawler.min_content_length);
    println!("  Workers: {}", config.crawler.workers);
    println!("  Retry unreachable: {}", config.crawler.retry_unreachable);

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Robots agent: {}", config.http.robots_agent);

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);
    println!("  Unreachable: {}", config.output.unreachable_path);
    println!("  External links: {}", config.output.external_links_path);
    println!(
        "  Unextractable: {}",
        config.output.resolved_unextractable_path().display()
    );
    if let Some(log_path) = &config.output.log_path {
        println!("  Log: {}", log_path);
    }

    println!("\nLinks:");
    println!("  Ignored extensions: {}", config.links.ignored_extensions.join(" "));
    println!("  External hosts: {}", config.links.external_hosts.join(" "));
    println!("  External extensions: {}", config.links.external_extensions.join(" "));

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the ledger
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Records: {}\n", config.output.records_path);

    let ledger = JsonlLedger::open(LedgerPaths::from(&config.output))
        .context("Failed to open ledger")?;
    let stats = load_statistics(&ledger).context("Failed to read ledger")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Harvesting {} into {}",
        config.project.base_url,
        config.output.records_path
    );

    match crawl(config, fresh).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl finished: {} new records ({} total), {} unreachable, {} external links",
                summary.new_records,
                summary.total_records,
                summary.unreachable,
                summary.external_links
            );
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
