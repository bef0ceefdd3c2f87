//! Seed Collector main entry point
//!
//! This is the command-line interface for collecting product detail URLs
//! from e-commerce category pages.

use anyhow::Context;
use clap::{Parser, Subcommand};
use seed_collector::config::{resolve_config, CollectConfig, CollectOverrides};
use seed_collector::crawler::crawl;
use seed_collector::output::print_summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Seed Collector: product URL discovery for e-commerce category pages
///
/// Walks category listing pages, follows their pagination, and writes a
/// deduplicated stream of canonical product detail URLs while respecting
/// robots.txt and per-host rate limits.
#[derive(Parser, Debug)]
#[command(name = "seed-collector")]
#[command(version)]
#[command(about = "Collects product detail URLs from category pages", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl category pages and write detail URLs, failures and a manifest
    Collect {
        /// Path to a TOML configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: CollectOverrides,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Collect { config, overrides } => {
            let config = resolve_config(config.as_deref(), overrides).context("Invalid configuration")?;
            handle_collect(config).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seed_collector=info,warn"),
            1 => EnvFilter::new("seed_collector=debug,info"),
            2 => EnvFilter::new("seed_collector=trace,debug"),
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

/// Handles the `collect` subcommand
async fn handle_collect(config: CollectConfig) -> anyhow::Result<()> {
    tracing::info!(
        "Collecting from {} category URL(s) into {}",
        config.category_urls.len(),
        config.out_dir.display()
    );

    let out_dir = config.out_dir.display().to_string();
    let manifest = crawl(config)
        .await
        .with_context(|| format!("Collection into {} failed", out_dir))?;
    print_summary(&manifest);

    Ok(())
}
