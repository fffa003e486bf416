use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pathcrawl::config::{Config, LoggingConfig};
use pathcrawl::crawler::url::load_seeds;
use pathcrawl::crawler::Crawler;
use pathcrawl::frontier::Strategy;
use pathcrawl::storage::CsvWriter;
use pathcrawl::utils::format_bytes;

#[derive(Parser)]
#[command(
    name = "pathcrawl",
    version,
    about = "Polite web crawler with physics-inspired frontier strategies",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file (defaults to PATHCRAWL_* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl from a seed list and write a CSV of page metadata
    Crawl {
        /// Seed file, one URL per line
        #[arg(long)]
        seeds: Option<PathBuf>,

        /// Frontier strategy (diffusion, flight, persistence, field, aggregation, quantum)
        #[arg(short, long)]
        strategy: Option<Strategy>,

        /// Maximum number of pages to fetch
        #[arg(short, long)]
        max_pages: Option<usize>,

        /// Output CSV path
        #[arg(long)]
        csv_out: Option<PathBuf>,

        /// Number of concurrent crawl workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Seed for the frontier RNG
        #[arg(long)]
        rng_seed: Option<u64>,

        /// Minimum seconds between requests to the same host
        #[arg(long)]
        throttle: Option<f64>,

        /// Bytes a host may serve before further fetches are refused
        #[arg(long)]
        byte_quota: Option<u64>,

        /// Print the crawl summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the available frontier strategies
    Strategies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }

    // Initialize tracing/logging
    setup_tracing(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Crawl {
            seeds,
            strategy,
            max_pages,
            csv_out,
            workers,
            rng_seed,
            throttle,
            byte_quota,
            json,
        } => {
            if let Some(seeds) = seeds {
                config.output.seeds_path = seeds;
            }
            if let Some(strategy) = strategy {
                config.crawler.strategy = strategy;
            }
            if let Some(max_pages) = max_pages {
                config.crawler.max_pages = max_pages;
            }
            if let Some(csv_out) = csv_out {
                config.output.csv_path = csv_out;
            }
            if let Some(workers) = workers {
                config.crawler.workers = workers;
            }
            if rng_seed.is_some() {
                config.crawler.rng_seed = rng_seed;
            }
            if let Some(throttle) = throttle {
                config.politeness.throttle_interval_secs = throttle;
            }
            if let Some(byte_quota) = byte_quota {
                config.politeness.per_host_byte_quota = byte_quota;
            }

            tracing::info!(
                strategy = %config.crawler.strategy,
                max_pages = config.crawler.max_pages,
                seeds = %config.output.seeds_path.display(),
                "Starting crawl command"
            );
            crawl(config, json).await?;
        }

        Commands::Strategies => {
            for strategy in Strategy::ALL {
                let name = match strategy.alias() {
                    Some(alias) => format!("{strategy} ({alias})"),
                    None => strategy.to_string(),
                };
                println!("  {name:<26} {}", strategy.description());
            }
        }
    }

    Ok(())
}

fn setup_tracing(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            tracing_subscriber::EnvFilter::new("pathcrawl=debug,info")
        } else {
            tracing_subscriber::EnvFilter::new(format!("pathcrawl={},warn", logging.level))
        }
    });

    match logging.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}

async fn crawl(config: Config, json: bool) -> Result<()> {
    let seeds_path = config.output.seeds_path.clone();
    let csv_path = config.output.csv_path.clone();

    let text = std::fs::read_to_string(&seeds_path)
        .with_context(|| format!("Failed to read seed file: {}", seeds_path.display()))?;
    let seeds = load_seeds(&text)
        .with_context(|| format!("No usable seeds in {}", seeds_path.display()))?;

    let crawler = Crawler::new(config).context("Failed to create crawler")?;

    let shutdown = crawler.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight fetches");
            shutdown.shutdown();
        }
    });

    let mut writer = CsvWriter::create(&csv_path)?;
    let report = crawler.run(seeds, &mut writer).await?;
    let stats = &report.stats;

    if json {
        let summary = serde_json::json!({
            "csv_path": csv_path.display().to_string(),
            "stats": stats,
            "error_rate": stats.error_rate(),
            "frontier_remaining": report.frontier_remaining,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("CSV saved to {}", csv_path.display());
    println!("  Pages fetched:   {}", stats.pages_fetched);
    println!("  Records written: {}", stats.records_written);
    println!(
        "  Dropped:         {} (robots {}, quota {}, errors {})",
        stats.total_dropped(),
        stats.robots_denied,
        stats.quota_denied,
        stats.fetch_errors
    );
    println!("  Bytes fetched:   {}", format_bytes(stats.bytes_fetched));
    println!("  Still pending:   {}", report.frontier_remaining);
    println!("  Duration:        {:.1}s", stats.duration.as_secs_f64());

    Ok(())
}
