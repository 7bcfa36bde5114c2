//! Listing-Harvester main entry point
//!
//! This is the command-line interface for the Listing-Harvester product crawler.

use clap::Parser;
use listing_harvester::config::{parse_config_with_hash, validate, Config};
use listing_harvester::crawler::run_crawl;
use listing_harvester::output::print_summary;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Listing-Harvester: A polite product listing crawler
///
/// Listing-Harvester walks a paginated product listing, visits every product
/// page it links to and writes one CSV row per product, while spacing out
/// requests per site and retrying transient failures with backoff.
#[derive(Parser, Debug)]
#[command(name = "listing-harvester")]
#[command(version)]
#[command(about = "A polite product listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// First listing page (overrides crawl.seed-url)
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Maximum number of listing pages to visit
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Maximum number of products to collect
    #[arg(long, value_name = "N")]
    max_products: Option<usize>,

    /// Number of concurrent workers
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// CSV file receiving the product records
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

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

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(seed) = &self.seed {
            config.crawl.seed_url = seed.clone();
        }
        if let Some(max_pages) = self.max_pages {
            config.crawl.max_pages = max_pages;
        }
        if let Some(max_products) = self.max_products {
            config.crawl.max_products = max_products;
        }
        if let Some(workers) = self.workers {
            config.crawl.workers = workers;
        }
        if let Some(output) = &self.output {
            config.output.csv_path = output.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match parse_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);

    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_crawl(&config, cli.quiet).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvester=info,warn"),
            1 => EnvFilter::new("listing_harvester=debug,info"),
            2 => EnvFilter::new("listing_harvester=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Listing-Harvester Dry Run ===\n");

    println!("Crawl:");
    println!("  Seed URL: {}", config.crawl.seed_url);
    println!("  Page parameter: {}", config.crawl.page_param);
    println!("  Max pages: {}", config.crawl.max_pages);
    println!("  Max products: {}", config.crawl.max_products);
    println!("  Workers: {}", config.crawl.workers);

    println!("\nFetch:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Timeout: {}ms", config.fetch.timeout_ms);
    println!("  Connect timeout: {}ms", config.fetch.connect_timeout_ms);

    println!("\nPoliteness:");
    println!(
        "  Min interval per origin: {}ms",
        config.rate_limit.min_interval_ms
    );
    println!(
        "  Retries: {} (base {}ms, jitter up to {}ms, capped at {}ms)",
        config.retry.max_retries,
        config.retry.base_delay_ms,
        config.retry.max_jitter_ms,
        config.retry.max_backoff_ms
    );

    println!("\nExtraction:");
    println!("  Product links: {}", config.extract.detail_link_selector);
    if config.extract.next_page_selector.trim().is_empty() {
        println!("  Next page: while pages yield products");
    } else {
        println!("  Next page: {}", config.extract.next_page_selector);
    }
    println!("  Title: {}", config.extract.title_selector);
    println!("  Description meta: {}", config.extract.description_meta);
    println!(
        "  Table labels: {}, {}",
        config.extract.asin_label, config.extract.manufacturer_label
    );

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();

    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing in-flight requests");
            on_interrupt.cancel();
        }
    });

    match run_crawl(config, cancel).await {
        Ok(summary) => {
            tracing::info!("Products written to {}", config.output.csv_path);
            if !quiet {
                print_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
