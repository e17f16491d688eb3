//! Kata-Harvest main entry point
//!
//! This is the command-line interface for the Kata-Harvest challenge harvester.

use clap::Parser;
use kata_harvest::config::{load_config_with_hash, Config, FieldMode, TabTarget};
use kata_harvest::crawler::run_crawl;
use kata_harvest::output::{
    generate_markdown_summary, generate_summary, load_statistics, print_statistics,
    DatasetExporter, ExerciseExporter, RecordExporter,
};
use kata_harvest::storage::{SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Kata-Harvest: a challenge catalog harvester
///
/// Kata-Harvest expands a coding-challenge listing, visits every challenge
/// page and stores its title, difficulty, tags, instructions, starter code
/// and tests.
#[derive(Parser, Debug)]
#[command(name = "kata-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A challenge catalog harvester", long_about = None)]
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

    /// Resume an interrupted harvest (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh harvest, discarding the queue and records
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be harvested without crawling
    #[arg(long, group = "mode")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, group = "mode")]
    stats: bool,

    /// Generate markdown summary from existing data and exit
    #[arg(long, group = "mode")]
    export_summary: bool,

    /// Write every record as JSON into the configured dataset directory and exit
    #[arg(long, group = "mode")]
    export_dataset: bool,

    /// Write records as exercise folders under DIR and exit
    #[arg(long, value_name = "DIR", group = "mode")]
    export_exercises: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else if cli.export_dataset {
        handle_export_dataset(&config)?;
    } else if let Some(dir) = &cli.export_exercises {
        handle_export_exercises(&config, dir)?;
    } else {
        handle_crawl(config, &config_hash, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kata_harvest=info,warn"),
            1 => EnvFilter::new("kata_harvest=debug,info"),
            2 => EnvFilter::new("kata_harvest=trace,debug"),
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

fn describe_tab(tab: &TabTarget) -> String {
    match (&tab.label, tab.index) {
        (Some(label), _) => format!("{} labelled '{}'", tab.selector, label),
        (None, Some(index)) => format!("{} #{}", tab.selector, index),
        (None, None) => format!("{} #0", tab.selector),
    }
}

fn describe_mode(mode: FieldMode) -> &'static str {
    match mode {
        FieldMode::Lines => "lines",
        FieldMode::Text => "text",
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Kata-Harvest Dry Run ===\n");

    let crawler = &config.crawler;
    println!("Crawler Configuration:");
    println!("  Max requests per crawl: {}", crawler.max_requests_per_crawl);
    println!("  Max concurrency: {}", crawler.max_concurrency);
    println!("  Max request retries: {}", crawler.max_request_retries);
    println!("  Load-more timeout: {}ms", crawler.load_more_timeout_ms);
    match crawler.content_timeout() {
        Some(timeout) => println!("  Content timeout: {}ms", timeout.as_millis()),
        None => println!("  Content timeout: unbounded"),
    }
    println!("  Max load-more clicks: {}", crawler.max_load_more_clicks);
    println!("  Handler timeout: {}s", crawler.handler_timeout_secs);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);
    println!("  Dataset: {}", config.output.dataset_dir);

    println!("\nSite:");
    println!("  Seed: {}", config.site.seed_url);
    println!("  Challenge pattern: {}", config.site.challenge_url_pattern);

    let listing = &config.listing;
    println!("\nListing Selectors:");
    println!("  Load more: {}", listing.load_more);
    println!("  Entry: {}", listing.entry);
    println!("  Entry link: {}", listing.entry_link);
    println!("  Entry difficulty: {}", listing.entry_difficulty);

    let detail = &config.detail;
    println!("\nDetail Selectors:");
    println!("  Title: {}", detail.title);
    println!("  Tags: {}", detail.tags);
    println!("  Instructions: {}", detail.instructions);
    println!("  Code tab: {}", describe_tab(&detail.code_tab));
    println!("  Code: {} ({})", detail.code.selector, describe_mode(detail.code.mode));
    println!("  Tests tab: {}", describe_tab(&detail.tests_tab));
    println!("  Tests: {} ({})", detail.tests.selector, describe_mode(detail.tests.mode));
    println!("  Author: {}", detail.author.as_deref().unwrap_or("(not collected)"));

    println!("\n✓ Configuration is valid");
    println!("✓ Would start harvesting from {}", config.site.seed_url);
}

fn open_database(config: &Config) -> Result<SqliteStorage, Box<dyn std::error::Error>> {
    Ok(SqliteStorage::new(Path::new(&config.output.database_path))?)
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_database(config)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Exporting Harvest Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let storage = open_database(config)?;

    tracing::info!("Loading harvest data from database...");
    let summary = generate_summary(&storage)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles the --export-dataset mode: one JSON file per record
fn handle_export_dataset(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_database(config)?;
    let records = storage.get_records()?;

    let exporter = DatasetExporter::new(&config.output.dataset_dir);
    let summary = exporter.export(&records)?;

    println!(
        "✓ Exported {} records to: {}",
        summary.written, config.output.dataset_dir
    );

    Ok(())
}

/// Handles the --export-exercises mode: exercise folders by difficulty
fn handle_export_exercises(config: &Config, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_database(config)?;
    let records = storage.get_records()?;

    let exporter = ExerciseExporter::new(dir);
    let summary = exporter.export(&records)?;

    println!("=== Exercise Export ===\n");
    println!("Output: {}", dir.display());
    println!("  Written: {}", summary.written);
    println!("  Skipped (no code or tests): {}", summary.skipped);

    println!("\n{} code problems", summary.code_problems.len());
    for problem in &summary.code_problems {
        println!("  {}", problem);
    }

    Ok(())
}

/// Handles the main harvest operation
async fn handle_crawl(
    config: Config,
    config_hash: &str,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if fresh {
        tracing::info!("Starting fresh harvest (discarding previous queue and records)");
    } else {
        tracing::info!("Starting harvest (will resume if an interrupted run exists)");
    }
    tracing::info!("Seed: {}", config.site.seed_url);

    match run_crawl(config, config_hash, fresh).await {
        Ok(report) => {
            tracing::info!(
                "Harvest completed successfully: {} records from {} requests",
                report.records,
                report.dispatched
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
