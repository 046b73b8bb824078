//! JobHarvest main entry point
//!
//! This is the command-line interface for the JobHarvest job-board harvester.

use clap::Parser;
use jobharvest::config::{load_config_with_hash, Config};
use jobharvest::crawler::{run_sources, user_agent_string};
use jobharvest::sites::SourceId;
use jobharvest::storage::open_storage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// JobHarvest: a polite job-board harvester
///
/// JobHarvest crawls job boards, extracts structured posting fields,
/// normalizes salaries and skill levels, and stores each posting once.
#[derive(Parser, Debug)]
#[command(name = "jobharvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite job-board harvester", long_about = None)]
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

    /// Only crawl these sources (repeatable), e.g. --source pracuj
    #[arg(long = "source", value_name = "SOURCE")]
    sources: Vec<SourceId>,

    /// Override the per-source detail request budget
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    budget: Option<u32>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "migrate_salaries"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "migrate_salaries"])]
    stats: bool,

    /// Convert EUR salaries to PLN and re-standardize stored salaries
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    migrate_salaries: bool,

    /// Write migration changes instead of only listing them
    #[arg(long, requires = "migrate_salaries")]
    apply: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
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

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &cli.sources, cli.budget)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.migrate_salaries {
        handle_migrate_salaries(&config, cli.apply)?;
    } else {
        handle_crawl(&config, &config_hash, &cli.sources, cli.budget).await?;
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
            0 => EnvFilter::new("jobharvest=info,warn"),
            1 => EnvFilter::new("jobharvest=debug,info"),
            2 => EnvFilter::new("jobharvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(
    config: &Config,
    selected: &[SourceId],
    budget: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== JobHarvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Request budget per source: {}",
        budget.unwrap_or(config.crawler.request_budget)
    );
    println!(
        "  Pacing: {}-{}ms",
        config.crawler.pacing_min_ms, config.crawler.pacing_max_ms
    );
    println!("  Staleness: {} days", config.crawler.staleness_days);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nUser Agent:");
    println!("  {}", user_agent_string(&config.user_agent));

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    match &config.summarizer {
        Some(summarizer) => println!(
            "\nSummarizer: {} via {} (key from ${})",
            summarizer.model, summarizer.endpoint, summarizer.api_key_env
        ),
        None => println!("\nSummarizer: disabled"),
    }

    let sources: Vec<_> = config
        .resolved_sources()?
        .into_iter()
        .filter(|s| selected.is_empty() || selected.contains(&s.id))
        .collect();

    println!("\nSources ({}):", sources.len());
    for source in &sources {
        println!(
            "  - {} ({:?} fetcher, {} seeds)",
            source.id.display_name(),
            source.fetcher,
            source.seeds.len()
        );
        for seed in &source.seeds {
            println!("    * {}", seed);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start harvesting with {} seed URLs",
        sources.iter().map(|s| s.seeds.len()).sum::<usize>()
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use jobharvest::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --migrate-salaries mode
fn handle_migrate_salaries(config: &Config, apply: bool) -> Result<(), Box<dyn std::error::Error>> {
    use jobharvest::output::{migrate_salaries, print_migration_report};

    println!("=== Salary Migration ===\n");
    println!("Database: {}\n", config.output.database_path);

    let mut storage = open_storage(Path::new(&config.output.database_path))?;
    let report = migrate_salaries(&mut storage, apply)?;
    print_migration_report(&report);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    selected: &[SourceId],
    budget: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(Path::new(&config.output.database_path))?;
    let storage = Arc::new(Mutex::new(storage));

    // Stop between candidates on Ctrl-C; postings already stored are kept
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing current posting");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    let reports = run_sources(config, config_hash, storage, selected, budget, shutdown).await?;

    let mut failures = 0;
    println!("\n=== Harvest Summary ===");
    for (source, outcome) in &reports {
        match outcome {
            Ok(outcome) if outcome.is_aborted() => {
                failures += 1;
                println!(
                    "  {}: aborted ({})",
                    source.display_name(),
                    outcome.abort_reason.as_deref().unwrap_or("unknown reason")
                );
            }
            Ok(outcome) => println!(
                "  {}: {} created ({} fetched, {} known, {} over budget, {} failed){}",
                source.display_name(),
                outcome.created,
                outcome.detail_fetches,
                outcome.skipped_known,
                outcome.skipped_budget,
                outcome.failed,
                if outcome.interrupted { ", interrupted" } else { "" }
            ),
            Err(e) => {
                failures += 1;
                println!("  {}: failed ({})", source.display_name(), e);
            }
        }
    }

    let created: u64 = reports
        .iter()
        .filter_map(|(_, outcome)| outcome.as_ref().ok())
        .map(|outcome| outcome.created)
        .sum();
    tracing::info!(
        "Harvest finished: {} postings created, {} source(s) failed",
        created,
        failures
    );

    Ok(())
}
