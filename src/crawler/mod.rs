//! Crawler module for harvesting job boards
//!
//! This module contains the core crawling logic, including:
//! - Page fetching over HTTP or a headless browser
//! - Listing-page parsing into posting candidates
//! - Pre-fetch duplicate filtering
//! - Request budgeting and pacing
//! - Per-source run orchestration

mod dedup;
mod fetcher;
mod governor;
mod orchestrator;
mod parser;

pub use dedup::{DedupIndex, DedupVerdict};
#[cfg(feature = "browser")]
pub use fetcher::BrowserFetcher;
pub use fetcher::{
    build_fetcher, build_http_client, user_agent_string, FetchError, FetchResult, Fetcher,
    HttpFetcher,
};
pub use governor::RequestBudgetGovernor;
pub use orchestrator::{Orchestrator, RunOutcome, RunSettings};
pub use parser::{extract_candidates, merge_candidates, Candidate};

use crate::config::Config;
use crate::sites::{adapter_for, SourceId};
use crate::storage::Storage;
use crate::summarizer::build_summarizer;
use crate::Result;
use futures::future::join_all;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Runs every selected source concurrently
///
/// This is the main entry point for a harvest. It will:
/// 1. Mark runs left in `running` by a killed process as interrupted
/// 2. Build one orchestrator per enabled source (filtered by `selected`
///    when it is non-empty)
/// 3. Run them side by side, each with its own budget and pacing
///
/// A source that fails to set up or to run is reported in its slot without
/// affecting the others.
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `config_hash` - Hash of the configuration file, stored with each run
/// * `storage` - Store shared by all sources
/// * `selected` - Sources to run; all enabled sources when empty
/// * `budget_override` - Replaces the configured per-source request budget
/// * `shutdown` - Set to stop every source between candidates
///
/// # Example
///
/// ```no_run
/// use jobharvest::config::load_config_with_hash;
/// use jobharvest::crawler::run_sources;
/// use jobharvest::storage::open_storage;
/// use std::path::Path;
/// use std::sync::atomic::AtomicBool;
/// use std::sync::{Arc, Mutex};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let storage = open_storage(Path::new(&config.output.database_path))?;
/// let storage = Arc::new(Mutex::new(storage));
///
/// let reports = run_sources(&config, &hash, storage, &[], None, Arc::new(AtomicBool::new(false))).await?;
/// for (source, outcome) in reports {
///     println!("{}: {:?}", source, outcome.map(|o| o.created));
/// }
/// # Ok(())
/// # }
/// ```
pub async fn run_sources<S: Storage>(
    config: &Config,
    config_hash: &str,
    storage: Arc<Mutex<S>>,
    selected: &[SourceId],
    budget_override: Option<u32>,
    shutdown: Arc<AtomicBool>,
) -> Result<Vec<(SourceId, Result<RunOutcome>)>> {
    {
        let mut storage = storage.lock().unwrap();
        let interrupted = storage.mark_interrupted_runs()?;
        if interrupted > 0 {
            tracing::warn!("Marked {} unfinished run(s) as interrupted", interrupted);
        }
    }

    let sources: Vec<_> = config
        .resolved_sources()?
        .into_iter()
        .filter(|source| selected.is_empty() || selected.contains(&source.id))
        .collect();

    if sources.is_empty() {
        tracing::warn!("No sources selected");
        return Ok(Vec::new());
    }

    let timeout = Duration::from_secs(config.crawler.request_timeout_secs);
    let summarizer = build_summarizer(config.summarizer.as_ref(), timeout);

    let runs = sources.into_iter().map(|source| {
        let storage = Arc::clone(&storage);
        let summarizer = Arc::clone(&summarizer);
        let shutdown = Arc::clone(&shutdown);

        async move {
            let id = source.id;
            let result = async move {
                let settings =
                    RunSettings::from_config(&config.crawler, &source, config_hash, budget_override)?;
                let fetcher = build_fetcher(source.fetcher, &config.user_agent, timeout)?;

                tracing::info!(
                    source = %id,
                    fetcher = ?source.fetcher,
                    "Prepared source with {} seed(s)",
                    settings.seeds.len()
                );

                let mut orchestrator = Orchestrator::new(adapter_for(id), fetcher, storage, settings)
                    .with_summarizer(summarizer)
                    .with_shutdown(shutdown);
                orchestrator.run().await
            }
            .await;

            if let Err(e) = &result {
                tracing::error!(source = %id, "Source failed: {}", e);
            }
            (id, result)
        }
    });

    Ok(join_all(runs).await)
}
