//! Single-source crawl orchestration
//!
//! This module drives one board through a run:
//! - Fetching the seed listing pages
//! - Extracting and merging (title, link) candidates
//! - Filtering known candidates before any detail request is spent
//! - Fetching, extracting and normalizing each detail page under the budget
//! - Persisting every posting as soon as it is complete
//!
//! A failure on one candidate is logged and the run moves on to the next.

use crate::config::{CrawlerConfig, ResolvedSource};
use crate::crawler::dedup::{DedupIndex, DedupVerdict};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::governor::RequestBudgetGovernor;
use crate::crawler::parser::{extract_candidates, merge_candidates, Candidate};
use crate::normalize::{normalize_skills, standardize_salary};
use crate::sites::{extract_details, PostingDetails, SiteAdapter, SourceId};
use crate::state::CrawlPhase;
use crate::storage::{CreateOutcome, NewPosting, RunStatus, Storage};
use crate::summarizer::{summarize_or_empty, NoopSummarizer, Summarizer};
use crate::url::parse_http_url;
use crate::{HarvestError, Result};
use chrono::Utc;
use scraper::Html;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Per-run parameters of one orchestrator
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Listing pages to start from
    pub seeds: Vec<Url>,

    /// Maximum number of detail fetches
    pub budget: u32,

    pub pacing_min: Duration,
    pub pacing_max: Duration,

    /// Age after which a re-seen posting's scrape time is refreshed
    pub staleness: chrono::Duration,

    /// Hash of the configuration file, stored with the run record
    pub config_hash: String,
}

impl RunSettings {
    /// Builds settings for a resolved source
    ///
    /// `budget_override` replaces the configured request budget.
    pub fn from_config(
        crawler: &CrawlerConfig,
        source: &ResolvedSource,
        config_hash: &str,
        budget_override: Option<u32>,
    ) -> Result<Self> {
        let seeds = source
            .seeds
            .iter()
            .map(|seed| parse_http_url(seed))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            seeds,
            budget: budget_override.unwrap_or(crawler.request_budget),
            pacing_min: Duration::from_millis(crawler.pacing_min_ms),
            pacing_max: Duration::from_millis(crawler.pacing_max_ms),
            staleness: chrono::Duration::days(i64::from(crawler.staleness_days)),
            config_hash: config_hash.to_string(),
        })
    }
}

/// Result of one orchestrator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub source: SourceId,
    pub run_id: i64,

    /// Terminal phase: `Done` or `Aborted`
    pub phase: CrawlPhase,

    /// Postings newly created by this run
    pub created: u64,

    /// Seed listing pages fetched successfully
    pub listings_fetched: usize,

    /// Candidates after merging all listing pages
    pub candidates: usize,

    /// Detail pages requested
    pub detail_fetches: u32,

    /// Candidates skipped because they were already known
    pub skipped_known: usize,

    /// Candidates skipped because the budget ran out
    pub skipped_budget: usize,

    /// Candidates whose fetch, extraction or persistence failed
    pub failed: usize,

    /// True when the run stopped early on a shutdown request
    pub interrupted: bool,

    /// Why the run was aborted, if it was
    pub abort_reason: Option<String>,
}

impl RunOutcome {
    fn new(source: SourceId, run_id: i64) -> Self {
        Self {
            source,
            run_id,
            phase: CrawlPhase::Idle,
            created: 0,
            listings_fetched: 0,
            candidates: 0,
            detail_fetches: 0,
            skipped_known: 0,
            skipped_budget: 0,
            failed: 0,
            interrupted: false,
            abort_reason: None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.phase == CrawlPhase::Aborted
    }

    /// Status recorded in the run table
    pub fn status(&self) -> RunStatus {
        if self.is_aborted() {
            RunStatus::Aborted
        } else if self.interrupted {
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        }
    }
}

/// What happened to one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Known(DedupVerdict),
    OverBudget,
    FetchFailed,
    Created(i64),
    Duplicate,
}

/// Drives one source through listing discovery, detail fetching and
/// persistence
pub struct Orchestrator<S: Storage> {
    adapter: Arc<dyn SiteAdapter>,
    fetcher: Arc<dyn Fetcher>,
    summarizer: Arc<dyn Summarizer>,
    storage: Arc<Mutex<S>>,
    dedup: DedupIndex<S>,
    governor: RequestBudgetGovernor,
    settings: RunSettings,
    shutdown: Arc<AtomicBool>,
    phase: CrawlPhase,
}

impl<S: Storage> Orchestrator<S> {
    /// Creates an orchestrator with a no-op summarizer
    pub fn new(
        adapter: Arc<dyn SiteAdapter>,
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<Mutex<S>>,
        settings: RunSettings,
    ) -> Self {
        let governor =
            RequestBudgetGovernor::new(settings.budget, settings.pacing_min, settings.pacing_max);

        Self {
            adapter,
            fetcher,
            summarizer: Arc::new(NoopSummarizer),
            dedup: DedupIndex::new(Arc::clone(&storage)),
            storage,
            governor,
            settings,
            shutdown: Arc::new(AtomicBool::new(false)),
            phase: CrawlPhase::Idle,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    /// Shares a flag that stops the run between candidates once set
    pub fn with_shutdown(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn source(&self) -> SourceId {
        self.adapter.source()
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Runs the source once
    ///
    /// Each call starts from `Idle` with a full request budget, so one
    /// orchestrator can run its source repeatedly.
    ///
    /// # Returns
    ///
    /// * `Ok(RunOutcome)` - The run reached `Done` or `Aborted`; an aborted
    ///   run created nothing
    /// * `Err(HarvestError)` - Run bookkeeping failed; the run is recorded as
    ///   failed when possible
    pub async fn run(&mut self) -> Result<RunOutcome> {
        let source = self.source();
        self.phase = CrawlPhase::Idle;
        self.governor.reset();

        let run_id = {
            let mut storage = self.storage.lock().unwrap();
            storage.create_run(source.as_str(), &self.settings.config_hash)?
        };

        tracing::info!(
            source = %source,
            run_id,
            seeds = self.settings.seeds.len(),
            budget = self.governor.limit(),
            "Starting run"
        );

        let mut outcome = RunOutcome::new(source, run_id);
        match self.execute(&mut outcome).await {
            Ok(()) => {
                outcome.phase = self.phase;
                let mut storage = self.storage.lock().unwrap();
                storage.finish_run(run_id, outcome.status(), outcome.created)?;
            }
            Err(e) => {
                tracing::error!(source = %source, run_id, "Run failed: {}", e);
                let mut storage = self.storage.lock().unwrap();
                if let Err(finish_error) =
                    storage.finish_run(run_id, RunStatus::Failed, outcome.created)
                {
                    tracing::warn!("Could not record failed run {}: {}", run_id, finish_error);
                }
                return Err(e);
            }
        }

        if outcome.is_aborted() {
            tracing::warn!(
                source = %source,
                run_id,
                reason = outcome.abort_reason.as_deref().unwrap_or(""),
                "Run aborted"
            );
        } else {
            tracing::info!(
                source = %source,
                run_id,
                created = outcome.created,
                detail_fetches = outcome.detail_fetches,
                skipped_known = outcome.skipped_known,
                skipped_budget = outcome.skipped_budget,
                failed = outcome.failed,
                interrupted = outcome.interrupted,
                "Run finished"
            );
        }

        Ok(outcome)
    }

    async fn execute(&mut self, outcome: &mut RunOutcome) -> Result<()> {
        self.transition(CrawlPhase::FetchingListings)?;
        let pages = self.fetch_listings().await;
        outcome.listings_fetched = pages.len();

        if pages.is_empty() {
            return self.abort(
                outcome,
                format!("all {} seed(s) failed to fetch", self.settings.seeds.len()),
            );
        }

        self.transition(CrawlPhase::ExtractingCandidates)?;
        let Some(candidates) = self.collect_candidates(&pages) else {
            return self.abort(
                outcome,
                "listing container missing on every fetched seed".to_string(),
            );
        };
        outcome.candidates = candidates.len();

        self.transition(CrawlPhase::ProcessingDetails)?;
        for candidate in &candidates {
            if self.shutdown.load(Ordering::SeqCst) {
                tracing::info!(source = %self.source(), "Shutdown requested, stopping run");
                outcome.interrupted = true;
                break;
            }

            match self.process_candidate(candidate).await {
                Ok(ItemOutcome::Known(verdict)) => {
                    outcome.skipped_known += 1;
                    tracing::debug!(
                        source = %self.source(),
                        url = %candidate.url,
                        verdict = verdict.as_str(),
                        "Candidate skipped as duplicate"
                    );
                }
                Ok(ItemOutcome::OverBudget) => outcome.skipped_budget += 1,
                Ok(ItemOutcome::FetchFailed) => outcome.failed += 1,
                Ok(ItemOutcome::Created(id)) => {
                    outcome.created += 1;
                    tracing::info!(
                        source = %self.source(),
                        posting_id = id,
                        url = %candidate.url,
                        title = %candidate.title,
                        "Posting persisted"
                    );
                }
                Ok(ItemOutcome::Duplicate) => outcome.skipped_known += 1,
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(
                        source = %self.source(),
                        url = %candidate.url,
                        "Item failed: {}",
                        e
                    );
                }
            }

            if self.phase == CrawlPhase::Persisting {
                self.transition(CrawlPhase::ProcessingDetails)?;
            }
        }

        outcome.detail_fetches = self.governor.used();
        if outcome.skipped_budget > 0 {
            tracing::info!(
                source = %self.source(),
                skipped = outcome.skipped_budget,
                "Request budget of {} exhausted",
                self.governor.limit()
            );
        }

        self.transition(CrawlPhase::Done)
    }

    /// Fetches every seed, skipping the ones that fail
    async fn fetch_listings(&self) -> Vec<(Url, String)> {
        let wait_for = self.adapter.listing_selectors().container;
        let mut pages = Vec::new();

        for seed in &self.settings.seeds {
            match self.fetcher.fetch(seed, Some(wait_for)).await {
                Ok(html) => {
                    tracing::info!(
                        source = %self.source(),
                        url = %seed,
                        bytes = html.len(),
                        "Listing fetched"
                    );
                    pages.push((seed.clone(), html));
                }
                Err(e) => {
                    tracing::warn!(source = %self.source(), url = %seed, "Listing fetch failed: {}", e);
                }
            }
        }

        pages
    }

    /// Merges candidates from all listing pages
    ///
    /// Returns `None` when no page carried the listing container.
    fn collect_candidates(&self, pages: &[(Url, String)]) -> Option<Vec<Candidate>> {
        let mut merged = Vec::new();
        let mut any_container = false;

        for (page_url, html) in pages {
            match extract_candidates(html, self.adapter.as_ref(), page_url) {
                Some(found) => {
                    any_container = true;
                    let total = found.len();
                    let added = merge_candidates(&mut merged, found);
                    tracing::debug!(
                        source = %self.source(),
                        url = %page_url,
                        total,
                        added,
                        "Candidates extracted"
                    );
                }
                None => {
                    tracing::warn!(
                        source = %self.source(),
                        url = %page_url,
                        "Listing container not found"
                    );
                }
            }
        }

        any_container.then_some(merged)
    }

    async fn process_candidate(&mut self, candidate: &Candidate) -> Result<ItemOutcome> {
        let url = candidate.url.as_str();

        let verdict = self.dedup.check(url, &candidate.title, "")?;
        if verdict.is_known() {
            if verdict == DedupVerdict::KnownUrl {
                self.refresh_if_stale(url)?;
            }
            return Ok(ItemOutcome::Known(verdict));
        }

        if !self.governor.try_acquire() {
            return Ok(ItemOutcome::OverBudget);
        }

        self.governor.pace().await;
        {
            let mut storage = self.storage.lock().unwrap();
            storage.record_request(url, &candidate.title)?;
        }

        let html = match self.fetcher.fetch(&candidate.url, None).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(source = %self.source(), url, "Detail fetch failed: {}", e);
                return Ok(ItemOutcome::FetchFailed);
            }
        };

        let details = parse_details(self.adapter.as_ref(), &html);
        let posting = self.build_posting(candidate, details).await;

        self.transition(CrawlPhase::Persisting)?;
        let created = {
            let mut storage = self.storage.lock().unwrap();
            storage.create_posting(&posting)?
        };

        Ok(match created {
            CreateOutcome::Created(id) => ItemOutcome::Created(id),
            CreateOutcome::DuplicateUrl | CreateOutcome::DuplicateCompanyTitle => {
                tracing::debug!(
                    source = %self.source(),
                    url,
                    company = %posting.company,
                    "Posting already stored ({:?})",
                    created
                );
                ItemOutcome::Duplicate
            }
        })
    }

    /// Normalizes extracted details into a posting
    async fn build_posting(&self, candidate: &Candidate, details: PostingDetails) -> NewPosting {
        let salary = standardize_salary(&details.salary);
        let skills = normalize_skills(details.skills, &details.experience_level);
        let summary = summarize_or_empty(self.summarizer.as_ref(), &details.description).await;

        NewPosting {
            url: candidate.url.to_string(),
            title: candidate.title.clone(),
            company: details.company,
            location: details.location,
            operating_mode: details.operating_mode,
            experience_level: details.experience_level,
            salary,
            skills,
            description: details.description,
            summary,
            source: self.source(),
        }
    }

    /// Bumps `scraped_at` of a stored posting seen again after the staleness
    /// window
    fn refresh_if_stale(&self, url: &str) -> Result<()> {
        let mut storage = self.storage.lock().unwrap();
        let Some(posting) = storage.find_posting_by_url(url)? else {
            return Ok(());
        };

        if Utc::now() - posting.scraped_at > self.settings.staleness {
            storage.refresh_scraped_at(url)?;
            tracing::debug!(source = %self.source(), url, "Refreshed stale posting");
        }

        Ok(())
    }

    fn abort(&mut self, outcome: &mut RunOutcome, reason: String) -> Result<()> {
        self.transition(CrawlPhase::Aborted)?;
        outcome.created = 0;
        outcome.abort_reason = Some(reason);
        Ok(())
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::trace!(source = %self.source(), "{} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}

/// Parses a detail page and runs every extractor over it
fn parse_details(adapter: &dyn SiteAdapter, html: &str) -> PostingDetails {
    let page = Html::parse_document(html);
    extract_details(adapter, &page)
}
