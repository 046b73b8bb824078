//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{NewPosting, PostingRecord, RunRecord, RunStatus};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Posting not found: {0}")]
    PostingNotFound(i64),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result of an atomic check-then-create of a posting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The posting was inserted with this ID
    Created(i64),
    /// A posting with the same URL already exists
    DuplicateUrl,
    /// A posting with the same company and title already exists
    DuplicateCompanyTitle,
}

impl CreateOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Trait for storage backend implementations
///
/// This is the persistence sink of the harvester: postings, the request
/// ledger and run bookkeeping. `create_posting` is the authoritative guard
/// against duplicates and must be atomic.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new run for a source
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, source: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run for a source
    fn get_latest_run(&self, source: &str) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as finished with its final status and created count
    fn finish_run(&mut self, run_id: i64, status: RunStatus, created: u64) -> StorageResult<()>;

    /// Flags runs still marked running (left behind by a killed process)
    /// as interrupted
    ///
    /// # Returns
    ///
    /// Number of runs updated
    fn mark_interrupted_runs(&mut self) -> StorageResult<usize>;

    // ===== Posting Management =====

    /// Gets a posting by URL
    fn find_posting_by_url(&self, url: &str) -> StorageResult<Option<PostingRecord>>;

    /// Gets a posting by company and title
    fn find_posting_by_company_title(
        &self,
        company: &str,
        title: &str,
    ) -> StorageResult<Option<PostingRecord>>;

    /// Creates a posting unless a duplicate exists
    ///
    /// The URL and, when the company is known, the (company, title) pair are
    /// checked and the row inserted in one transaction.
    fn create_posting(&mut self, posting: &NewPosting) -> StorageResult<CreateOutcome>;

    /// Refreshes `scraped_at` of a posting that is still listed
    ///
    /// # Returns
    ///
    /// true if a posting with this URL existed
    fn refresh_scraped_at(&mut self, url: &str) -> StorageResult<bool>;

    /// Replaces stored salaries, as `(posting_id, salary)` pairs
    ///
    /// Used by the maintenance migration. All updates are written in one
    /// transaction; if any posting is missing nothing is changed.
    fn update_salaries(&mut self, updates: &[(i64, String)]) -> StorageResult<()>;

    /// Gets all postings, newest first
    fn list_postings(&self) -> StorageResult<Vec<PostingRecord>>;

    /// Gets total posting count
    fn count_postings(&self) -> StorageResult<u64>;

    /// Gets posting counts per source
    fn count_postings_by_source(&self) -> StorageResult<HashMap<String, u64>>;

    // ===== Request Ledger =====

    /// Checks whether a detail URL was already fetched
    fn has_ledger_entry(&self, url: &str) -> StorageResult<bool>;

    /// Records a detail fetch attempt
    ///
    /// # Returns
    ///
    /// true if this is the first entry for the URL
    fn record_request(&mut self, url: &str, title: &str) -> StorageResult<bool>;

    /// Gets total ledger entry count
    fn count_ledger_entries(&self) -> StorageResult<u64>;
}
