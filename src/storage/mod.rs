//! Storage module for persisting harvested postings
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Posting persistence with URL uniqueness
//! - The request ledger of detail pages already fetched
//! - Per-source run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{CreateOutcome, Storage, StorageError, StorageResult};

use crate::normalize::SkillMap;
use crate::sites::SourceId;
use crate::HarvestError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// How a posting's work is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatingMode {
    Remote,
    Hybrid,
    Office,
    Unknown,
}

impl OperatingMode {
    /// Classifies board text such as "Praca zdalna" or "hybrid work"
    ///
    /// Hybrid markers are checked first, then remote ("home office" counts as
    /// remote), then on-site office markers.
    pub fn classify(text: &str) -> Self {
        let lowered = text.to_lowercase();
        if ["hybryd", "hybrid"].iter().any(|k| lowered.contains(k)) {
            Self::Hybrid
        } else if ["zdaln", "remote", "home office"]
            .iter()
            .any(|k| lowered.contains(k))
        {
            Self::Remote
        } else if ["stacjonarn", "office", "on-site", "onsite"]
            .iter()
            .any(|k| lowered.contains(k))
        {
            Self::Office
        } else {
            Self::Unknown
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Remote => "Remote",
            Self::Hybrid => "Hybrid",
            Self::Office => "Office",
            Self::Unknown => "",
        }
    }

    pub fn from_db_string(s: &str) -> Self {
        match s {
            "Remote" => Self::Remote,
            "Hybrid" => Self::Hybrid,
            "Office" => Self::Office,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            other => f.write_str(other.to_db_string()),
        }
    }
}

/// A fully extracted and normalized posting, ready to be created
#[derive(Debug, Clone, PartialEq)]
pub struct NewPosting {
    pub url: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub operating_mode: OperatingMode,
    pub experience_level: String,
    pub salary: String,
    pub skills: SkillMap,
    pub description: String,
    pub summary: String,
    pub source: SourceId,
}

/// Represents a posting in the database
#[derive(Debug, Clone)]
pub struct PostingRecord {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub operating_mode: OperatingMode,
    pub experience_level: String,
    pub salary: String,
    pub skills: SkillMap,
    pub description: String,
    pub summary: String,
    pub source: String,
    pub scraped_at: DateTime<Utc>,
}

/// Represents a request ledger entry
#[derive(Debug, Clone)]
pub struct LedgerRecord {
    pub url: String,
    pub title: String,
    pub fetched_at: String,
}

/// Represents a single-source crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub source: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub created_count: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Aborted,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "aborted" => Some(Self::Aborted),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
