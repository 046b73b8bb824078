//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::normalize::SkillMap;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CreateOutcome, Storage, StorageError, StorageResult};
use crate::storage::{NewPosting, OperatingMode, PostingRecord, RunRecord, RunStatus};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;

const POSTING_COLUMNS: &str = "id, url, title, company, location, operating_mode, \
     experience_level, salary, skills, description, summary, source, scraped_at";

const RUN_COLUMNS: &str =
    "id, source, started_at, finished_at, config_hash, status, created_count";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn posting_from_row(row: &Row<'_>) -> rusqlite::Result<PostingRecord> {
    let skills_json: String = row.get(8)?;
    let skills: SkillMap =
        serde_json::from_str(&skills_json).map_err(|e| conversion_error(8, e))?;

    let scraped_at: String = row.get(12)?;
    let scraped_at = DateTime::parse_from_rfc3339(&scraped_at)
        .map_err(|e| conversion_error(12, e))?
        .with_timezone(&Utc);

    Ok(PostingRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        company: row.get(3)?,
        location: row.get(4)?,
        operating_mode: OperatingMode::from_db_string(&row.get::<_, String>(5)?),
        experience_level: row.get(6)?,
        salary: row.get(7)?,
        skills,
        description: row.get(9)?,
        summary: row.get(10)?,
        source: row.get(11)?,
        scraped_at,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        source: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(RunStatus::Running),
        created_count: row.get::<_, i64>(6)? as u64,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, source: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (source, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![source, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self, source: &str) -> StorageResult<Option<RunRecord>> {
        let sql = format!(
            "SELECT {} FROM runs WHERE source = ?1 ORDER BY id DESC LIMIT 1",
            RUN_COLUMNS
        );
        let run = self
            .conn
            .query_row(&sql, params![source], run_from_row)
            .optional()?;
        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus, created: u64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, created_count = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, created as i64, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn mark_interrupted_runs(&mut self) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE status = ?3",
            params![
                RunStatus::Interrupted.to_db_string(),
                now,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(updated)
    }

    // ===== Posting Management =====

    fn find_posting_by_url(&self, url: &str) -> StorageResult<Option<PostingRecord>> {
        let sql = format!("SELECT {} FROM postings WHERE url = ?1", POSTING_COLUMNS);
        let posting = self
            .conn
            .query_row(&sql, params![url], posting_from_row)
            .optional()?;
        Ok(posting)
    }

    fn find_posting_by_company_title(
        &self,
        company: &str,
        title: &str,
    ) -> StorageResult<Option<PostingRecord>> {
        let sql = format!(
            "SELECT {} FROM postings WHERE company = ?1 AND title = ?2 LIMIT 1",
            POSTING_COLUMNS
        );
        let posting = self
            .conn
            .query_row(&sql, params![company, title], posting_from_row)
            .optional()?;
        Ok(posting)
    }

    fn create_posting(&mut self, posting: &NewPosting) -> StorageResult<CreateOutcome> {
        let skills_json = serde_json::to_string(&posting.skills)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let url_taken: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM postings WHERE url = ?1)",
            params![posting.url],
            |row| row.get(0),
        )?;
        if url_taken {
            return Ok(CreateOutcome::DuplicateUrl);
        }

        if !posting.company.is_empty() {
            let pair_taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM postings WHERE company = ?1 AND title = ?2)",
                params![posting.company, posting.title],
                |row| row.get(0),
            )?;
            if pair_taken {
                return Ok(CreateOutcome::DuplicateCompanyTitle);
            }
        }

        let now = Utc::now().to_rfc3339();
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO postings (url, title, company, location, operating_mode,
             experience_level, salary, skills, description, summary, source, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                posting.url,
                posting.title,
                posting.company,
                posting.location,
                posting.operating_mode.to_db_string(),
                posting.experience_level,
                posting.salary,
                skills_json,
                posting.description,
                posting.summary,
                posting.source.as_str(),
                now
            ],
        )?;
        if inserted == 0 {
            return Ok(CreateOutcome::DuplicateUrl);
        }

        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(CreateOutcome::Created(id))
    }

    fn refresh_scraped_at(&mut self, url: &str) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE postings SET scraped_at = ?1 WHERE url = ?2",
            params![now, url],
        )?;
        Ok(updated > 0)
    }

    fn update_salaries(&mut self, updates: &[(i64, String)]) -> StorageResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare("UPDATE postings SET salary = ?1 WHERE id = ?2")?;
            for (posting_id, salary) in updates {
                if stmt.execute(params![salary, posting_id])? == 0 {
                    return Err(StorageError::PostingNotFound(*posting_id));
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn list_postings(&self) -> StorageResult<Vec<PostingRecord>> {
        let sql = format!(
            "SELECT {} FROM postings ORDER BY scraped_at DESC, id DESC",
            POSTING_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let postings = stmt
            .query_map([], posting_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(postings)
    }

    fn count_postings(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM postings", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_postings_by_source(&self) -> StorageResult<HashMap<String, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT source, COUNT(*) FROM postings GROUP BY source")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (source, count) = row?;
            counts.insert(source, count as u64);
        }
        Ok(counts)
    }

    // ===== Request Ledger =====

    fn has_ledger_entry(&self, url: &str) -> StorageResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM request_ledger WHERE url = ?1)",
            params![url],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn record_request(&mut self, url: &str, title: &str) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO request_ledger (url, title, fetched_at) VALUES (?1, ?2, ?3)",
            params![url, title, now],
        )?;
        Ok(inserted > 0)
    }

    fn count_ledger_entries(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM request_ledger", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
