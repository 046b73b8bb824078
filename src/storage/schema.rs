//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the JobHarvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track per-source crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    created_count INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_runs_source ON runs(source);

-- Harvested postings, one row per detail URL
CREATE TABLE IF NOT EXISTS postings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    company TEXT NOT NULL DEFAULT '',
    location TEXT NOT NULL DEFAULT '',
    operating_mode TEXT NOT NULL DEFAULT '',
    experience_level TEXT NOT NULL DEFAULT '',
    salary TEXT NOT NULL DEFAULT '',
    skills TEXT NOT NULL DEFAULT '{}',
    description TEXT NOT NULL DEFAULT '',
    summary TEXT NOT NULL DEFAULT '',
    source TEXT NOT NULL,
    scraped_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_postings_company_title ON postings(company, title);
CREATE INDEX IF NOT EXISTS idx_postings_source ON postings(source);

-- Detail pages already requested, whether or not a posting came of it
CREATE TABLE IF NOT EXISTS request_ledger (
    url TEXT PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    fetched_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
