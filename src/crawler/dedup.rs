//! Pre-fetch duplicate detection
//!
//! Consulted before a detail request is spent. The store's `create_posting`
//! stays the authoritative guard; this check only saves network traffic.

use crate::storage::{Storage, StorageResult};
use std::sync::{Arc, Mutex};

/// Why a candidate was or was not considered known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupVerdict {
    /// Nothing matches; the candidate is worth fetching
    New,
    /// A posting with this URL is stored
    KnownUrl,
    /// The URL was fetched before, whether or not a posting came of it
    KnownLedger,
    /// A posting with the same company and title is stored
    KnownCompanyTitle,
}

impl DedupVerdict {
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::New)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::KnownUrl => "known_url",
            Self::KnownLedger => "known_ledger",
            Self::KnownCompanyTitle => "known_company_title",
        }
    }
}

/// Read-only view over the store used to filter candidates
pub struct DedupIndex<S: Storage> {
    storage: Arc<Mutex<S>>,
}

impl<S: Storage> DedupIndex<S> {
    pub fn new(storage: Arc<Mutex<S>>) -> Self {
        Self { storage }
    }

    /// Checks the posting URL, the request ledger, then `(company, title)`
    ///
    /// The company check is skipped when `company` is empty, since listing
    /// pages usually do not carry it.
    pub fn check(&self, url: &str, title: &str, company: &str) -> StorageResult<DedupVerdict> {
        let storage = self.storage.lock().unwrap();

        if storage.find_posting_by_url(url)?.is_some() {
            return Ok(DedupVerdict::KnownUrl);
        }

        if storage.has_ledger_entry(url)? {
            return Ok(DedupVerdict::KnownLedger);
        }

        if !company.is_empty()
            && storage
                .find_posting_by_company_title(company, title)?
                .is_some()
        {
            return Ok(DedupVerdict::KnownCompanyTitle);
        }

        Ok(DedupVerdict::New)
    }

    pub fn is_known(&self, url: &str, title: &str, company: &str) -> StorageResult<bool> {
        Ok(self.check(url, title, company)?.is_known())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::SkillMap;
    use crate::sites::SourceId;
    use crate::storage::{NewPosting, OperatingMode, SqliteStorage};

    fn posting(url: &str, company: &str, title: &str) -> NewPosting {
        NewPosting {
            url: url.to_string(),
            title: title.to_string(),
            company: company.to_string(),
            location: "Warszawa".to_string(),
            operating_mode: OperatingMode::Remote,
            experience_level: "Senior".to_string(),
            salary: String::new(),
            skills: SkillMap::new(),
            description: String::new(),
            summary: String::new(),
            source: SourceId::NoFluffJobs,
        }
    }

    fn index() -> (DedupIndex<SqliteStorage>, Arc<Mutex<SqliteStorage>>) {
        let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
        (DedupIndex::new(Arc::clone(&storage)), storage)
    }

    #[test]
    fn test_unknown_candidate_is_new() {
        let (index, _) = index();
        assert_eq!(
            index.check("https://example.com/job/1", "Dev", "").unwrap(),
            DedupVerdict::New
        );
    }

    #[test]
    fn test_known_url() {
        let (index, storage) = index();
        storage
            .lock()
            .unwrap()
            .create_posting(&posting("https://example.com/job/1", "Acme", "Dev"))
            .unwrap();

        assert_eq!(
            index.check("https://example.com/job/1", "Other", "").unwrap(),
            DedupVerdict::KnownUrl
        );
    }

    #[test]
    fn test_ledger_entry_without_posting() {
        let (index, storage) = index();
        storage
            .lock()
            .unwrap()
            .record_request("https://example.com/job/2", "Dev")
            .unwrap();

        assert!(index
            .is_known("https://example.com/job/2", "Dev", "")
            .unwrap());
    }

    #[test]
    fn test_company_title_only_with_company() {
        let (index, storage) = index();
        storage
            .lock()
            .unwrap()
            .create_posting(&posting("https://example.com/job/1", "Acme", "Dev"))
            .unwrap();

        assert_eq!(
            index
                .check("https://example.com/job/9", "Dev", "Acme")
                .unwrap(),
            DedupVerdict::KnownCompanyTitle
        );
        assert_eq!(
            index.check("https://example.com/job/9", "Dev", "").unwrap(),
            DedupVerdict::New
        );
    }
}
