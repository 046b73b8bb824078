/// Crawl phase definitions for tracking one source run
///
/// This module defines the lifecycle an orchestrator run moves through and
/// which transitions between phases are legal.
use std::fmt;

/// Represents the current phase of a single-source crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Initial State =====
    /// Run constructed but not started
    Idle,

    // ===== Active States =====
    /// Seed listing pages are being fetched
    FetchingListings,

    /// Title/link candidates are being pulled out of listing pages
    ExtractingCandidates,

    /// Candidates are being deduplicated, fetched and extracted one by one
    ProcessingDetails,

    /// A fully normalized posting is being written to the store
    Persisting,

    // ===== Terminal States =====
    /// Run finished; the created count is final
    Done,

    /// Run gave up before processing candidates; nothing was created
    Aborted,
}

impl CrawlPhase {
    /// Returns true if this is a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Checks whether moving from this phase to `next` is allowed
    ///
    /// `Persisting` hands control back to `ProcessingDetails` for the next
    /// candidate, and any non-terminal phase may abort.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        match (self, next) {
            (from, Aborted) => !from.is_terminal(),
            (Idle, FetchingListings) => true,
            (FetchingListings, ExtractingCandidates) => true,
            (ExtractingCandidates, ProcessingDetails) => true,
            (ProcessingDetails, Persisting) => true,
            (Persisting, ProcessingDetails) => true,
            (ProcessingDetails, Done) | (Persisting, Done) => true,
            _ => false,
        }
    }

    /// Short snake_case name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingListings => "fetching_listings",
            Self::ExtractingCandidates => "extracting_candidates",
            Self::ProcessingDetails => "processing_details",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(CrawlPhase::Done.is_terminal());
        assert!(CrawlPhase::Aborted.is_terminal());

        assert!(!CrawlPhase::Idle.is_terminal());
        assert!(!CrawlPhase::FetchingListings.is_terminal());
        assert!(!CrawlPhase::Persisting.is_terminal());
    }

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            CrawlPhase::Idle,
            CrawlPhase::FetchingListings,
            CrawlPhase::ExtractingCandidates,
            CrawlPhase::ProcessingDetails,
            CrawlPhase::Persisting,
            CrawlPhase::ProcessingDetails,
            CrawlPhase::Done,
        ];

        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{:?} -> {:?} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_abort_from_any_active_phase() {
        let phases = [
            CrawlPhase::Idle,
            CrawlPhase::FetchingListings,
            CrawlPhase::ExtractingCandidates,
            CrawlPhase::ProcessingDetails,
            CrawlPhase::Persisting,
            CrawlPhase::Done,
            CrawlPhase::Aborted,
        ];
        for phase in phases {
            assert_eq!(
                phase.can_transition_to(CrawlPhase::Aborted),
                !phase.is_terminal(),
                "abort from {:?}",
                phase
            );
        }
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!CrawlPhase::Idle.can_transition_to(CrawlPhase::ProcessingDetails));
        assert!(!CrawlPhase::FetchingListings.can_transition_to(CrawlPhase::Persisting));
        assert!(!CrawlPhase::Done.can_transition_to(CrawlPhase::FetchingListings));
        assert!(!CrawlPhase::Aborted.can_transition_to(CrawlPhase::Done));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", CrawlPhase::ProcessingDetails), "processing_details");
        assert_eq!(format!("{}", CrawlPhase::Done), "done");
    }
}
