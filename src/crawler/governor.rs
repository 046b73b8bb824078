//! Request budget and pacing for detail-page fetches
//!
//! This module handles:
//! - Capping the number of detail fetches one orchestrator run may make
//! - Sleeping a randomized interval before each detail fetch

use rand::Rng;
use std::time::Duration;

/// Limits detail fetches per run and spaces them out
///
/// One governor belongs to one orchestrator and is reset at the start of each
/// run; its counter is never shared across sources.
#[derive(Debug, Clone)]
pub struct RequestBudgetGovernor {
    /// Maximum number of detail fetches for this run
    limit: u32,

    /// Detail fetches granted so far
    used: u32,

    /// Lower bound of the pause before a fetch
    pacing_min: Duration,

    /// Upper bound of the pause before a fetch
    pacing_max: Duration,
}

impl RequestBudgetGovernor {
    /// Creates a governor with a fresh counter
    ///
    /// A reversed pacing range is swapped rather than rejected.
    pub fn new(limit: u32, pacing_min: Duration, pacing_max: Duration) -> Self {
        let (pacing_min, pacing_max) = if pacing_min <= pacing_max {
            (pacing_min, pacing_max)
        } else {
            (pacing_max, pacing_min)
        };

        Self {
            limit,
            used: 0,
            pacing_min,
            pacing_max,
        }
    }

    /// Claims one detail fetch
    ///
    /// # Returns
    ///
    /// * `true` - The fetch may proceed; the counter was incremented
    /// * `false` - The budget is exhausted
    pub fn try_acquire(&mut self) -> bool {
        if self.used >= self.limit {
            return false;
        }
        self.used += 1;
        true
    }

    /// Starts a new run with the full budget
    pub fn reset(&mut self) {
        self.used = 0;
    }

    /// Sleeps for a random duration within the pacing range
    pub async fn pace(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }

        tracing::trace!("Pacing for {:?} before next detail fetch", delay);
        tokio::time::sleep(delay).await;
    }

    /// Picks the next pause from the pacing range
    pub fn next_delay(&self) -> Duration {
        if self.pacing_min == self.pacing_max {
            return self.pacing_min;
        }

        let min_ms = self.pacing_min.as_millis() as u64;
        let max_ms = self.pacing_max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
    }

    /// Number of fetches granted so far
    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}
