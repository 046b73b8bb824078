//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: lifecycle of one single-source orchestrator run

mod crawl_phase;

// Re-export main types
pub use crawl_phase::CrawlPhase;
