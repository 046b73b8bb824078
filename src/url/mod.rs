//! URL handling module for JobHarvest
//!
//! Seed parsing and the canonical detail-page URL used as a posting's key.

mod normalize;

pub use normalize::{parse_http_url, strip_tracking_params};
