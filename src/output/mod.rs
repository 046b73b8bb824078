//! Output module for reports over the harvested data
//!
//! This module handles:
//! - Statistics over stored postings and runs
//! - The salary maintenance migration and its report

pub mod migration;
pub mod stats;

pub use migration::{migrate_salaries, print_migration_report, MigrationReport, SalaryChange};
pub use stats::{load_statistics, print_statistics, HarvestStatistics};
