//! Statistics over stored postings
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::normalize::{group_thousands, salary_bounds};
use crate::sites::SourceId;
use crate::storage::{RunRecord, Storage};
use crate::HarvestError;
use std::collections::HashMap;

/// How many skills the report lists
const TOP_SKILLS: usize = 10;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of stored postings
    pub total_postings: u64,

    /// Detail URLs ever requested
    pub ledger_entries: u64,

    /// Postings per source identifier
    pub by_source: HashMap<String, u64>,

    /// Postings per operating mode
    pub by_mode: HashMap<String, u64>,

    /// Postings per experience level; "unknown" when none was extracted
    pub by_experience: HashMap<String, u64>,

    /// Most frequent skills with the number of postings naming them
    pub top_skills: Vec<(String, u64)>,

    /// Mean monthly PLN range over postings with a canonical salary
    pub average_salary: Option<(u64, u64)>,

    /// Postings that contributed to `average_salary`
    pub salaried_postings: u64,

    /// Most recent run of each source that has one
    pub latest_runs: Vec<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<HarvestStatistics, HarvestError> {
    let total_postings = storage.count_postings()?;
    let ledger_entries = storage.count_ledger_entries()?;
    let by_source = storage.count_postings_by_source()?;

    let mut by_mode: HashMap<String, u64> = HashMap::new();
    let mut by_experience: HashMap<String, u64> = HashMap::new();
    let mut skill_counts: HashMap<String, u64> = HashMap::new();
    let mut salary_sum = (0u64, 0u64);
    let mut salaried_postings = 0u64;

    for posting in storage.list_postings()? {
        *by_mode.entry(posting.operating_mode.to_string()).or_default() += 1;

        let experience = if posting.experience_level.is_empty() {
            "unknown".to_string()
        } else {
            posting.experience_level.clone()
        };
        *by_experience.entry(experience).or_default() += 1;

        for skill in posting.skills.keys() {
            *skill_counts.entry(skill.clone()).or_default() += 1;
        }

        if let Some((min, max)) = salary_bounds(&posting.salary) {
            salary_sum.0 = salary_sum.0.saturating_add(min);
            salary_sum.1 = salary_sum.1.saturating_add(max);
            salaried_postings += 1;
        }
    }

    let mut top_skills: Vec<(String, u64)> = skill_counts.into_iter().collect();
    top_skills.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_skills.truncate(TOP_SKILLS);

    let average_salary = (salaried_postings > 0).then(|| {
        (
            salary_sum.0 / salaried_postings,
            salary_sum.1 / salaried_postings,
        )
    });

    let mut latest_runs = Vec::new();
    for source in SourceId::all() {
        if let Some(run) = storage.get_latest_run(source.as_str())? {
            latest_runs.push(run);
        }
    }

    Ok(HarvestStatistics {
        total_postings,
        ledger_entries,
        by_source,
        by_mode,
        by_experience,
        top_skills,
        average_salary,
        salaried_postings,
        latest_runs,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Total postings: {}", stats.total_postings);
    println!("  Detail pages requested: {}", stats.ledger_entries);
    println!();

    print_breakdown("Postings by Source", &stats.by_source, stats.total_postings);
    print_breakdown("Postings by Operating Mode", &stats.by_mode, stats.total_postings);
    print_breakdown(
        "Postings by Experience Level",
        &stats.by_experience,
        stats.total_postings,
    );

    if !stats.top_skills.is_empty() {
        println!("Top Skills:");
        for (skill, count) in &stats.top_skills {
            println!("  {}: {}", skill, count);
        }
        println!();
    }

    match stats.average_salary {
        Some((min, max)) => println!(
            "Average Salary: {} - {} PLN (over {} postings)",
            group_thousands(min),
            group_thousands(max),
            stats.salaried_postings
        ),
        None => println!("Average Salary: n/a"),
    }

    if !stats.latest_runs.is_empty() {
        println!("\nLatest Runs:");
        for run in &stats.latest_runs {
            println!(
                "  {}: run {} {} ({} created, started {})",
                run.source,
                run.id,
                run.status.to_db_string(),
                run.created_count,
                run.started_at
            );
        }
    }
}

fn print_breakdown(title: &str, counts: &HashMap<String, u64>, total: u64) {
    if counts.is_empty() {
        return;
    }

    println!("{}:", title);
    // Sort by count (descending), then by name
    let mut entries: Vec<_> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    for (name, count) in entries {
        let percentage = if total > 0 {
            (*count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", name, count, percentage);
    }
    println!();
}
