//! Salary maintenance migration
//!
//! Brings salaries stored by older harvests into the canonical form:
//! EUR amounts are converted to PLN, everything else is re-standardized,
//! which also drops decimal remainders such as `,00`.

use crate::normalize::{convert_eur_to_pln, standardize_salary};
use crate::storage::{Storage, StorageResult};

/// Why a stored salary changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    EurConverted,
    Reformatted,
}

/// One planned or applied salary rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalaryChange {
    pub posting_id: i64,
    pub from: String,
    pub to: String,
    pub kind: ChangeKind,
}

/// Outcome of a migration pass
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    /// Postings with a non-empty salary
    pub examined: usize,
    pub changes: Vec<SalaryChange>,
    /// Whether `changes` were written to the store
    pub applied: bool,
}

impl MigrationReport {
    pub fn eur_converted(&self) -> usize {
        self.count(ChangeKind::EurConverted)
    }

    pub fn reformatted(&self) -> usize {
        self.count(ChangeKind::Reformatted)
    }

    fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }
}

/// Computes the canonical replacement of a stored salary, if it differs
pub fn planned_salary(raw: &str) -> Option<(String, ChangeKind)> {
    if let Some(converted) = convert_eur_to_pln(raw) {
        return Some((converted, ChangeKind::EurConverted));
    }

    let standardized = standardize_salary(raw);
    (standardized != raw).then_some((standardized, ChangeKind::Reformatted))
}

/// Walks all stored postings and rewrites non-canonical salaries
///
/// With `apply` false nothing is written and the report lists what would
/// change. With `apply` true every change is written in one batch, so a
/// storage error leaves all salaries as they were.
pub fn migrate_salaries(storage: &mut dyn Storage, apply: bool) -> StorageResult<MigrationReport> {
    let mut report = MigrationReport {
        applied: apply,
        ..Default::default()
    };

    for posting in storage.list_postings()? {
        if posting.salary.trim().is_empty() {
            continue;
        }
        report.examined += 1;

        let Some((to, kind)) = planned_salary(&posting.salary) else {
            continue;
        };

        tracing::debug!(posting_id = posting.id, "Salary {:?} -> {:?}", posting.salary, to);

        report.changes.push(SalaryChange {
            posting_id: posting.id,
            from: posting.salary,
            to,
            kind,
        });
    }

    if apply && !report.changes.is_empty() {
        let updates: Vec<(i64, String)> = report
            .changes
            .iter()
            .map(|change| (change.posting_id, change.to.clone()))
            .collect();
        storage.update_salaries(&updates)?;
        tracing::info!(updated = updates.len(), "Salary migration applied");
    }

    Ok(report)
}

/// Prints each change and a summary to stdout
pub fn print_migration_report(report: &MigrationReport) {
    if !report.applied {
        println!("Dry run: no changes will be written\n");
    }

    for change in &report.changes {
        println!("Updated: \"{}\" -> \"{}\"", change.from, change.to);
    }

    println!("\nSummary:");
    println!("  Postings with salary: {}", report.examined);
    println!("  Postings updated: {}", report.changes.len());
    println!("  EUR conversions: {}", report.eur_converted());
    println!("  Reformatted: {}", report.reformatted());

    if !report.applied && !report.changes.is_empty() {
        println!("\nRe-run with --apply to write these changes.");
    }
}
