//! Normalization of free-text posting fields
//!
//! - `salary`: compensation text → canonical monthly range string
//! - `skills`: per-skill text → canonical level buckets

pub mod salary;
pub mod skills;

pub use salary::{
    convert_eur_to_pln, group_thousands, parse_salary, salary_bounds, standardize_salary,
    Currency, SalaryError, SalaryRange,
};
pub use skills::{normalize_skills, sorted_skills, RawSkills, SkillLevel, SkillMap};
