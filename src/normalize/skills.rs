//! Skill-level normalization
//!
//! Boards either split skills into "required" and "nice to have" sections or
//! tag every skill with an explicit level. Both shapes are reduced to a map
//! of skill name to [`SkillLevel`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Skill name → level bucket for one posting
pub type SkillMap = BTreeMap<String, SkillLevel>;

/// Experience keywords mapped to the bucket given to required skills,
/// checked in order
const EXPERIENCE_KEYWORDS: &[(&[&str], SkillLevel)] = &[
    (&["senior", "lead", "expert", "principal"], SkillLevel::Senior),
    (&["mid", "regular", "intermediate"], SkillLevel::Regular),
    (&["junior", "intern", "trainee", "entry"], SkillLevel::Junior),
];

/// Canonical skill proficiency bucket
///
/// Buckets are ordered by priority: `Master` is the greatest and
/// `NiceToHave` the least.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Master,
    Advanced,
    Senior,
    Regular,
    Junior,
    NiceToHave,
}

impl SkillLevel {
    /// Sort priority, higher is more demanding
    pub fn priority(&self) -> u8 {
        match self {
            Self::Master => 5,
            Self::Advanced => 4,
            Self::Senior => 3,
            Self::Regular => 2,
            Self::Junior => 1,
            Self::NiceToHave => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Advanced => "advanced",
            Self::Senior => "senior",
            Self::Regular => "regular",
            Self::Junior => "junior",
            Self::NiceToHave => "nice_to_have",
        }
    }

    /// Parses an explicit level label as published by flat skill lists
    ///
    /// Case, surrounding whitespace and space/hyphen separators are ignored,
    /// so "Nice To Have", "nice-to-have" and "nice_to_have" are equivalent.
    pub fn parse(label: &str) -> Option<Self> {
        let key: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();

        match key.as_str() {
            "master" => Some(Self::Master),
            "advanced" => Some(Self::Advanced),
            "senior" => Some(Self::Senior),
            "regular" => Some(Self::Regular),
            "junior" => Some(Self::Junior),
            "nice_to_have" => Some(Self::NiceToHave),
            _ => None,
        }
    }

    /// Derives the bucket for a required skill from a posting's experience
    /// level
    pub fn from_experience(experience_level: &str) -> Self {
        let lowered = experience_level.to_lowercase();
        EXPERIENCE_KEYWORDS
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(_, level)| *level)
            .unwrap_or(Self::Regular)
    }
}

impl Ord for SkillLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl PartialOrd for SkillLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Skills as pulled out of a detail page, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSkills {
    /// Names grouped into required and nice-to-have sections
    Sectioned {
        required: Vec<String>,
        nice_to_have: Vec<String>,
    },
    /// (name, level label) pairs
    Flat(Vec<(String, String)>),
}

impl RawSkills {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Sectioned {
                required,
                nice_to_have,
            } => required.is_empty() && nice_to_have.is_empty(),
            Self::Flat(items) => items.is_empty(),
        }
    }
}

/// Normalizes extracted skills into level buckets
///
/// Sectioned skills take their required bucket from `experience_level`;
/// nice-to-have skills are always [`SkillLevel::NiceToHave`]. Flat entries
/// whose label is not a known bucket are dropped.
pub fn normalize_skills(raw: RawSkills, experience_level: &str) -> SkillMap {
    let mut skills = SkillMap::new();

    match raw {
        RawSkills::Sectioned {
            required,
            nice_to_have,
        } => {
            let required_level = SkillLevel::from_experience(experience_level);
            for name in required {
                insert_named(&mut skills, &name, required_level);
            }
            for name in nice_to_have {
                insert_named(&mut skills, &name, SkillLevel::NiceToHave);
            }
        }
        RawSkills::Flat(items) => {
            for (name, label) in items {
                match SkillLevel::parse(&label) {
                    Some(level) => insert_named(&mut skills, &name, level),
                    None => {
                        tracing::debug!("Dropping skill {:?} with unknown level {:?}", name, label)
                    }
                }
            }
        }
    }

    skills
}

/// Orders skills for presentation: highest bucket first, then by name
pub fn sorted_skills(skills: &SkillMap) -> Vec<(&str, SkillLevel)> {
    let mut entries: Vec<(&str, SkillLevel)> = skills
        .iter()
        .map(|(name, level)| (name.as_str(), *level))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

fn insert_named(skills: &mut SkillMap, name: &str, level: SkillLevel) {
    let name = name.trim();
    if !name.is_empty() {
        skills.insert(name.to_string(), level);
    }
}
