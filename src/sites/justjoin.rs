//! JustJoinIT adapter
//!
//! The listing is rendered client side, so its container only appears in a
//! browser-fetched page.

use super::{
    element_text, experience_label, select_all, select_first, text_lines, ListingSelectors,
    SiteAdapter, SkillSections, SkillSelectors, SourceId,
};
use crate::config::FetcherKind;
use crate::storage::OperatingMode;
use scraper::Html;

const HEADER: &str = "div.css-yd5zxy";
const BADGES: &str = "div.css-snbmy4";
const SALARY: &str = "span.css-1pavfqb";

/// Position of the work-mode badge among the header badges
const WORK_MODE_BADGE: usize = 3;

/// justjoin.it, flat skill list with explicit levels
pub struct JustJoinAdapter;

impl SiteAdapter for JustJoinAdapter {
    fn source(&self) -> SourceId {
        SourceId::JustJoinIt
    }

    fn base_url(&self) -> &'static str {
        "https://justjoin.it"
    }

    fn default_seeds(&self) -> &'static [&'static str] {
        &["https://justjoin.it/job-offers/all-locations/python?experience-level=junior"]
    }

    fn default_fetcher(&self) -> FetcherKind {
        FetcherKind::Browser
    }

    fn listing_selectors(&self) -> ListingSelectors {
        ListingSelectors {
            container: r#"div[data-test-id="virtuoso-item-list"]"#,
            item: "div[data-index]",
            title: "h3",
        }
    }

    fn extract_company(&self, page: &Html) -> String {
        select_first(page.root_element(), HEADER)
            .and_then(|header| select_first(header, "h2"))
            .map(element_text)
            .unwrap_or_default()
    }

    fn extract_location(&self, page: &Html) -> String {
        select_first(page.root_element(), HEADER)
            .and_then(|header| select_first(header, "span.css-1o4wo1x"))
            .map(element_text)
            .unwrap_or_default()
    }

    fn extract_operating_mode(&self, page: &Html) -> OperatingMode {
        select_all(page.root_element(), BADGES)
            .get(WORK_MODE_BADGE)
            .map(|badge| OperatingMode::classify(&element_text(*badge)))
            .unwrap_or(OperatingMode::Unknown)
    }

    /// First header badge naming a seniority
    fn extract_experience_level(&self, page: &Html) -> String {
        select_all(page.root_element(), BADGES)
            .into_iter()
            .find_map(|badge| experience_label(&element_text(badge)))
            .unwrap_or_default()
            .to_string()
    }

    /// Bounds come from the first two nested spans, the currency from the
    /// last word of the salary text
    fn extract_salary(&self, page: &Html) -> String {
        let Some(salary) = select_first(page.root_element(), SALARY) else {
            return String::new();
        };
        let text = element_text(salary);
        let bounds: Vec<String> = select_all(salary, "span")
            .into_iter()
            .filter(|span| span.id() != salary.id())
            .map(element_text)
            .filter(|bound| !bound.is_empty())
            .collect();

        match (bounds.as_slice(), text.split_whitespace().last()) {
            ([min, max, ..], Some(currency)) => format!("{} - {} {}", min, max, currency),
            _ => text,
        }
    }

    fn extract_description(&self, page: &Html) -> String {
        select_first(page.root_element(), "div.css-r1n8l8")
            .map(text_lines)
            .unwrap_or_default()
    }

    fn skill_selectors(&self) -> SkillSelectors {
        SkillSelectors {
            container: None,
            sections: SkillSections::Flat,
            item: "div.css-jfr3nf",
            name: Some("h4"),
            level: Some("span"),
        }
    }
}
