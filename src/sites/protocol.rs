//! theprotocol.it adapter

use super::{
    element_text, experience_label, first_text, select_first, text_lines, ListingSelectors,
    SiteAdapter, SkillSections, SkillSelectors, SourceId,
};
use crate::storage::OperatingMode;
use scraper::Html;

const WORK_MODES: &str = r#"div[data-test="section-workModes"] div.r4179ok.bldcnq5.ihmj1ec"#;
const POSITION_LEVELS: &str =
    r#"div[data-test="section-positionLevels"] div.r4179ok.bldcnq5.ihmj1ec"#;
const DESCRIPTION_SECTIONS: &[&str] = &["div#TECHNOLOGY_AND_POSITION", "div#ABOUT_US"];

/// theprotocol.it, skills grouped under headed sections
pub struct ProtocolAdapter;

impl SiteAdapter for ProtocolAdapter {
    fn source(&self) -> SourceId {
        SourceId::TheProtocol
    }

    fn base_url(&self) -> &'static str {
        "https://theprotocol.it"
    }

    fn default_seeds(&self) -> &'static [&'static str] {
        &["https://theprotocol.it/filtry/python;t"]
    }

    fn listing_selectors(&self) -> ListingSelectors {
        ListingSelectors {
            container: r#"div[data-test="offersList"]"#,
            item: r#"a[data-test="list-item-offer"]"#,
            title: "h2#offer-title",
        }
    }

    fn extract_company(&self, page: &Html) -> String {
        first_text(page, r#"h2[data-test="text-offerEmployer"]"#)
    }

    fn extract_location(&self, page: &Html) -> String {
        first_text(page, r#"div[data-test="text-workplaceAddress"]"#)
    }

    fn extract_operating_mode(&self, page: &Html) -> OperatingMode {
        OperatingMode::classify(&first_text(page, WORK_MODES))
    }

    /// Any listed level outside the known vocabulary is a management role
    fn extract_experience_level(&self, page: &Html) -> String {
        let Some(level) = select_first(page.root_element(), POSITION_LEVELS) else {
            return String::new();
        };
        experience_label(&element_text(level))
            .unwrap_or("Manager")
            .to_string()
    }

    fn extract_salary(&self, page: &Html) -> String {
        let text = first_text(page, r#"p[data-test="text-contractSalary"]"#);
        let amount = text.split("zł").next().unwrap_or_default().trim();
        if amount.is_empty() {
            return String::new();
        }

        let bounds: Vec<&str> = amount
            .split(|c: char| c == '-' || c == '\u{2013}')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        match bounds.as_slice() {
            [min, max] => format!("{} - {} PLN", min, max),
            _ => format!("{} PLN", amount),
        }
    }

    fn extract_description(&self, page: &Html) -> String {
        DESCRIPTION_SECTIONS
            .iter()
            .filter_map(|css| select_first(page.root_element(), css))
            .map(text_lines)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn skill_selectors(&self) -> SkillSelectors {
        SkillSelectors {
            container: Some(r#"div[data-test="section-technologies"]"#),
            sections: SkillSections::Headed {
                section: "div.c1fj2x2p",
                heading: "h3",
                required_keywords: &["expected", "wymagane"],
            },
            item: r#"div[data-test="chip-technology"]"#,
            name: Some("span.l1sjc53z"),
            level: None,
        }
    }
}
