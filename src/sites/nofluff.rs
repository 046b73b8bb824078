//! NoFluffJobs adapter

use super::{
    element_text, first_text, select_first, select_first_of, text_lines, ListingSelectors,
    SiteAdapter, SkillSections, SkillSelectors, SourceId,
};
use crate::storage::OperatingMode;
use scraper::Html;

const LOCATION_PINS: &[&str] = &[
    r#"span[data-cy="location_mobile_pin"]"#,
    r#"span[data-cy="location_pin"]"#,
];

const MODE_MARKERS: &[&str] = &[
    r#"div[data-cy="location_remote"]"#,
    r#"div[data-cy="location_mobile_remote"]"#,
    r#"span[data-cy="location_mobile_pin"]"#,
    r#"span[data-cy="location_pin"]"#,
];

const DESCRIPTION_SECTIONS: &[&str] = &[
    r#"section[data-cy-section="JobOffer_Requirements"]"#,
    r#"section[data-cy-section="JobOffer_Project"]"#,
    r#"section[data-cy-section="JobOffer_DailyTasks"]"#,
];

/// nofluffjobs.com, sectioned skills
pub struct NoFluffAdapter;

impl SiteAdapter for NoFluffAdapter {
    fn source(&self) -> SourceId {
        SourceId::NoFluffJobs
    }

    fn base_url(&self) -> &'static str {
        "https://nofluffjobs.com"
    }

    fn default_seeds(&self) -> &'static [&'static str] {
        &["https://nofluffjobs.com/pl/Python?sort=newest"]
    }

    fn listing_selectors(&self) -> ListingSelectors {
        ListingSelectors {
            container: "div.list-container",
            item: "a.posting-list-item",
            title: r#"h3[data-cy="title position on the job offer listing"]"#,
        }
    }

    fn extract_company(&self, page: &Html) -> String {
        select_first_of(
            page.root_element(),
            &["p.d-flex.align-items-center.mb-0", "a#postingCompanyUrl"],
        )
        .map(element_text)
        .unwrap_or_default()
    }

    /// City from the location pin; remote and hybrid pins carry no city
    fn extract_location(&self, page: &Html) -> String {
        let Some(pin) = select_first_of(page.root_element(), LOCATION_PINS) else {
            return String::new();
        };
        let text = element_text(pin);
        let city = text.split('+').next().unwrap_or_default().trim();
        if city.contains("Hybrydowo") || city.contains("Praca zdalna") {
            String::new()
        } else {
            city.to_string()
        }
    }

    fn extract_operating_mode(&self, page: &Html) -> OperatingMode {
        select_first_of(page.root_element(), MODE_MARKERS)
            .map(|marker| OperatingMode::classify(&element_text(marker)))
            .unwrap_or(OperatingMode::Unknown)
    }

    fn extract_experience_level(&self, page: &Html) -> String {
        first_text(page, "#posting-seniority span")
    }

    fn extract_salary(&self, page: &Html) -> String {
        first_text(page, "div.salary > h4.tw-mb-0").replace('\u{2013}', "-")
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
            container: Some("#posting-requirements"),
            sections: SkillSections::Fixed {
                required: r#"section[branch="musts"]"#,
                nice_to_have: "section#posting-nice-to-have",
            },
            item: "li",
            name: None,
            level: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::RawSkills;
    use crate::sites::{extract_details, test_support::assert_selectors_parse};

    const DETAIL: &str = r#"
        <html><body>
          <h1>Python Developer</h1>
          <p class="d-flex align-items-center mb-0"> Acme Software </p>
          <span data-cy="location_pin">Warszawa +2</span>
          <div data-cy="location_remote">Praca zdalna</div>
          <div id="posting-seniority"><span>Mid</span></div>
          <div class="salary"><h4 class="tw-mb-0">12 000 – 18 000 PLN</h4></div>
          <section data-cy-section="JobOffer_Requirements"><p>Python 3</p><p>SQL</p></section>
          <section data-cy-section="JobOffer_DailyTasks"><ul><li>Write code</li></ul></section>
          <div id="posting-requirements">
            <section branch="musts"><ul><li><span>Python</span></li><li>Django</li></ul></section>
            <section id="posting-nice-to-have"><ul><li><span>Docker</span></li></ul></section>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_selectors_parse() {
        let mut extra = LOCATION_PINS.to_vec();
        extra.extend_from_slice(MODE_MARKERS);
        extra.extend_from_slice(DESCRIPTION_SECTIONS);
        assert_selectors_parse(&NoFluffAdapter, &extra);
    }

    #[test]
    fn test_extract_details() {
        let page = Html::parse_document(DETAIL);
        let details = extract_details(&NoFluffAdapter, &page);

        assert_eq!(details.company, "Acme Software");
        assert_eq!(details.location, "Warszawa");
        assert_eq!(details.operating_mode, OperatingMode::Remote);
        assert_eq!(details.experience_level, "Mid");
        assert_eq!(details.salary, "12 000 - 18 000 PLN");
        assert_eq!(details.description, "Python 3\nSQL\n\nWrite code");
        assert_eq!(
            details.skills,
            RawSkills::Sectioned {
                required: vec!["Python".to_string(), "Django".to_string()],
                nice_to_have: vec!["Docker".to_string()],
            }
        );
    }

    #[test]
    fn test_remote_pin_has_no_city() {
        let page = Html::parse_document(
            r#"<span data-cy="location_mobile_pin">Praca zdalna</span>"#,
        );
        assert_eq!(NoFluffAdapter.extract_location(&page), "");
        assert_eq!(
            NoFluffAdapter.extract_operating_mode(&page),
            OperatingMode::Remote
        );
    }

    #[test]
    fn test_company_fallback() {
        let page = Html::parse_document(r#"<a id="postingCompanyUrl"> Beta Labs </a>"#);
        assert_eq!(NoFluffAdapter.extract_company(&page), "Beta Labs");
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let page = Html::parse_document("<html><body><p>gone</p></body></html>");
        let details = extract_details(&NoFluffAdapter, &page);

        assert_eq!(details.company, "");
        assert_eq!(details.salary, "");
        assert_eq!(details.operating_mode, OperatingMode::Unknown);
        assert!(details.skills.is_empty());
    }
}
