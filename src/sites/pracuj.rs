//! Pracuj.pl adapter

use super::{
    element_text, experience_label, first_text, resolve_link, select_all, select_first,
    ListingSelectors, SiteAdapter, SkillSections, SkillSelectors, SourceId,
};
use crate::storage::OperatingMode;
use scraper::{ElementRef, Html};
use url::Url;

const WORKPLACE: &str =
    r#"li[data-test="sections-benefit-workplaces"] div[data-test="offer-badge-description"]"#;
const WORK_MODES: &str = r#"li[data-scroll-id="work-modes"] div[data-test="offer-badge-title"]"#;
const POSITION_LEVELS: &str =
    r#"li[data-scroll-id="position-levels"] div[data-test="offer-badge-title"]"#;
const PROJECT_ITEMS: &str = r#"section[data-test="section-about-project"] li.t6laip8"#;
const DUTY_ITEMS: &str = "li.tkzmjn3";

/// it.pracuj.pl, sectioned skills
pub struct PracujAdapter;

impl SiteAdapter for PracujAdapter {
    fn source(&self) -> SourceId {
        SourceId::Pracuj
    }

    fn base_url(&self) -> &'static str {
        "https://www.pracuj.pl"
    }

    fn default_seeds(&self) -> &'static [&'static str] {
        &["https://it.pracuj.pl/praca?et=17&itth=37"]
    }

    fn listing_selectors(&self) -> ListingSelectors {
        ListingSelectors {
            container: r#"div[data-test="section-offers"]"#,
            item: r#"div[data-test="default-offer"][data-test-location="single"]"#,
            title: "a.tiles_o1859gd9",
        }
    }

    /// Offer tiles carry several anchors; only the offer link leads to the detail page
    fn extract_detail_link(&self, item: ElementRef<'_>, page_url: &Url) -> Option<Url> {
        let href = select_first(item, r#"a[data-test="link-offer"]"#)?
            .value()
            .attr("href")?;
        resolve_link(page_url, href)
    }

    /// Employer name without the legal-form suffix ("Sp. z o.o.")
    fn extract_company(&self, page: &Html) -> String {
        let text = first_text(page, r#"h2[data-test="text-employerName"]"#);
        text.split("Sp.").next().unwrap_or_default().trim().to_string()
    }

    fn extract_location(&self, page: &Html) -> String {
        let text = first_text(page, WORKPLACE);
        text.split(',').next().unwrap_or_default().trim().to_string()
    }

    fn extract_operating_mode(&self, page: &Html) -> OperatingMode {
        OperatingMode::classify(&first_text(page, WORK_MODES))
    }

    fn extract_experience_level(&self, page: &Html) -> String {
        experience_label(&first_text(page, POSITION_LEVELS))
            .unwrap_or_default()
            .to_string()
    }

    fn extract_salary(&self, page: &Html) -> String {
        let text = first_text(page, r#"div[data-test="text-earningAmount"]"#);
        let amount = text.split("zł").next().unwrap_or_default().trim();
        if amount.is_empty() {
            return String::new();
        }

        match amount.split_once('\u{2013}') {
            Some((min, max)) => format!("{} - {} PLN", min.trim(), max.trim()),
            None => format!("{} PLN", amount),
        }
    }

    fn extract_description(&self, page: &Html) -> String {
        let root = page.root_element();
        let project: Vec<String> = select_all(root, PROJECT_ITEMS)
            .into_iter()
            .map(element_text)
            .collect();
        let duties: Vec<String> = select_all(root, DUTY_ITEMS)
            .into_iter()
            .map(element_text)
            .collect();

        [project.join("\n"), duties.join("\n")]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn skill_selectors(&self) -> SkillSelectors {
        SkillSelectors {
            container: Some(r#"section[data-test="section-technologies"]"#),
            sections: SkillSections::Fixed {
                required: r#"div[data-test="section-technologies-expected"]"#,
                nice_to_have: r#"div[data-test="section-technologies-optional"]"#,
            },
            item: "li.catru5k",
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

    const LISTING: &str = r#"
        <div data-test="section-offers">
          <div data-test="default-offer" data-test-location="single">
            <a class="tiles_o1859gd9" href="https://it.pracuj.pl/firma">Python Developer</a>
            <a data-test="link-offer" href="https://www.pracuj.pl/praca/python-developer,oferta,100">Offer</a>
          </div>
        </div>
    "#;

    const DETAIL: &str = r#"
        <html><body>
          <h2 data-test="text-employerName">Kappa Systems Sp. z o.o.</h2>
          <ul>
            <li data-test="sections-benefit-workplaces"><div data-test="offer-badge-description">Poznań, Wilda</div></li>
            <li data-scroll-id="work-modes"><div data-test="offer-badge-title">praca stacjonarna</div></li>
            <li data-scroll-id="position-levels"><div data-test="offer-badge-title">Junior</div></li>
          </ul>
          <div data-test="text-earningAmount">8 000–11 000 zł brutto / mies.</div>
          <section data-test="section-about-project"><ul><li class="t6laip8">Data platform</li></ul></section>
          <ul><li class="tkzmjn3">Maintain ETL jobs</li><li class="tkzmjn3">Review code</li></ul>
          <section data-test="section-technologies">
            <div data-test="section-technologies-expected"><ul><li class="catru5k">Python</li></ul></div>
            <div data-test="section-technologies-optional"><ul><li class="catru5k">Airflow</li></ul></div>
          </section>
        </body></html>
    "#;

    #[test]
    fn test_selectors_parse() {
        assert_selectors_parse(
            &PracujAdapter,
            &[WORKPLACE, WORK_MODES, POSITION_LEVELS, PROJECT_ITEMS, DUTY_ITEMS],
        );
    }

    #[test]
    fn test_detail_link_uses_offer_anchor() {
        let page = Html::parse_document(LISTING);
        let page_url = Url::parse("https://it.pracuj.pl/praca?et=17").unwrap();
        let item = select_first(
            page.root_element(),
            PracujAdapter.listing_selectors().item,
        )
        .unwrap();

        let link = PracujAdapter.extract_detail_link(item, &page_url).unwrap();
        assert_eq!(
            link.as_str(),
            "https://www.pracuj.pl/praca/python-developer,oferta,100"
        );
    }

    #[test]
    fn test_extract_details() {
        let page = Html::parse_document(DETAIL);
        let details = extract_details(&PracujAdapter, &page);

        assert_eq!(details.company, "Kappa Systems");
        assert_eq!(details.location, "Poznań");
        assert_eq!(details.operating_mode, OperatingMode::Office);
        assert_eq!(details.experience_level, "Junior");
        assert_eq!(details.salary, "8 000 - 11 000 PLN");
        assert_eq!(
            details.description,
            "Data platform\nMaintain ETL jobs\nReview code"
        );
        assert_eq!(
            details.skills,
            RawSkills::Sectioned {
                required: vec!["Python".to_string()],
                nice_to_have: vec!["Airflow".to_string()],
            }
        );
    }
}
