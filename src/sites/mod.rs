//! Job-board site adapters
//!
//! Every supported board is described by a [`SiteAdapter`]: where its listing
//! pages live, how to find posting candidates on them, and how to pull each
//! field out of a posting's detail page. The crawler only talks to this trait
//! and never branches on which board it is crawling.

mod justjoin;
mod nofluff;
mod protocol;
mod pracuj;

pub use justjoin::JustJoinAdapter;
pub use nofluff::NoFluffAdapter;
pub use protocol::ProtocolAdapter;
pub use pracuj::PracujAdapter;

use crate::config::FetcherKind;
use crate::normalize::RawSkills;
use crate::storage::OperatingMode;
use crate::{ConfigError, HarvestError, Result};
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// Identifier of a supported job board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    NoFluffJobs,
    TheProtocol,
    Pracuj,
    JustJoinIt,
}

impl SourceId {
    /// Identifier used in configuration files and stored postings
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoFluffJobs => "nofluffjobs",
            Self::TheProtocol => "theprotocol",
            Self::Pracuj => "pracuj",
            Self::JustJoinIt => "justjoinit",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::NoFluffJobs => "NoFluffJobs",
            Self::TheProtocol => "TheProtocol",
            Self::Pracuj => "Pracuj.pl",
            Self::JustJoinIt => "JustJoinIt",
        }
    }

    pub fn all() -> &'static [SourceId] {
        &[
            Self::NoFluffJobs,
            Self::TheProtocol,
            Self::Pracuj,
            Self::JustJoinIt,
        ]
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == key || id.display_name().to_lowercase() == key)
            .ok_or_else(|| ConfigError::UnknownSource(s.to_string()))
    }
}

/// Returns the adapter implementing a source
pub fn adapter_for(source: SourceId) -> Arc<dyn SiteAdapter> {
    match source {
        SourceId::NoFluffJobs => Arc::new(NoFluffAdapter),
        SourceId::TheProtocol => Arc::new(ProtocolAdapter),
        SourceId::Pracuj => Arc::new(PracujAdapter),
        SourceId::JustJoinIt => Arc::new(JustJoinAdapter),
    }
}

/// Where posting candidates live on a listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingSelectors {
    /// Element(s) wrapping the result list; absent means the page did not render
    pub container: &'static str,
    /// One posting candidate inside the container
    pub item: &'static str,
    /// Title element inside an item
    pub title: &'static str,
}

/// How skills are grouped on a detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillSections {
    /// Fixed required and nice-to-have section selectors
    Fixed {
        required: &'static str,
        nice_to_have: &'static str,
    },
    /// Repeated sections told apart by their heading: a heading containing any
    /// of `required_keywords` holds required skills, any other heading holds
    /// nice-to-have skills
    Headed {
        section: &'static str,
        heading: &'static str,
        required_keywords: &'static [&'static str],
    },
    /// One list whose items carry their own level
    Flat,
}

/// Where skills live on a detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillSelectors {
    /// Element wrapping all skills; the whole page when `None`
    pub container: Option<&'static str>,
    pub sections: SkillSections,
    pub item: &'static str,
    /// Name element inside an item; the item's own text when `None`
    pub name: Option<&'static str>,
    /// Level element inside an item, flat lists only
    pub level: Option<&'static str>,
}

/// Everything extracted from one detail page, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct PostingDetails {
    pub company: String,
    pub location: String,
    pub operating_mode: OperatingMode,
    pub experience_level: String,
    pub salary: String,
    pub description: String,
    pub skills: RawSkills,
}

/// Capability set of one job board
///
/// Field extractors are infallible: a missing element yields an empty string
/// (or [`OperatingMode::Unknown`]) rather than an error.
pub trait SiteAdapter: Send + Sync {
    fn source(&self) -> SourceId;

    /// Home page of the board; its host and subdomains belong to the board
    fn base_url(&self) -> &'static str;

    /// Listing pages crawled when the configuration names no seeds
    fn default_seeds(&self) -> &'static [&'static str];

    /// Transport needed to see the listing container
    fn default_fetcher(&self) -> FetcherKind {
        FetcherKind::Http
    }

    fn listing_selectors(&self) -> ListingSelectors;

    /// Resolves the detail-page link of a listing item against the page URL
    ///
    /// Uses the item's own `href` when it is an anchor, otherwise the first
    /// descendant anchor.
    fn extract_detail_link(&self, item: ElementRef<'_>, page_url: &Url) -> Option<Url> {
        let href = match item.value().attr("href") {
            Some(href) => Some(href),
            None => select_first(item, "a[href]").and_then(|a| a.value().attr("href")),
        }?;
        resolve_link(page_url, href)
    }

    fn extract_company(&self, page: &Html) -> String;

    fn extract_location(&self, page: &Html) -> String;

    fn extract_operating_mode(&self, page: &Html) -> OperatingMode;

    fn extract_experience_level(&self, page: &Html) -> String;

    fn extract_salary(&self, page: &Html) -> String;

    fn extract_description(&self, page: &Html) -> String;

    fn skill_selectors(&self) -> SkillSelectors;

    fn has_skill_sections(&self) -> bool {
        !matches!(self.skill_selectors().sections, SkillSections::Flat)
    }

    fn extract_skill_name(&self, item: ElementRef<'_>) -> String {
        match self.skill_selectors().name {
            Some(css) => select_first(item, css).map(element_text).unwrap_or_default(),
            None => element_text(item),
        }
    }

    fn extract_skill_level(&self, item: ElementRef<'_>) -> String {
        self.skill_selectors()
            .level
            .and_then(|css| select_first(item, css))
            .map(element_text)
            .unwrap_or_default()
    }

    fn extract_skills(&self, page: &Html) -> RawSkills {
        extract_skills_with(self, page)
    }
}

/// Returns true when `url` is on the adapter's board, subdomains included
pub fn is_board_url(adapter: &dyn SiteAdapter, url: &Url) -> bool {
    let Some(board) = Url::parse(adapter.base_url())
        .ok()
        .and_then(|base| base.host_str().map(str::to_string))
    else {
        return false;
    };
    let board = board.trim_start_matches("www.");

    url.host_str()
        .is_some_and(|host| host == board || host.ends_with(&format!(".{}", board)))
}

/// Runs every field extractor of an adapter over a detail page
pub fn extract_details(adapter: &dyn SiteAdapter, page: &Html) -> PostingDetails {
    PostingDetails {
        company: adapter.extract_company(page),
        location: adapter.extract_location(page),
        operating_mode: adapter.extract_operating_mode(page),
        experience_level: adapter.extract_experience_level(page),
        salary: adapter.extract_salary(page),
        description: adapter.extract_description(page),
        skills: adapter.extract_skills(page),
    }
}

fn extract_skills_with<A: SiteAdapter + ?Sized>(adapter: &A, page: &Html) -> RawSkills {
    let selectors = adapter.skill_selectors();
    let empty = if adapter.has_skill_sections() {
        RawSkills::Sectioned {
            required: Vec::new(),
            nice_to_have: Vec::new(),
        }
    } else {
        RawSkills::Flat(Vec::new())
    };

    let container = match selectors.container {
        Some(css) => match select_first(page.root_element(), css) {
            Some(container) => container,
            None => return empty,
        },
        None => page.root_element(),
    };

    let names_in = |section: ElementRef<'_>| -> Vec<String> {
        select_all(section, selectors.item)
            .into_iter()
            .map(|item| adapter.extract_skill_name(item))
            .filter(|name| !name.is_empty())
            .collect()
    };

    match selectors.sections {
        SkillSections::Fixed {
            required,
            nice_to_have,
        } => RawSkills::Sectioned {
            required: select_first(container, required)
                .map(names_in)
                .unwrap_or_default(),
            nice_to_have: select_first(container, nice_to_have)
                .map(names_in)
                .unwrap_or_default(),
        },
        SkillSections::Headed {
            section,
            heading,
            required_keywords,
        } => {
            let mut required = Vec::new();
            let mut nice_to_have = Vec::new();
            for block in select_all(container, section) {
                let Some(title) = select_first(block, heading) else {
                    continue;
                };
                let title = element_text(title).to_lowercase();
                if required_keywords.iter().any(|k| title.contains(k)) {
                    required.extend(names_in(block));
                } else {
                    nice_to_have.extend(names_in(block));
                }
            }
            RawSkills::Sectioned {
                required,
                nice_to_have,
            }
        }
        SkillSections::Flat => RawSkills::Flat(
            select_all(container, selectors.item)
                .into_iter()
                .map(|item| {
                    (
                        adapter.extract_skill_name(item),
                        adapter.extract_skill_level(item),
                    )
                })
                .filter(|(name, _)| !name.is_empty())
                .collect(),
        ),
    }
}

/// Parses a CSS selector
pub fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| HarvestError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

fn checked_selector(css: &str) -> Option<Selector> {
    match parse_selector(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("{}", e);
            None
        }
    }
}

/// First descendant of `scope` matching `css`
pub fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = checked_selector(css)?;
    let found = scope.select(&selector).next();
    found
}

/// All descendants of `scope` matching `css`, in document order
pub fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    let Some(selector) = checked_selector(css) else {
        return Vec::new();
    };
    let found: Vec<_> = scope.select(&selector).collect();
    found
}

/// Text content with whitespace runs collapsed to single spaces
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First descendant of `scope` matching any of `candidates`, tried in order
pub fn select_first_of<'a>(scope: ElementRef<'a>, candidates: &[&str]) -> Option<ElementRef<'a>> {
    candidates.iter().find_map(|css| select_first(scope, css))
}

/// Maps board seniority text onto the experience vocabulary
///
/// Checked from least to most senior so "Junior / Mid" reads as Junior.
pub fn experience_label(text: &str) -> Option<&'static str> {
    const LABELS: &[(&[&str], &str)] = &[
        (&["trainee", "internship", "assistant", "asystent", "praktykant", "stażyst"], "Trainee"),
        (&["junior"], "Junior"),
        (&["mid"], "Mid"),
        (&["regular"], "Regular"),
        (&["senior"], "Senior"),
        (&["expert", "ekspert"], "Expert"),
        (&["manager", "kierownik", "lead", "director", "dyrektor"], "Manager"),
    ];

    let lowered = text.to_lowercase();
    LABELS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, label)| *label)
}

/// Text of the first element on the page matching `css`, empty if absent
pub fn first_text(page: &Html, css: &str) -> String {
    select_first(page.root_element(), css)
        .map(element_text)
        .unwrap_or_default()
}

/// Text content as non-empty trimmed lines, one per text node
pub fn text_lines(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Joins `href` onto the page it was found on
pub fn resolve_link(page_url: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match page_url.join(href) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(url) => {
            tracing::debug!("Ignoring non-http link {}", url);
            None
        }
        Err(e) => {
            tracing::debug!("Unresolvable link {:?}: {}", href, e);
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_parse() {
        assert_eq!("nofluffjobs".parse::<SourceId>().unwrap(), SourceId::NoFluffJobs);
        assert_eq!("Pracuj.pl".parse::<SourceId>().unwrap(), SourceId::Pracuj);
        assert_eq!(" JustJoinIt ".parse::<SourceId>().unwrap(), SourceId::JustJoinIt);
        assert!(matches!(
            "monster".parse::<SourceId>(),
            Err(ConfigError::UnknownSource(_))
        ));
    }

    #[test]
    fn test_adapter_for_matches_source() {
        for source in SourceId::all() {
            let adapter = adapter_for(*source);
            assert_eq!(adapter.source(), *source);
            assert!(!adapter.default_seeds().is_empty());
        }
    }

    #[test]
    fn test_is_board_url() {
        let url = |raw: &str| Url::parse(raw).unwrap();
        let pracuj = adapter_for(SourceId::Pracuj);
        assert!(is_board_url(pracuj.as_ref(), &url("https://it.pracuj.pl/praca?et=17")));
        assert!(is_board_url(pracuj.as_ref(), &url("https://www.pracuj.pl/praca/x,oferta,1")));
        assert!(!is_board_url(pracuj.as_ref(), &url("https://notpracuj.pl/praca")));

        for id in SourceId::all() {
            let adapter = adapter_for(*id);
            for seed in adapter.default_seeds() {
                assert!(is_board_url(adapter.as_ref(), &url(seed)), "{} seed {}", id, seed);
            }
            assert!(!is_board_url(adapter.as_ref(), &url("http://127.0.0.1:8080/jobs")));
        }
    }

    #[test]
    fn test_element_text_collapses_whitespace() {
        let html = Html::parse_fragment("<p>  Senior \n  Python\tDeveloper </p>");
        let p = select_first(html.root_element(), "p").unwrap();
        assert_eq!(element_text(p), "Senior Python Developer");
    }

    #[test]
    fn test_text_lines() {
        let html = Html::parse_fragment("<div><p> First </p>\n<ul><li>Second</li></ul></div>");
        let div = select_first(html.root_element(), "div").unwrap();
        assert_eq!(text_lines(div), "First\nSecond");
    }

    #[test]
    fn test_invalid_selector_yields_nothing() {
        let html = Html::parse_fragment("<p>x</p>");
        assert!(select_first(html.root_element(), "p[").is_none());
        assert!(matches!(
            parse_selector("p["),
            Err(HarvestError::Selector { .. })
        ));
    }

    #[test]
    fn test_experience_label() {
        assert_eq!(experience_label("junior"), Some("Junior"));
        assert_eq!(experience_label("Mid / Regular"), Some("Mid"));
        assert_eq!(experience_label("senior specialist (Senior)"), Some("Senior"));
        assert_eq!(experience_label("praktykant / stażysta"), Some("Trainee"));
        assert_eq!(experience_label("Team Manager"), Some("Manager"));
        assert_eq!(experience_label("Any"), None);
    }

    #[test]
    fn test_select_first_of_falls_back() {
        let html = Html::parse_fragment(r#"<a id="company">Acme</a>"#);
        let found = select_first_of(html.root_element(), &["p.company", "a#company"]).unwrap();
        assert_eq!(element_text(found), "Acme");
        assert!(select_first_of(html.root_element(), &["p", "span"]).is_none());
    }

    #[test]
    fn test_resolve_link() {
        let page = Url::parse("https://example.com/jobs/list?page=1").unwrap();
        assert_eq!(
            resolve_link(&page, "/job/1").unwrap().as_str(),
            "https://example.com/job/1"
        );
        assert_eq!(
            resolve_link(&page, "https://other.example/job/2").unwrap().as_str(),
            "https://other.example/job/2"
        );
        assert!(resolve_link(&page, "  ").is_none());
        assert!(resolve_link(&page, "mailto:hr@example.com").is_none());
    }
}
