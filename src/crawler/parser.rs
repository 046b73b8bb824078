//! Listing-page parser
//!
//! This module turns a fetched listing page into posting candidates:
//! - Locating the listing container(s) a board renders results into
//! - Pulling a title and a resolved detail link out of every item
//! - Merging candidates from several seed pages by title
//!
//! Parsing is synchronous; the parsed document never crosses an await.

use crate::sites::{element_text, parse_selector, select_all, select_first, SiteAdapter};
use crate::url::strip_tracking_params;
use scraper::Html;
use std::collections::HashSet;
use url::Url;

/// A posting found on a listing page, not yet fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Title as shown on the listing
    pub title: String,

    /// Detail-page URL with tracking parameters stripped
    pub url: Url,
}

/// Extracts candidates from one listing page
///
/// # Returns
///
/// * `None` - The listing container is not on the page (not rendered, or the
///   board changed its markup)
/// * `Some(candidates)` - Items in document order; items without a title or a
///   usable link are skipped. May be empty.
///
/// # Example
///
/// ```
/// use jobharvest::crawler::extract_candidates;
/// use jobharvest::sites::{adapter_for, SourceId};
/// use url::Url;
///
/// let html = r#"<div data-test="offersList">
///     <a data-test="list-item-offer" href="/szczegoly/praca/dev,oferta,1">
///         <h2 id="offer-title">Rust Developer</h2>
///     </a>
/// </div>"#;
/// let page = Url::parse("https://theprotocol.it/filtry/rust;t").unwrap();
/// let adapter = adapter_for(SourceId::TheProtocol);
///
/// let candidates = extract_candidates(html, adapter.as_ref(), &page).unwrap();
/// assert_eq!(candidates[0].title, "Rust Developer");
/// assert_eq!(
///     candidates[0].url.as_str(),
///     "https://theprotocol.it/szczegoly/praca/dev,oferta,1"
/// );
/// ```
pub fn extract_candidates(
    html: &str,
    adapter: &dyn SiteAdapter,
    page_url: &Url,
) -> Option<Vec<Candidate>> {
    let selectors = adapter.listing_selectors();
    let container_selector = match parse_selector(selectors.container) {
        Ok(selector) => selector,
        Err(e) => {
            tracing::warn!("{}", e);
            return None;
        }
    };

    let document = Html::parse_document(html);
    let containers: Vec<_> = document.select(&container_selector).collect();
    if containers.is_empty() {
        return None;
    }

    let mut candidates = Vec::new();
    for container in containers {
        for item in select_all(container, selectors.item) {
            let Some(title) = select_first(item, selectors.title)
                .map(element_text)
                .filter(|t| !t.is_empty())
            else {
                tracing::debug!("Skipping listing item without title on {}", page_url);
                continue;
            };

            let Some(link) = adapter.extract_detail_link(item, page_url) else {
                tracing::debug!("Skipping {:?}: no detail link on {}", title, page_url);
                continue;
            };

            candidates.push(Candidate {
                title,
                url: strip_tracking_params(&link),
            });
        }
    }

    Some(candidates)
}

/// Appends `incoming` to `merged`, keeping the first candidate per title
///
/// # Returns
///
/// Number of candidates added
pub fn merge_candidates(merged: &mut Vec<Candidate>, incoming: Vec<Candidate>) -> usize {
    let mut seen: HashSet<String> = merged.iter().map(|c| c.title.clone()).collect();
    let before = merged.len();

    for candidate in incoming {
        if seen.insert(candidate.title.clone()) {
            merged.push(candidate);
        }
    }

    merged.len() - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::{adapter_for, SourceId};

    fn page() -> Url {
        Url::parse("https://nofluffjobs.com/pl/Python?sort=newest").unwrap()
    }

    fn nofluff_listing(items: &str) -> String {
        format!(
            r#"<html><body><div class="list-container">{}</div></body></html>"#,
            items
        )
    }

    fn nofluff_item(href: &str, title: &str) -> String {
        format!(
            r#"<a class="posting-list-item" href="{}">
                 <h3 data-cy="title position on the job offer listing"> {} </h3>
               </a>"#,
            href, title
        )
    }

    fn candidate(title: &str, url: &str) -> Candidate {
        Candidate {
            title: title.to_string(),
            url: Url::parse(url).unwrap(),
        }
    }

    #[test]
    fn test_missing_container_is_none() {
        let adapter = adapter_for(SourceId::NoFluffJobs);
        let html = "<html><body><p>Loading…</p></body></html>";
        assert!(extract_candidates(html, adapter.as_ref(), &page()).is_none());
    }

    #[test]
    fn test_empty_container_is_empty_list() {
        let adapter = adapter_for(SourceId::NoFluffJobs);
        let html = nofluff_listing("");
        assert_eq!(
            extract_candidates(&html, adapter.as_ref(), &page()),
            Some(Vec::new())
        );
    }

    #[test]
    fn test_extracts_title_and_resolved_link() {
        let adapter = adapter_for(SourceId::NoFluffJobs);
        let html = nofluff_listing(&format!(
            "{}{}",
            nofluff_item("/pl/job/python-dev-acme?utm_source=list", "Python Developer"),
            nofluff_item("https://nofluffjobs.com/pl/job/data-eng-beta#x", "Data Engineer"),
        ));

        let candidates = extract_candidates(&html, adapter.as_ref(), &page()).unwrap();
        assert_eq!(
            candidates,
            vec![
                candidate(
                    "Python Developer",
                    "https://nofluffjobs.com/pl/job/python-dev-acme"
                ),
                candidate(
                    "Data Engineer",
                    "https://nofluffjobs.com/pl/job/data-eng-beta"
                ),
            ]
        );
    }

    #[test]
    fn test_items_without_title_or_link_are_skipped() {
        let adapter = adapter_for(SourceId::NoFluffJobs);
        let html = nofluff_listing(&format!(
            r#"{}<a class="posting-list-item"><h3 data-cy="title position on the job offer listing">No Link</h3></a>{}"#,
            nofluff_item("/pl/job/a", ""),
            nofluff_item("/pl/job/b", "Kept"),
        ));

        let candidates = extract_candidates(&html, adapter.as_ref(), &page()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Kept");
    }

    #[test]
    fn test_merge_first_title_wins() {
        let mut merged = vec![candidate("Dev", "https://example.com/1")];
        let added = merge_candidates(
            &mut merged,
            vec![
                candidate("Dev", "https://example.com/2"),
                candidate("Ops", "https://example.com/3"),
                candidate("Ops", "https://example.com/4"),
            ],
        );

        assert_eq!(added, 1);
        assert_eq!(
            merged,
            vec![
                candidate("Dev", "https://example.com/1"),
                candidate("Ops", "https://example.com/3"),
            ]
        );
    }
}
