use crate::UrlError;
use url::Url;

/// Query parameters added by boards and campaigns that do not identify a posting
const TRACKING_PARAMS: &[&str] = &[
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
    "searchId",
    "sug",
    "s",
];

/// Parses an absolute http(s) URL
pub fn parse_http_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Canonical form of a detail-page URL used as the posting key
///
/// 1. Remove the fragment
/// 2. Remove tracking query parameters (`utm_*` and the known list)
/// 3. Sort the remaining query parameters by key
/// 4. Drop an empty query string
///
/// Scheme, host and path are kept as resolved, so the same posting linked
/// twice maps to one key.
///
/// # Examples
///
/// ```
/// use jobharvest::url::strip_tracking_params;
/// use url::Url;
///
/// let url = Url::parse("https://nofluffjobs.com/pl/job/dev-acme?utm_source=x&b=2&a=1#top").unwrap();
/// assert_eq!(strip_tracking_params(&url).as_str(), "https://nofluffjobs.com/pl/job/dev-acme?a=1&b=2");
/// ```
pub fn strip_tracking_params(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    url
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
