use super::Address;
use crate::{UrlError, UrlResult};
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
];

/// Normalizes a raw link relative to the page it was found on
///
/// # Accepted Forms
///
/// - Absolute `http://` or `https://` links (scheme matched case-insensitively)
/// - Root-relative links starting with `/`, resolved against `base`'s origin
///
/// Everything else (`mailto:`, `javascript:`, fragment-only links, relative
/// paths without a leading slash, empty strings) yields `None`. Only
/// root-relative and fully-qualified links are followed.
///
/// # Normalization Steps
///
/// 1. Lowercase scheme and host
/// 2. Drop the default port
/// 3. Remove dot segments; empty path becomes `/`
/// 4. Remove tracking query parameters
/// 5. Sort remaining query parameters by key; drop an empty query
/// 6. Remove fragment
///
/// The function is pure and idempotent: normalizing an already-normalized
/// address yields the same address.
///
/// # Examples
///
/// ```
/// use sumi_scribe::url::{normalize, Address};
///
/// let base = Address::parse("https://example.com/a").unwrap();
/// let link = normalize("/c?b=2&a=1&utm_source=feed#top", &base).unwrap();
/// assert_eq!(link.as_str(), "https://example.com/c?a=1&b=2");
///
/// assert!(normalize("mailto:someone@example.com", &base).is_none());
/// assert!(normalize("relative/page", &base).is_none());
/// ```
pub fn normalize(raw: &str, base: &Address) -> Option<Address> {
    let raw = raw.trim();

    let resolved = if has_web_scheme(raw) {
        Url::parse(raw).ok()?
    } else if raw.starts_with('/') {
        // Appended to the origin rather than joined, so `//host` and `/\host`
        // stay paths on the base host
        let origin = base.as_url().origin().ascii_serialization();
        Url::parse(&format!("{}{}", origin, raw)).ok()?
    } else {
        return None;
    };

    match canonicalize(resolved) {
        Ok(address) => Some(address),
        Err(e) => {
            tracing::trace!("Discarding link {}: {}", raw, e);
            None
        }
    }
}

/// Canonicalizes an already-absolute URL into an [`Address`]
pub(super) fn canonicalize(mut url: Url) -> UrlResult<Address> {
    // The url crate already lowercases scheme and host, strips default
    // ports and resolves dot segments for special schemes.
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(Address(url))
}

/// Returns true if the raw link carries an explicit http(s) scheme
fn has_web_scheme(raw: &str) -> bool {
    starts_with_ignore_case(raw, "https://") || starts_with_ignore_case(raw, "http://")
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack.len() >= prefix.len()
        && haystack.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    // Stable sort keeps repeated keys in document order
    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
