//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (the `href` of every `<a>` element)
//! - Page title, for diagnostics
//!
//! Parsing is lenient: html5ever recovers from malformed markup, so
//! extraction never fails. A document with nothing recoverable simply
//! yields no links.

use crate::url::{normalize, Address};
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Distinct normalized addresses linked from the page
    pub links: HashSet<Address>,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// Every `<a href="...">` value is passed through [`normalize`] with the
/// page's own address as base. Values it rejects (`mailto:`, `javascript:`,
/// fragment-only, relative paths without a leading slash) are discarded.
/// Duplicate links collapse into one entry.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base` - The address the page was fetched from
///
/// # Example
///
/// ```
/// use sumi_scribe::crawler::parse_html;
/// use sumi_scribe::url::Address;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base = Address::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links.len(), 1);
/// ```
pub fn parse_html(html: &str, base: &Address) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: collect_links(&document, base),
    }
}

/// Extracts the set of normalized addresses an HTML document links to
pub fn extract_links(html: &str, base: &Address) -> HashSet<Address> {
    parse_html(html, base).links
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collects normalized anchor targets from the document
fn collect_links(document: &Html, base: &Address) -> HashSet<Address> {
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return HashSet::new();
    };

    document
        .select(&anchor_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| normalize(href, base))
        .collect()
}
