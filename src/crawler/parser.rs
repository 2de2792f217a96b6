//! HTML parser for extracting anchor links
//!
//! This module wraps `scraper` to turn a fetched body into the ordered,
//! per-page-deduplicated list of `<a href>` values a fetch task records.

use crate::url::resolve_link;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// Anchor hrefs in first-occurrence order
    pub links: Vec<String>,
}

/// Parses an HTML body and extracts its anchor links
///
/// # Link Extraction Rules
///
/// - Only `href` attributes of `<a>` elements are collected
/// - Values are trimmed; empty values are skipped
/// - When `base_url` is given, relative hrefs are joined onto it
/// - Duplicates are dropped (case-insensitive), keeping the first occurrence
///
/// Nothing is filtered by scheme or scope here; every surviving href is
/// recorded by the caller.
///
/// # Arguments
///
/// * `html` - The decoded response body
/// * `base_url` - The page address used to resolve relative links, if enabled
///
/// Malformed markup is never an error; the HTML parser recovers from it.
///
/// # Example
///
/// ```
/// use scope_crawl::crawler::parse_html;
///
/// let html = r#"<html><body><a href="/a">A</a><a href="/A">again</a></body></html>"#;
/// let parsed = parse_html(html, None);
/// assert_eq!(parsed.links, vec!["/a".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: Option<&Url>) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        links: extract_links(&document, base_url),
    }
}

fn extract_links(document: &Html, base_url: Option<&Url>) -> Vec<String> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let href = href.trim();
        if href.is_empty() {
            continue;
        }

        let link = match base_url {
            Some(base) => resolve_link(href, base),
            None => href.to_string(),
        };

        if !seen.insert(link.to_lowercase()) {
            tracing::trace!("Ignoring duplicate link {}", link);
            continue;
        }

        links.push(link);
    }

    links
}
