//! Link extraction
//!
//! Pulls candidate href strings out of a fetched body. Resolution against
//! the page URL happens later, in the worker, so the strings are returned
//! exactly as they appear in the document.

use scraper::{Html, Selector};

/// Capability to list the hrefs found in a response body
///
/// Order is not significant.
pub trait LinkExtractor: Send + Sync {
    fn extract_hrefs(&self, body: &[u8]) -> Vec<String>;
}

/// HTML extractor backed by `scraper`
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` and `data:` hrefs
/// - empty and fragment-only hrefs
#[derive(Debug, Clone, Default)]
pub struct HtmlLinkExtractor;

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_hrefs(&self, body: &[u8]) -> Vec<String> {
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);
        let mut hrefs = Vec::new();

        if let Ok(anchors) = Selector::parse("a[href]") {
            for element in document.select(&anchors) {
                if element.value().attr("download").is_some() {
                    continue;
                }
                if let Some(href) = element.value().attr("href").and_then(keep_href) {
                    hrefs.push(href);
                }
            }
        }

        if let Ok(canonical) = Selector::parse("link[rel='canonical'][href]") {
            for element in document.select(&canonical) {
                if let Some(href) = element.value().attr("href").and_then(keep_href) {
                    hrefs.push(href);
                }
            }
        }

        hrefs
    }
}

/// Trims an href and drops the ones that can never name a page
fn keep_href(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    const SKIPPED_SCHEMES: [&str; 4] = ["javascript:", "mailto:", "tel:", "data:"];
    if SKIPPED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return None;
    }

    Some(href.to_string())
}
