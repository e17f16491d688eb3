//! Static DOM queries over parsed HTML
//!
//! These helpers evaluate CSS selectors against a document parsed with
//! `scraper`. They back the static browser driver and return browser errors
//! so handlers see the same failure kinds from any driver.

use crate::crawler::browser::{Extract, ScopedQuery};
use crate::{BrowserError, BrowserResult};
use scraper::{ElementRef, Html, Selector};

/// Parses a CSS selector
pub fn parse_selector(selector: &str) -> BrowserResult<Selector> {
    Selector::parse(selector).map_err(|e| BrowserError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Extracts the page title from the `<title>` element
pub fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// All matches of `selector` in document order
pub fn select_all<'a>(document: &'a Html, selector: &str) -> BrowserResult<Vec<ElementRef<'a>>> {
    let parsed = parse_selector(selector)?;
    Ok(document.select(&parsed).collect())
}

/// The first match of `selector`, or `SelectorMissing`
pub fn select_first<'a>(document: &'a Html, selector: &str) -> BrowserResult<ElementRef<'a>> {
    let parsed = parse_selector(selector)?;
    document
        .select(&parsed)
        .next()
        .ok_or_else(|| BrowserError::SelectorMissing {
            selector: selector.to_string(),
        })
}

/// Rendered text of an element
///
/// Text nodes are concatenated as-is; whitespace is significant inside code
/// lines, so trimming is left to the caller.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

/// Reads one value from an element
pub fn extract_value(element: &ElementRef<'_>, extract: &Extract) -> Option<String> {
    match extract {
        Extract::Text => Some(element_text(element)),
        Extract::Html => Some(element.inner_html()),
        Extract::Attribute(name) => element.value().attr(name).map(str::to_string),
    }
}

/// Evaluates scoped queries under every match of `scope`
pub fn extract_within(
    document: &Html,
    scope: &str,
    queries: &[ScopedQuery],
) -> BrowserResult<Vec<Vec<Option<String>>>> {
    let scope_selector = parse_selector(scope)?;
    let query_selectors = queries
        .iter()
        .map(|q| parse_selector(&q.selector))
        .collect::<BrowserResult<Vec<_>>>()?;

    let rows = document
        .select(&scope_selector)
        .map(|entry| {
            queries
                .iter()
                .zip(&query_selectors)
                .map(|(query, selector)| {
                    entry
                        .select(selector)
                        .next()
                        .and_then(|element| extract_value(&element, &query.extract))
                })
                .collect()
        })
        .collect();

    Ok(rows)
}
