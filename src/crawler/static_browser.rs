//! Script-free browser driver
//!
//! `StaticBrowser` downloads each page once with reqwest and answers every
//! query against the parsed markup. Nothing on the page ever runs, so:
//!
//! - a wait succeeds immediately or fails immediately (bounded waits report
//!   `SelectorTimeout`, unbounded ones `SelectorMissing`);
//! - activating a control consumes the selector it was clicked through:
//!   later waits on that selector fail, since nothing new can appear. This
//!   ends "load more" expansion after one activation even when the selector
//!   matches several elements. Clicks still address every match by index, so
//!   tab strips stay usable and panels already in the markup stay readable.

use crate::crawler::browser::{Browser, BrowserSession, ScopedQuery, WaitBound};
use crate::crawler::fetcher::fetch_page;
use crate::crawler::parser;
use crate::{BrowserError, BrowserResult};
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use std::collections::HashSet;

/// Browser that renders nothing and fetches over plain HTTP
#[derive(Clone)]
pub struct StaticBrowser {
    client: Client,
}

impl StaticBrowser {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Browser for StaticBrowser {
    async fn open(&self, url: &str) -> BrowserResult<Box<dyn BrowserSession>> {
        let page = fetch_page(&self.client, url).await?;
        tracing::debug!(
            "Fetched {} (HTTP {}, {} bytes)",
            page.final_url,
            page.status_code,
            page.body.len()
        );
        Ok(Box::new(StaticSession::from_html(&page.final_url, page.body)))
    }
}

/// One downloaded document
///
/// The markup is kept as text and parsed per query; a parsed `Html` cannot be
/// held by a `Send` session.
pub struct StaticSession {
    url: String,
    html: String,
    /// selectors something was activated through
    consumed: HashSet<String>,
}

impl StaticSession {
    pub fn from_html(url: &str, html: String) -> Self {
        Self {
            url: url.to_string(),
            html,
            consumed: HashSet::new(),
        }
    }

    fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }

    fn live_matches(&self, selector: &str) -> BrowserResult<usize> {
        let total = parser::select_all(&self.document(), selector)?.len();
        if self.consumed.contains(selector) {
            Ok(0)
        } else {
            Ok(total)
        }
    }
}

#[async_trait]
impl BrowserSession for StaticSession {
    fn url(&self) -> &str {
        &self.url
    }

    async fn title(&mut self) -> BrowserResult<Option<String>> {
        Ok(parser::extract_title(&self.document()))
    }

    async fn wait_for(&mut self, selector: &str, bound: WaitBound) -> BrowserResult<usize> {
        let count = self.live_matches(selector)?;
        if count > 0 {
            return Ok(count);
        }

        // The document can never change, so there is nothing to wait for
        match bound {
            WaitBound::Bounded(_) => Err(BrowserError::SelectorTimeout {
                selector: selector.to_string(),
                waited_ms: 0,
            }),
            WaitBound::Unbounded => Err(BrowserError::SelectorMissing {
                selector: selector.to_string(),
            }),
        }
    }

    async fn extract_text(&mut self, selector: &str) -> BrowserResult<String> {
        let document = self.document();
        let element = parser::select_first(&document, selector)?;
        Ok(parser::element_text(&element))
    }

    async fn extract_all_text(&mut self, selector: &str) -> BrowserResult<Vec<String>> {
        let document = self.document();
        let elements = parser::select_all(&document, selector)?;
        Ok(elements.iter().map(parser::element_text).collect())
    }

    async fn extract_html(&mut self, selector: &str) -> BrowserResult<String> {
        let document = self.document();
        let element = parser::select_first(&document, selector)?;
        Ok(element.inner_html())
    }

    async fn extract_attribute(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> BrowserResult<String> {
        let document = self.document();
        let element = parser::select_first(&document, selector)?;
        element
            .value()
            .attr(attribute)
            .map(str::to_string)
            .ok_or_else(|| BrowserError::SelectorMissing {
                selector: format!("{}[{}]", selector, attribute),
            })
    }

    async fn extract_within(
        &mut self,
        scope: &str,
        queries: &[ScopedQuery],
    ) -> BrowserResult<Vec<Vec<Option<String>>>> {
        parser::extract_within(&self.document(), scope, queries)
    }

    async fn click(&mut self, selector: &str, index: usize) -> BrowserResult<()> {
        let total = parser::select_all(&self.document(), selector)?.len();
        if index >= total {
            return Err(BrowserError::SelectorMissing {
                selector: format!("{} (#{})", selector, index),
            });
        }

        tracing::trace!("Activating {} #{} on {}", selector, index, self.url);
        self.consumed.insert(selector.to_string());
        Ok(())
    }
}
