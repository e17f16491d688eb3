//! Browser driver boundary
//!
//! Handlers talk to pages only through [`BrowserSession`]: wait for a
//! selector, read text/markup/attributes, activate a control. Rendering,
//! script execution and network access live behind the trait.

use crate::BrowserResult;
use async_trait::async_trait;
use std::time::Duration;

/// How long a wait for a selector may take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitBound {
    Bounded(Duration),
    /// Wait until the element appears, however long that takes
    Unbounded,
}

impl WaitBound {
    pub fn from_option(timeout: Option<Duration>) -> Self {
        timeout.map_or(Self::Unbounded, Self::Bounded)
    }

    pub fn as_millis(&self) -> Option<u64> {
        match self {
            Self::Bounded(d) => Some(d.as_millis() as u64),
            Self::Unbounded => None,
        }
    }
}

/// What to read from an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extract {
    Text,
    Html,
    Attribute(String),
}

/// A query evaluated relative to each match of a scope selector
#[derive(Debug, Clone)]
pub struct ScopedQuery {
    pub selector: String,
    pub extract: Extract,
}

impl ScopedQuery {
    pub fn text(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            extract: Extract::Text,
        }
    }

    pub fn attribute(selector: &str, name: &str) -> Self {
        Self {
            selector: selector.to_string(),
            extract: Extract::Attribute(name.to_string()),
        }
    }
}

/// One open page
#[async_trait]
pub trait BrowserSession: Send {
    /// URL of the loaded document (after redirects)
    fn url(&self) -> &str;

    /// The document title, if it has one
    async fn title(&mut self) -> BrowserResult<Option<String>>;

    /// Waits until at least one element matches and returns the match count
    ///
    /// Fails with `SelectorTimeout` when a bounded wait elapses.
    async fn wait_for(&mut self, selector: &str, bound: WaitBound) -> BrowserResult<usize>;

    /// Text of the first match; `SelectorMissing` if nothing matches
    async fn extract_text(&mut self, selector: &str) -> BrowserResult<String>;

    /// Text of every match in document order; empty if nothing matches
    async fn extract_all_text(&mut self, selector: &str) -> BrowserResult<Vec<String>>;

    /// Inner markup of the first match; `SelectorMissing` if nothing matches
    async fn extract_html(&mut self, selector: &str) -> BrowserResult<String>;

    /// Attribute of the first match; `SelectorMissing` if the element or the
    /// attribute is absent
    async fn extract_attribute(&mut self, selector: &str, attribute: &str)
        -> BrowserResult<String>;

    /// For every element matching `scope`, evaluates each query against the
    /// first descendant it matches. A query that matches nothing yields `None`
    /// for that element only.
    async fn extract_within(
        &mut self,
        scope: &str,
        queries: &[ScopedQuery],
    ) -> BrowserResult<Vec<Vec<Option<String>>>>;

    /// Activates the `index`-th element matching `selector`
    async fn click(&mut self, selector: &str, index: usize) -> BrowserResult<()>;
}

/// Opens page sessions
#[async_trait]
pub trait Browser: Send + Sync {
    async fn open(&self, url: &str) -> BrowserResult<Box<dyn BrowserSession>>;
}
