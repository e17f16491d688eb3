//! Crawl requests and page classification
//!
//! A request's page kind is decided when it is enqueued and travels with it
//! through the queue. Classification never looks at page content.

use std::fmt;
use url::Url;

/// The two kinds of page the crawler knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestLabel {
    /// The paginated challenge index
    Listing,
    /// A single challenge's detail page
    Challenge,
}

impl RequestLabel {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Listing => "LISTING",
            Self::Challenge => "CHALLENGE",
        }
    }

    /// Reads a stored label; anything other than an explicit CHALLENGE tag is
    /// a listing page.
    pub fn from_db_string(s: Option<&str>) -> Self {
        match s {
            Some("CHALLENGE") => Self::Challenge,
            _ => Self::Listing,
        }
    }
}

impl fmt::Display for RequestLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// A page-visit task
///
/// Each variant carries only the fields its handler needs. URLs are stored in
/// normalized form, which is also the queue's dedup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlRequest {
    Listing {
        url: String,
    },
    Challenge {
        url: String,
        /// Difficulty label captured from the listing entry
        difficulty: String,
        /// The link as it appeared on the listing
        original_url: String,
    },
}

impl CrawlRequest {
    pub fn listing(url: &Url) -> Self {
        Self::Listing {
            url: url.to_string(),
        }
    }

    /// Builds a challenge request; `None` if the difficulty is blank
    pub fn challenge(url: &Url, original_url: &str, difficulty: &str) -> Option<Self> {
        let difficulty = difficulty.trim();
        if difficulty.is_empty() {
            return None;
        }

        Some(Self::Challenge {
            url: url.to_string(),
            difficulty: difficulty.to_string(),
            original_url: original_url.to_string(),
        })
    }

    /// Rebuilds a request from its stored columns
    ///
    /// A challenge row without a difficulty cannot satisfy the challenge
    /// invariant and yields `None`.
    pub fn from_parts(
        label: RequestLabel,
        url: String,
        difficulty: Option<String>,
        original_url: Option<String>,
    ) -> Option<Self> {
        match label {
            RequestLabel::Listing => Some(Self::Listing { url }),
            RequestLabel::Challenge => {
                let difficulty = difficulty.filter(|d| !d.trim().is_empty())?;
                let original_url = original_url.unwrap_or_else(|| url.clone());
                Some(Self::Challenge {
                    url,
                    difficulty,
                    original_url,
                })
            }
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Listing { url } | Self::Challenge { url, .. } => url,
        }
    }

    pub fn label(&self) -> RequestLabel {
        match self {
            Self::Listing { .. } => RequestLabel::Listing,
            Self::Challenge { .. } => RequestLabel::Challenge,
        }
    }

    pub fn difficulty(&self) -> Option<&str> {
        match self {
            Self::Listing { .. } => None,
            Self::Challenge { difficulty, .. } => Some(difficulty),
        }
    }

    pub fn original_url(&self) -> Option<&str> {
        match self {
            Self::Listing { .. } => None,
            Self::Challenge { original_url, .. } => Some(original_url),
        }
    }
}

/// A request leased from the queue
#[derive(Debug, Clone)]
pub struct QueuedRequest {
    /// Queue row ID
    pub id: i64,

    pub request: CrawlRequest,

    /// Times this request has already been reclaimed after a failure
    pub retry_count: u32,
}

/// Decides which handler a dequeued request goes to
pub fn classify(request: &CrawlRequest) -> RequestLabel {
    request.label()
}
