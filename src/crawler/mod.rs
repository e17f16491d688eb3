//! Crawler module for challenge catalog harvesting
//!
//! This module contains the core crawling logic, including:
//! - The browser driver boundary and its static reqwest/scraper driver
//! - Request classification and the listing/detail page handlers
//! - The queue and sink interfaces the handlers write through
//! - Overall crawl coordination

mod browser;
mod coordinator;
mod detail;
mod fetcher;
mod listing;
mod parser;
mod queue;
mod request;
mod static_browser;

pub use browser::{Browser, BrowserSession, Extract, ScopedQuery, WaitBound};
pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use detail::{ChallengeRecord, DetailHandler};
pub use fetcher::{build_http_client, fetch_page, user_agent_string, FetchedPage};
pub use listing::{ListingHandler, ListingOutcome};
pub use queue::{RecordSink, RequestQueue};
pub use request::{classify, CrawlRequest, QueuedRequest, RequestLabel};
pub use static_browser::{StaticBrowser, StaticSession};
