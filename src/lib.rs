//! Kata-Harvest: a challenge catalog harvester
//!
//! This crate walks a coding-challenge catalog site in two phases: it fully
//! expands the paginated listing page, enqueues one request per challenge
//! entry, then extracts a structured record from every challenge detail page.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Kata-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Handler for {url} exceeded {seconds}s and was abandoned")]
    HandlerTimeout { url: String, seconds: u64 },

    #[error("Worker task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid URL pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Invalid pseudo-URL pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

/// Errors raised by a browser session while driving a page
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The element did not appear within its bound
    #[error("Timed out after {waited_ms}ms waiting for '{selector}'")]
    SelectorTimeout { selector: String, waited_ms: u64 },

    /// The element is absent when a non-waiting extraction is attempted
    #[error("No element matches '{selector}'")]
    SelectorMissing { selector: String },

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Failed to load {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },
}

impl BrowserError {
    /// Returns true for the benign "element never appeared" condition
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::SelectorTimeout { .. })
    }
}

/// Result type alias for Kata-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for browser operations
pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::crawler::{ChallengeRecord, CrawlRequest, RequestLabel};
pub use crate::state::RequestState;
pub use crate::url::{challenge_id, normalize_url, PseudoUrl};
