//! HTTP fetcher implementation
//!
//! This module handles the HTTP side of the static browser driver:
//! - Building the HTTP client with the crawler's user agent
//! - GET requests for page content
//! - Error classification into browser errors

use crate::config::UserAgentConfig;
use crate::BrowserError;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// A downloaded HTML document
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Page body content
    pub body: String,
}

/// Formats the user agent string: `CrawlerName/Version (+ContactURL; ContactEmail)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use kata_harvest::config::UserAgentConfig;
/// use kata_harvest::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "KataHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Downloads one HTML page
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with an HTML (or missing) Content-Type | `Ok(FetchedPage)` |
/// | any other status | `BrowserError::Http` |
/// | non-HTML Content-Type | `BrowserError::Navigation` |
/// | timeout, connection or body error | `BrowserError::Navigation` |
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, BrowserError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| BrowserError::Navigation {
            url: url.to_string(),
            message: classify_request_error(&e),
        })?;

    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        return Err(BrowserError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.is_empty() && !content_type.contains("text/html") {
        return Err(BrowserError::Navigation {
            url: url.to_string(),
            message: format!("expected HTML, got {}", content_type),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| BrowserError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    Ok(FetchedPage {
        final_url,
        status_code: status.as_u16(),
        body,
    })
}

fn classify_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        "connection refused".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else {
        error.to_string()
    }
}
