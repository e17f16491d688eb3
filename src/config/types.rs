use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Kata-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub site: SiteConfig,
    #[serde(default)]
    pub listing: ListingSelectors,
    #[serde(default)]
    pub detail: DetailPolicy,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of requests dispatched in one crawl
    #[serde(rename = "max-requests-per-crawl")]
    pub max_requests_per_crawl: u32,

    /// Maximum number of page sessions open at once
    #[serde(rename = "max-concurrency")]
    pub max_concurrency: u32,

    /// How many times a failed request is put back on the queue
    #[serde(rename = "max-request-retries", default = "default_max_request_retries")]
    pub max_request_retries: u32,

    /// Bound on each wait for the "load more" control (milliseconds)
    #[serde(rename = "load-more-timeout-ms", default = "default_load_more_timeout_ms")]
    pub load_more_timeout_ms: u64,

    /// Bound on the detail-page title wait (milliseconds, 0 = unbounded)
    #[serde(rename = "content-timeout-ms", default = "default_content_timeout_ms")]
    pub content_timeout_ms: u64,

    /// Upper limit on "load more" activations for one listing
    #[serde(rename = "max-load-more-clicks", default = "default_max_load_more_clicks")]
    pub max_load_more_clicks: u32,

    /// Ceiling on a single handler invocation (seconds)
    #[serde(rename = "handler-timeout-secs", default = "default_handler_timeout_secs")]
    pub handler_timeout_secs: u64,
}

impl CrawlerConfig {
    pub fn load_more_timeout(&self) -> Duration {
        Duration::from_millis(self.load_more_timeout_ms)
    }

    /// `None` means the title wait never gives up
    pub fn content_timeout(&self) -> Option<Duration> {
        match self.content_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn handler_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_requests_per_crawl: 50,
            max_concurrency: 10,
            max_request_retries: default_max_request_retries(),
            load_more_timeout_ms: default_load_more_timeout_ms(),
            content_timeout_ms: default_content_timeout_ms(),
            max_load_more_clicks: default_max_load_more_clicks(),
            handler_timeout_secs: default_handler_timeout_secs(),
        }
    }
}

fn default_max_request_retries() -> u32 {
    3
}

fn default_load_more_timeout_ms() -> u64 {
    5_000
}

fn default_content_timeout_ms() -> u64 {
    30_000
}

fn default_max_load_more_clicks() -> u32 {
    1_000
}

fn default_handler_timeout_secs() -> u64 {
    120
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: String,

    /// Directory that receives one JSON file per record
    #[serde(rename = "dataset-dir", default = "default_dataset_dir")]
    pub dataset_dir: String,
}

fn default_dataset_dir() -> String {
    "./dataset".to_string()
}

/// Site entry points
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// The listing page the crawl starts from
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Pseudo-URL that challenge detail links must match, e.g.
    /// `https://edabit.com/challenge/[.*]`
    #[serde(rename = "challenge-url-pattern")]
    pub challenge_url_pattern: String,
}

/// Selectors used on the listing page
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    #[serde(rename = "load-more")]
    pub load_more: String,

    /// One match per challenge entry
    pub entry: String,

    /// Anchor inside an entry pointing at the detail page
    #[serde(rename = "entry-link")]
    pub entry_link: String,

    /// Difficulty label inside an entry
    #[serde(rename = "entry-difficulty")]
    pub entry_difficulty: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            load_more: "div.ui.container button".to_string(),
            entry: "div.item".to_string(),
            entry_link: "a.content".to_string(),
            entry_difficulty: "div.difficulty".to_string(),
        }
    }
}

/// Declarative field-to-selector mapping for challenge detail pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetailPolicy {
    pub title: String,
    pub tags: String,
    pub instructions: String,
    #[serde(rename = "code-tab")]
    pub code_tab: TabTarget,
    pub code: FieldSource,
    #[serde(rename = "tests-tab")]
    pub tests_tab: TabTarget,
    pub tests: FieldSource,
    /// Author anchor; when absent the author fields stay empty
    pub author: Option<String>,
}

impl Default for DetailPolicy {
    fn default() -> Self {
        Self {
            title: "h2.content".to_string(),
            tags: "a.ui.label".to_string(),
            instructions: "div.instructions div:not([class])".to_string(),
            code_tab: TabTarget::positional("div[role=tab]", 2),
            code: FieldSource::lines("div#Code div.CodeMirror-code pre"),
            tests_tab: TabTarget::positional("div[role=tab]", 5),
            tests: FieldSource::lines("div#Lab div.CodeMirror-code pre"),
            author: None,
        }
    }
}

/// Identifies one tab control in a tab strip
///
/// `label` wins over `index` when both are given.
#[derive(Debug, Clone, Deserialize)]
pub struct TabTarget {
    pub selector: String,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub label: Option<String>,
}

impl TabTarget {
    pub fn positional(selector: &str, index: usize) -> Self {
        Self {
            selector: selector.to_string(),
            index: Some(index),
            label: None,
        }
    }
}

/// How a multi-line field is read from its panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldMode {
    /// Every matching node is one line; lines are joined with '\n'
    Lines,
    /// The text of the first matching node (e.g. a textarea)
    Text,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSource {
    pub mode: FieldMode,
    pub selector: String,
}

impl FieldSource {
    pub fn lines(selector: &str) -> Self {
        Self {
            mode: FieldMode::Lines,
            selector: selector.to_string(),
        }
    }

    pub fn text(selector: &str) -> Self {
        Self {
            mode: FieldMode::Text,
            selector: selector.to_string(),
        }
    }
}
