use crate::config::types::{
    Config, CrawlerConfig, DetailPolicy, FieldSource, ListingSelectors, OutputConfig, SiteConfig,
    TabTarget, UserAgentConfig,
};
use crate::url::PseudoUrl;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_site_config(&config.site)?;
    validate_listing_selectors(&config.listing)?;
    validate_detail_policy(&config.detail)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_requests_per_crawl < 1 {
        return Err(ConfigError::Validation(format!(
            "max_requests_per_crawl must be >= 1, got {}",
            config.max_requests_per_crawl
        )));
    }

    if config.max_concurrency < 1 || config.max_concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be between 1 and 100, got {}",
            config.max_concurrency
        )));
    }

    if config.max_request_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_request_retries must be <= 10, got {}",
            config.max_request_retries
        )));
    }

    if config.load_more_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "load_more_timeout_ms must be >= 100ms, got {}ms",
            config.load_more_timeout_ms
        )));
    }

    if config.max_load_more_clicks < 1 {
        return Err(ConfigError::Validation(format!(
            "max_load_more_clicks must be >= 1, got {}",
            config.max_load_more_clicks
        )));
    }

    if config.handler_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "handler_timeout_secs must be >= 1, got {}",
            config.handler_timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("database_path", &config.database_path),
        ("summary_path", &config.summary_path),
        ("dataset_dir", &config.dataset_dir),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Validates the seed URL and the challenge pattern
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let seed = Url::parse(&config.seed_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", config.seed_url, e))
    })?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use http or https",
            config.seed_url
        )));
    }

    let pattern = PseudoUrl::new(&config.challenge_url_pattern)
        .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

    let prefix = pattern.literal_prefix();
    if !(prefix.starts_with("http://") || prefix.starts_with("https://")) {
        return Err(ConfigError::InvalidPattern(format!(
            "Challenge pattern '{}' must start with a literal http(s) URL prefix",
            config.challenge_url_pattern
        )));
    }

    // The seed would otherwise be classified as a challenge page by the listing
    if pattern.matches(&config.seed_url) {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must not match the challenge pattern",
            config.seed_url
        )));
    }

    Ok(())
}

fn validate_listing_selectors(selectors: &ListingSelectors) -> Result<(), ConfigError> {
    validate_selector("listing.load-more", &selectors.load_more)?;
    validate_selector("listing.entry", &selectors.entry)?;
    validate_selector("listing.entry-link", &selectors.entry_link)?;
    validate_selector("listing.entry-difficulty", &selectors.entry_difficulty)?;
    Ok(())
}

fn validate_detail_policy(policy: &DetailPolicy) -> Result<(), ConfigError> {
    validate_selector("detail.title", &policy.title)?;
    validate_selector("detail.tags", &policy.tags)?;
    validate_selector("detail.instructions", &policy.instructions)?;
    validate_tab("detail.code-tab", &policy.code_tab)?;
    validate_field("detail.code", &policy.code)?;
    validate_tab("detail.tests-tab", &policy.tests_tab)?;
    validate_field("detail.tests", &policy.tests)?;
    if let Some(author) = &policy.author {
        validate_selector("detail.author", author)?;
    }
    Ok(())
}

fn validate_tab(name: &str, tab: &TabTarget) -> Result<(), ConfigError> {
    validate_selector(name, &tab.selector)?;

    if tab.index.is_none() && tab.label.is_none() {
        return Err(ConfigError::Validation(format!(
            "{} needs an index or a label",
            name
        )));
    }

    if let Some(label) = &tab.label {
        if label.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{} label cannot be blank",
                name
            )));
        }
    }

    Ok(())
}

fn validate_field(name: &str, field: &FieldSource) -> Result<(), ConfigError> {
    validate_selector(name, &field.selector)
}

/// Checks that a CSS selector is non-empty and parses
fn validate_selector(name: &str, selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "{} selector cannot be empty",
            name
        )));
    }

    scraper::Selector::parse(selector).map_err(|e| {
        ConfigError::Validation(format!("{} selector '{}' is invalid: {:?}", name, selector, e))
    })?;

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let (local, domain) = match email.split_once('@') {
        Some(parts) if !parts.1.contains('@') => parts,
        _ => {
            return Err(ConfigError::Validation(format!(
                "Invalid email format: '{}'",
                email
            )))
        }
    };

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(seed: &str, pattern: &str) -> SiteConfig {
        SiteConfig {
            seed_url: seed.to_string(),
            challenge_url_pattern: pattern.to_string(),
        }
    }

    #[test]
    fn test_validate_site_config() {
        assert!(validate_site_config(&site(
            "https://edabit.com/challenges",
            "https://edabit.com/challenge/[.*]"
        ))
        .is_ok());

        // seed itself is a challenge page
        assert!(validate_site_config(&site(
            "https://edabit.com/challenge/abc",
            "https://edabit.com/challenge/[.*]"
        ))
        .is_err());

        assert!(validate_site_config(&site("not a url", "https://edabit.com/[.*]")).is_err());
        assert!(validate_site_config(&site("ftp://edabit.com/", "https://edabit.com/[.*]")).is_err());
        assert!(validate_site_config(&site("https://edabit.com/", "[.*]")).is_err());
        assert!(validate_site_config(&site(
            "https://edabit.com/challenges",
            "https://edabit.com/challenge/[(unclosed]"
        ))
        .is_err());
    }

    #[test]
    fn test_validate_selector() {
        assert!(validate_selector("x", "div[role=tab]").is_ok());
        assert!(validate_selector("x", "div.instructions div:not([class])").is_ok());
        assert!(validate_selector("x", "").is_err());
        assert!(validate_selector("x", "   ").is_err());
        assert!(validate_selector("x", "div[[").is_err());
    }

    #[test]
    fn test_validate_tab() {
        assert!(validate_tab("t", &TabTarget::positional("div[role=tab]", 5)).is_ok());

        let mut by_label = TabTarget::positional("div[role=tab]", 0);
        by_label.index = None;
        by_label.label = Some("Tests".to_string());
        assert!(validate_tab("t", &by_label).is_ok());

        by_label.label = None;
        assert!(validate_tab("t", &by_label).is_err());

        by_label.label = Some("  ".to_string());
        assert!(validate_tab("t", &by_label).is_err());
    }

    #[test]
    fn test_default_policies_are_valid() {
        assert!(validate_listing_selectors(&ListingSelectors::default()).is_ok());
        assert!(validate_detail_policy(&DetailPolicy::default()).is_ok());
    }

    #[test]
    fn test_crawler_limits() {
        let mut config = CrawlerConfig::default();
        assert!(validate_crawler_config(&config).is_ok());

        config.max_requests_per_crawl = 0;
        assert!(validate_crawler_config(&config).is_err());

        config = CrawlerConfig::default();
        config.max_concurrency = 101;
        assert!(validate_crawler_config(&config).is_err());

        config = CrawlerConfig::default();
        config.load_more_timeout_ms = 50;
        assert!(validate_crawler_config(&config).is_err());

        // 0 is the documented "unbounded" title wait
        config = CrawlerConfig::default();
        config.content_timeout_ms = 0;
        assert!(validate_crawler_config(&config).is_ok());
        assert!(config.content_timeout().is_none());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }
}
