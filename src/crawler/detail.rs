//! Challenge detail page handler
//!
//! Waits for the challenge content to render, reads the title, tags and
//! instructions, then switches through the code and tests tabs to read the
//! starter code and its test suite.

use crate::config::{DetailPolicy, FieldMode, FieldSource, TabTarget};
use crate::crawler::browser::{BrowserSession, WaitBound};
use crate::crawler::queue::RecordSink;
use crate::url::{author_id, challenge_id, resolve_link};
use crate::{BrowserError, HarvestError};
use serde::{Deserialize, Serialize};
use url::Url;

/// Everything extracted from one challenge page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRecord {
    /// URL of the detail page
    pub source_url: String,

    /// Identifier derived from `source_url`
    pub challenge_id: Option<String>,

    pub author_id: Option<String>,
    pub author_url: Option<String>,

    /// Difficulty label from the listing entry that linked here
    pub difficulty: String,

    pub title: String,

    /// Tag labels in page order
    pub tags: Vec<String>,

    /// Instructions as inner HTML
    pub instructions: String,

    /// Starter code, one rendered line per `\n`
    pub code: String,

    /// Test suite source
    pub tests: String,
}

pub struct DetailHandler<'a> {
    policy: &'a DetailPolicy,
    content_bound: WaitBound,
    challenge_prefix: &'a str,
}

impl<'a> DetailHandler<'a> {
    /// `challenge_prefix` is the literal head of the challenge URL pattern,
    /// used to derive `challenge_id`.
    pub fn new(policy: &'a DetailPolicy, content_bound: WaitBound, challenge_prefix: &'a str) -> Self {
        Self {
            policy,
            content_bound,
            challenge_prefix,
        }
    }

    /// Extracts the record for one challenge page and appends it to `sink`
    ///
    /// Any missing element fails the whole page; no partial record is
    /// written.
    pub async fn handle(
        &self,
        session: &mut dyn BrowserSession,
        difficulty: &str,
        sink: &dyn RecordSink,
    ) -> Result<ChallengeRecord, HarvestError> {
        let policy = self.policy;
        let source_url = session.url().to_string();

        session.wait_for(&policy.title, self.content_bound).await?;
        tracing::debug!("Challenge page ready: {}", source_url);

        let title = session.extract_text(&policy.title).await?.trim().to_string();
        let tags = session
            .extract_all_text(&policy.tags)
            .await?
            .iter()
            .map(|tag| tag.trim().to_string())
            .collect();
        let instructions = session.extract_html(&policy.instructions).await?;

        activate_tab(session, &policy.code_tab).await?;
        let code = read_field(session, &policy.code).await?;

        activate_tab(session, &policy.tests_tab).await?;
        let tests = read_field(session, &policy.tests).await?;

        let author_url = match &policy.author {
            Some(selector) => self.author_url(session, selector).await?,
            None => None,
        };

        let record = ChallengeRecord {
            challenge_id: challenge_id(&source_url, self.challenge_prefix),
            author_id: author_url.as_deref().and_then(author_id),
            author_url,
            source_url,
            difficulty: difficulty.to_string(),
            title,
            tags,
            instructions,
            code,
            tests,
        };

        sink.append(&record)?;
        tracing::debug!(
            "Stored challenge {:?} ({} tags, {} code bytes, {} test bytes)",
            record.challenge_id,
            record.tags.len(),
            record.code.len(),
            record.tests.len()
        );

        Ok(record)
    }

    async fn author_url(
        &self,
        session: &mut dyn BrowserSession,
        selector: &str,
    ) -> Result<Option<String>, HarvestError> {
        let href = session.extract_attribute(selector, "href").await?;
        let resolved = Url::parse(session.url())
            .ok()
            .and_then(|base| resolve_link(&href, &base));
        if resolved.is_none() {
            tracing::warn!("Unusable author link '{}' on {}", href, session.url());
        }
        Ok(resolved.map(|url| url.to_string()))
    }
}

/// Clicks the tab named by `target`
async fn activate_tab(
    session: &mut dyn BrowserSession,
    target: &TabTarget,
) -> Result<(), BrowserError> {
    let index = match (&target.label, target.index) {
        (Some(label), _) => {
            let labels = session.extract_all_text(&target.selector).await?;
            labels
                .iter()
                .position(|text| text.trim() == label.trim())
                .ok_or_else(|| BrowserError::SelectorMissing {
                    selector: format!("{} labelled '{}'", target.selector, label),
                })?
        }
        (None, Some(index)) => index,
        (None, None) => 0,
    };

    tracing::trace!("Activating tab {} #{}", target.selector, index);
    session.click(&target.selector, index).await
}

async fn read_field(
    session: &mut dyn BrowserSession,
    source: &FieldSource,
) -> Result<String, BrowserError> {
    match source.mode {
        FieldMode::Text => session.extract_text(&source.selector).await,
        FieldMode::Lines => {
            let lines = session.extract_all_text(&source.selector).await?;
            if lines.is_empty() {
                return Err(BrowserError::SelectorMissing {
                    selector: source.selector.clone(),
                });
            }
            Ok(lines.join("\n"))
        }
    }
}
