//! Listing page handler
//!
//! Expands the paginated challenge index by activating its "load more"
//! control until the control stops reappearing, then turns every entry into
//! a challenge request.

use crate::config::ListingSelectors;
use crate::crawler::browser::{BrowserSession, ScopedQuery, WaitBound};
use crate::crawler::queue::RequestQueue;
use crate::crawler::request::CrawlRequest;
use crate::url::{resolve_link, PseudoUrl};
use crate::HarvestError;
use std::time::Duration;
use url::Url;

/// What one listing invocation did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingOutcome {
    /// Successful "load more" activations
    pub load_more_clicks: u32,

    /// Entry nodes found on the expanded listing
    pub entries_found: usize,

    /// New challenge requests added to the queue
    pub enqueued: usize,

    /// Well-formed entries whose URL was already queued
    pub duplicates: usize,

    /// Entries missing their link or difficulty
    pub malformed: usize,

    /// Links that do not match the challenge pattern
    pub ignored: usize,
}

pub struct ListingHandler<'a> {
    selectors: &'a ListingSelectors,
    challenge_pattern: &'a PseudoUrl,
    load_more_timeout: Duration,
    max_load_more_clicks: u32,
}

impl<'a> ListingHandler<'a> {
    pub fn new(
        selectors: &'a ListingSelectors,
        challenge_pattern: &'a PseudoUrl,
        load_more_timeout: Duration,
        max_load_more_clicks: u32,
    ) -> Self {
        Self {
            selectors,
            challenge_pattern,
            load_more_timeout,
            max_load_more_clicks,
        }
    }

    /// Expands the listing, harvests its entries and enqueues them
    pub async fn handle(
        &self,
        session: &mut dyn BrowserSession,
        queue: &dyn RequestQueue,
    ) -> Result<ListingOutcome, HarvestError> {
        let mut outcome = ListingOutcome {
            load_more_clicks: self.expand(session).await?,
            ..ListingOutcome::default()
        };

        let base = Url::parse(session.url()).map_err(|e| HarvestError::Task(format!(
            "listing session has an invalid URL '{}': {}",
            session.url(),
            e
        )))?;

        let rows = session
            .extract_within(
                &self.selectors.entry,
                &[
                    ScopedQuery::attribute(&self.selectors.entry_link, "href"),
                    ScopedQuery::text(&self.selectors.entry_difficulty),
                ],
            )
            .await?;
        outcome.entries_found = rows.len();

        for (position, row) in rows.into_iter().enumerate() {
            let mut fields = row.into_iter();
            let href = fields.next().flatten();
            let difficulty = fields.next().flatten();

            let request = match self.entry_request(&base, href, difficulty) {
                EntryResult::Request(request) => request,
                EntryResult::Malformed(reason) => {
                    tracing::warn!("Skipping listing entry #{}: {}", position, reason);
                    outcome.malformed += 1;
                    continue;
                }
                EntryResult::Ignored(url) => {
                    tracing::debug!("Ignoring non-challenge link {}", url);
                    outcome.ignored += 1;
                    continue;
                }
            };

            if queue.enqueue(&request)? {
                outcome.enqueued += 1;
            } else {
                outcome.duplicates += 1;
            }
        }

        tracing::info!(
            "Listing {}: {} load-more clicks, {} entries, {} enqueued, {} duplicates, {} malformed",
            session.url(),
            outcome.load_more_clicks,
            outcome.entries_found,
            outcome.enqueued,
            outcome.duplicates,
            outcome.malformed
        );

        Ok(outcome)
    }

    /// Activates "load more" until a wait for it times out
    ///
    /// Returns the number of successful activations. A timeout is the normal
    /// end of expansion; any other error aborts the listing.
    async fn expand(&self, session: &mut dyn BrowserSession) -> Result<u32, HarvestError> {
        let bound = WaitBound::Bounded(self.load_more_timeout);
        let mut clicks = 0u32;

        loop {
            if clicks >= self.max_load_more_clicks {
                tracing::warn!(
                    "Stopped expanding {} after {} load-more clicks",
                    session.url(),
                    clicks
                );
                break;
            }

            match session.wait_for(&self.selectors.load_more, bound).await {
                Ok(_) => {
                    session.click(&self.selectors.load_more, 0).await?;
                    clicks += 1;
                    tracing::debug!("Load more #{} on {}", clicks, session.url());
                }
                Err(e) if e.is_timeout() => {
                    tracing::debug!("Listing fully expanded after {} clicks", clicks);
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(clicks)
    }

    fn entry_request(
        &self,
        base: &Url,
        href: Option<String>,
        difficulty: Option<String>,
    ) -> EntryResult {
        let Some(href) = href else {
            return EntryResult::Malformed("no detail link".to_string());
        };
        let Some(difficulty) = difficulty else {
            return EntryResult::Malformed(format!("no difficulty for {}", href));
        };
        let Some(url) = resolve_link(&href, base) else {
            return EntryResult::Malformed(format!("unusable link '{}'", href));
        };
        if !self.challenge_pattern.matches(url.as_str()) {
            return EntryResult::Ignored(url.to_string());
        }

        match CrawlRequest::challenge(&url, &href, &difficulty) {
            Some(request) => EntryResult::Request(request),
            None => EntryResult::Malformed(format!("blank difficulty for {}", href)),
        }
    }
}

enum EntryResult {
    Request(CrawlRequest),
    Malformed(String),
    Ignored(String),
}
