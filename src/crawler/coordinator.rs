//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl driver that:
//! - Opens storage and creates or resumes a run
//! - Seeds the queue with the listing page
//! - Leases requests into a bounded pool of handler tasks
//! - Applies the request ceiling, handler timeout and retry policy
//! - Marks the run finished

use crate::config::Config;
use crate::crawler::browser::{Browser, WaitBound};
use crate::crawler::detail::DetailHandler;
use crate::crawler::listing::ListingHandler;
use crate::crawler::queue::RequestQueue;
use crate::crawler::request::{classify, CrawlRequest, QueuedRequest, RequestLabel};
use crate::crawler::static_browser::StaticBrowser;
use crate::crawler::build_http_client;
use crate::storage::{RunStatus, SharedStorage, SqliteStorage, Storage};
use crate::url::{normalize_url, PseudoUrl};
use crate::HarvestError;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// Totals for one `Coordinator::run`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Handler invocations started, retries included
    pub dispatched: u64,

    /// Requests whose handler completed
    pub handled: u64,

    /// Requests given up on after their last retry
    pub failed: u64,

    /// Attempts that failed and were put back on the queue
    pub retried: u64,

    /// Records written during this run
    pub records: u64,
}

/// What happened to one leased request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskOutcome {
    Handled,
    Retried,
    Failed,
}

/// State shared by every handler task
struct CrawlContext {
    config: Config,
    storage: SharedStorage,
    browser: Arc<dyn Browser>,
    challenge_pattern: PseudoUrl,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    context: Arc<CrawlContext>,
    run_id: i64,
}

impl Coordinator {
    /// Creates a coordinator over the configured database and the static
    /// browser driver
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `config_hash` - Hash of the configuration file, recorded on the run
    /// * `fresh` - Whether to clear the queue and records first
    pub fn new(config: Config, config_hash: &str, fresh: bool) -> Result<Self, HarvestError> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let client = build_http_client(&config.user_agent)?;
        let browser = Arc::new(StaticBrowser::new(client));

        Self::with_browser(config, SharedStorage::new(storage), browser, config_hash, fresh)
    }

    /// Creates a coordinator with explicit storage and browser driver
    pub fn with_browser(
        config: Config,
        storage: SharedStorage,
        browser: Arc<dyn Browser>,
        config_hash: &str,
        fresh: bool,
    ) -> Result<Self, HarvestError> {
        let challenge_pattern = PseudoUrl::new(&config.site.challenge_url_pattern)?;

        let run_id = {
            let mut db = storage.lock()?;

            if fresh {
                tracing::info!("Fresh run requested, clearing queue and records");
                db.clear_crawl_data()?;
                db.create_run(config_hash)?
            } else {
                match db.get_latest_run()? {
                    Some(latest) if latest.status == RunStatus::Running => {
                        let reset = db.reset_interrupted_requests()?;
                        tracing::info!(
                            "Resuming interrupted run {} ({} requests returned to the queue)",
                            latest.id,
                            reset
                        );
                        latest.id
                    }
                    _ => {
                        let reset = db.reset_interrupted_requests()?;
                        if reset > 0 {
                            tracing::warn!("{} stale in-progress requests returned to the queue", reset);
                        }
                        tracing::info!("Starting new run");
                        db.create_run(config_hash)?
                    }
                }
            }
        };

        let seed = CrawlRequest::listing(&normalize_url(&config.site.seed_url)?);
        if storage.enqueue(&seed)? {
            tracing::info!("Seeded queue with {}", seed.url());
        } else {
            tracing::debug!("Seed {} already known", seed.url());
        }

        Ok(Self {
            context: Arc::new(CrawlContext {
                config,
                storage,
                browser,
                challenge_pattern,
            }),
            run_id,
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Runs the crawl until the queue drains or the request ceiling is hit
    ///
    /// The run is marked completed on success and failed if a systemic
    /// error (storage, task panic) aborts it.
    pub async fn run(&mut self) -> Result<CrawlReport, HarvestError> {
        tracing::info!("Starting crawl run {}", self.run_id);
        let start_time = Instant::now();

        let result = self.drive().await;

        let mut db = self.context.storage.lock()?;
        match &result {
            Ok(report) => {
                db.complete_run(self.run_id)?;
                tracing::info!(
                    "Crawl completed in {:?}: {} dispatched, {} handled, {} failed, {} records",
                    start_time.elapsed(),
                    report.dispatched,
                    report.handled,
                    report.failed,
                    report.records
                );
            }
            Err(e) => {
                tracing::error!("Crawl run {} aborted: {}", self.run_id, e);
                db.update_run_status(self.run_id, RunStatus::Failed)?;
            }
        }

        result
    }

    async fn drive(&self) -> Result<CrawlReport, HarvestError> {
        let crawler = &self.context.config.crawler;
        let ceiling = u64::from(crawler.max_requests_per_crawl);
        let semaphore = Arc::new(Semaphore::new(crawler.max_concurrency as usize));
        let records_before = self.context.storage.record_count()?;

        let mut report = CrawlReport::default();
        let mut tasks: JoinSet<Result<TaskOutcome, HarvestError>> = JoinSet::new();
        let start_time = Instant::now();

        loop {
            if report.dispatched >= ceiling {
                tracing::info!("Reached max-requests-per-crawl ({})", ceiling);
                break;
            }

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| HarvestError::Task(e.to_string()))?;

            match self.context.storage.dequeue()? {
                Some(queued) => {
                    let context = Arc::clone(&self.context);
                    tasks.spawn(async move {
                        let _permit = permit;
                        process_request(&context, queued).await
                    });
                    report.dispatched += 1;
                }
                None => {
                    drop(permit);
                    // In-flight handlers may still enqueue work
                    match tasks.join_next().await {
                        Some(joined) => tally(joined, &mut report, start_time)?,
                        None => {
                            tracing::info!("Queue is empty, crawl complete");
                            break;
                        }
                    }
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            tally(joined, &mut report, start_time)?;
        }

        report.records = self
            .context
            .storage
            .record_count()?
            .saturating_sub(records_before);
        Ok(report)
    }
}

fn tally(
    joined: Result<Result<TaskOutcome, HarvestError>, JoinError>,
    report: &mut CrawlReport,
    start_time: Instant,
) -> Result<(), HarvestError> {
    let outcome = joined.map_err(|e| HarvestError::Task(e.to_string()))??;
    match outcome {
        TaskOutcome::Handled => report.handled += 1,
        TaskOutcome::Retried => report.retried += 1,
        TaskOutcome::Failed => report.failed += 1,
    }

    let finished = report.handled + report.retried + report.failed;
    if finished % 10 == 0 {
        let rate = finished as f64 / start_time.elapsed().as_secs_f64().max(f64::EPSILON);
        tracing::info!(
            "Progress: {} requests finished ({} handled, {} failed), {:.2} requests/sec",
            finished,
            report.handled,
            report.failed,
            rate
        );
    }

    Ok(())
}

/// Runs one handler under the timeout and settles the request in the queue
///
/// Handler errors are per-request losses. Storage failures, whether raised
/// by the queue inside a handler or while settling, escape and abort the run;
/// the request stays in progress and is reset on the next resume.
async fn process_request(
    context: &CrawlContext,
    queued: QueuedRequest,
) -> Result<TaskOutcome, HarvestError> {
    let crawler = &context.config.crawler;
    let url = queued.request.url().to_string();

    let result = match tokio::time::timeout(
        crawler.handler_timeout(),
        handle_request(context, &queued.request),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(HarvestError::HandlerTimeout {
            url: url.clone(),
            seconds: crawler.handler_timeout_secs,
        }),
    };

    let storage = &context.storage;
    match result {
        Err(HarvestError::Storage(e)) => {
            tracing::error!("Storage failed while handling {}: {}", url, e);
            Err(HarvestError::Storage(e))
        }
        Ok(()) => {
            storage.mark_handled(queued.id)?;
            Ok(TaskOutcome::Handled)
        }
        Err(e) if queued.retry_count < crawler.max_request_retries => {
            tracing::warn!(
                "Request {} failed (attempt {}), will retry: {}",
                url,
                queued.retry_count + 1,
                e
            );
            storage.reclaim(queued.id, &e.to_string())?;
            Ok(TaskOutcome::Retried)
        }
        Err(e) => {
            tracing::error!(
                "Request {} failed after {} attempts: {}",
                url,
                queued.retry_count + 1,
                e
            );
            storage.mark_failed(queued.id, &e.to_string())?;
            Ok(TaskOutcome::Failed)
        }
    }
}

/// Opens the page and hands it to the handler its label selects
async fn handle_request(
    context: &CrawlContext,
    request: &CrawlRequest,
) -> Result<(), HarvestError> {
    let crawler = &context.config.crawler;
    let mut session = context.browser.open(request.url()).await?;

    match session.title().await {
        Ok(title) => tracing::info!(
            "Title of {}: {}",
            request.url(),
            title.as_deref().unwrap_or("(untitled)")
        ),
        Err(e) => tracing::debug!("No title for {}: {}", request.url(), e),
    }

    match classify(request) {
        RequestLabel::Listing => {
            let handler = ListingHandler::new(
                &context.config.listing,
                &context.challenge_pattern,
                crawler.load_more_timeout(),
                crawler.max_load_more_clicks,
            );
            handler.handle(session.as_mut(), &context.storage).await?;
        }
        RequestLabel::Challenge => {
            let handler = DetailHandler::new(
                &context.config.detail,
                WaitBound::from_option(crawler.content_timeout()),
                context.challenge_pattern.literal_prefix(),
            );
            let difficulty = request.difficulty().unwrap_or_default();
            handler
                .handle(session.as_mut(), difficulty, &context.storage)
                .await?;
        }
    }

    Ok(())
}

/// Runs the main crawl operation
///
/// # Example
///
/// ```no_run
/// use kata_harvest::config::load_config_with_hash;
/// use kata_harvest::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("harvest.toml"))?;
/// let report = run_crawl(config, &hash, false).await?;
/// println!("{} records", report.records);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    config_hash: &str,
    fresh: bool,
) -> Result<CrawlReport, HarvestError> {
    let mut coordinator = Coordinator::new(config, config_hash, fresh)?;
    coordinator.run().await
}
