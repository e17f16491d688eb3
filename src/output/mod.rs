//! Output module for harvest summaries and exports
//!
//! This module handles:
//! - Generating markdown summaries of harvest results
//! - Printing statistics
//! - Exporting records as a JSON dataset or as scaffolded exercise folders

mod dataset;
mod markdown;
mod scaffold;
pub mod stats;
mod traits;

pub use dataset::{slugify, DatasetExporter, ExerciseExporter};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use scaffold::{leading_function, package_json, starter_code};
pub use stats::{load_statistics, print_statistics, HarvestStatistics};
pub use traits::{
    ExportSummary, FailedRequest, HarvestSummary, OutputError, OutputResult, RecordExporter,
};

use crate::state::RequestState;
use crate::storage::Storage;
use chrono::{DateTime, Utc};

/// Builds a harvest summary for the most recent run
pub fn generate_summary(storage: &dyn Storage) -> OutputResult<HarvestSummary> {
    let run = storage.get_latest_run()?.ok_or(OutputError::NoRuns)?;

    let duration_seconds = match (
        run.started_at.parse::<DateTime<Utc>>(),
        run.finished_at.as_deref().map(str::parse::<DateTime<Utc>>),
    ) {
        (Ok(started), Some(Ok(finished))) => Some((finished - started).num_seconds().max(0) as u64),
        _ => None,
    };

    let stats = load_statistics(storage)?;

    let failed_requests = storage
        .get_requests_by_state(RequestState::Failed)?
        .into_iter()
        .map(|request| FailedRequest {
            url: request.url,
            label: request.label.to_string(),
            message: request.error_message.unwrap_or_default(),
            retry_count: request.retry_count,
        })
        .collect();

    Ok(HarvestSummary {
        run_id: run.id,
        started_at: run.started_at,
        finished_at: run.finished_at,
        duration_seconds,
        status: run.status.to_db_string().to_string(),
        config_hash: run.config_hash,
        total_requests: stats.total_requests,
        requests_by_state: stats.requests_by_state,
        total_records: stats.total_records,
        records_by_difficulty: stats.records_by_difficulty,
        top_tags: stats.top_tags,
        failed_requests,
    })
}
