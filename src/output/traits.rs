//! Output traits and types
//!
//! This module defines the exporter interface and the data structures used
//! for harvest summaries.

use crate::crawler::ChallengeRecord;
use crate::state::RequestState;
use crate::storage::StorageError;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("No harvest runs found in database")]
    NoRuns,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A request that was given up on
#[derive(Debug, Clone)]
pub struct FailedRequest {
    pub url: String,
    pub label: String,
    pub message: String,
    pub retry_count: u32,
}

/// Summary of a harvest run and the data it produced
#[derive(Debug, Clone, Default)]
pub struct HarvestSummary {
    // Run metadata
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,

    // Queue
    pub total_requests: u64,
    pub requests_by_state: HashMap<RequestState, u64>,

    // Records
    pub total_records: u64,
    pub records_by_difficulty: Vec<(String, u64)>,
    pub top_tags: Vec<(String, u64)>,

    pub failed_requests: Vec<FailedRequest>,
}

impl HarvestSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests_in(&self, state: RequestState) -> u64 {
        self.requests_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Handled requests as a percentage of finished ones
    pub fn success_rate(&self) -> f64 {
        let handled = self.requests_in(RequestState::Handled);
        let finished = handled + self.requests_in(RequestState::Failed);
        if finished == 0 {
            return 0.0;
        }
        (handled as f64 / finished as f64) * 100.0
    }
}

/// Outcome of one export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub written: usize,

    /// Records without code or tests
    pub skipped: usize,

    /// `difficulty/title` of records whose starter code has no recognizable
    /// function to scaffold
    pub code_problems: Vec<String>,
}

/// Writes stored records somewhere outside the database
pub trait RecordExporter {
    fn export(&self, records: &[ChallengeRecord]) -> OutputResult<ExportSummary>;
}
