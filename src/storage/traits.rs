//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::{ChallengeRecord, CrawlRequest, QueuedRequest};
use crate::state::RequestState;
use crate::storage::{RequestRecord, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Request not found: {0}")]
    RequestNotFound(i64),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Invalid state transition for request {id}: {from} -> {to}")]
    InvalidTransition {
        id: i64,
        from: RequestState,
        to: RequestState,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the crawler.
/// Callers that share a backend between tasks wrap it in
/// [`SharedStorage`](crate::storage::SharedStorage).
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run and returns its ID
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Updates the status of a run
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Request Queue =====

    /// Inserts a pending request unless its URL is already known
    ///
    /// Returns `true` if a row was inserted.
    fn insert_request(&mut self, request: &CrawlRequest) -> StorageResult<bool>;

    /// Moves the oldest pending request to `InProgress` and returns it
    ///
    /// Rows that cannot be rebuilt into a request are marked failed and
    /// skipped.
    fn lease_next_request(&mut self) -> StorageResult<Option<QueuedRequest>>;

    /// Moves a request to a new state, enforcing the lifecycle
    fn transition_request(
        &mut self,
        id: i64,
        to: RequestState,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    /// Puts a leased request back to pending and bumps its retry count
    fn reclaim_request(&mut self, id: i64, error_message: &str) -> StorageResult<()>;

    /// Returns requests left in progress by an interrupted run to the queue
    fn reset_interrupted_requests(&mut self) -> StorageResult<u64>;

    /// Gets a request row by ID
    fn get_request(&self, id: i64) -> StorageResult<RequestRecord>;

    /// Gets all request rows in a state, oldest first
    fn get_requests_by_state(&self, state: RequestState) -> StorageResult<Vec<RequestRecord>>;

    /// Counts request rows in a state
    fn count_requests_by_state(&self, state: RequestState) -> StorageResult<u64>;

    /// Gets total request count
    fn count_total_requests(&self) -> StorageResult<u64>;

    // ===== Records =====

    /// Stores a record, replacing any earlier record for the same page
    fn insert_record(&mut self, record: &ChallengeRecord) -> StorageResult<()>;

    /// Gets every stored record in insertion order
    fn get_records(&self) -> StorageResult<Vec<ChallengeRecord>>;

    /// Gets total record count
    fn count_records(&self) -> StorageResult<u64>;

    /// Record counts per difficulty label, most common first
    fn count_records_by_difficulty(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Tag usage counts across all records, most common first
    fn count_tags(&self) -> StorageResult<Vec<(String, u64)>>;

    // ===== Maintenance =====

    /// Drops all queued requests and records
    fn clear_crawl_data(&mut self) -> StorageResult<()>;
}
