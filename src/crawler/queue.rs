//! Request queue and record sink interfaces
//!
//! Handlers only ever see these two traits. The queue is the single piece of
//! state shared between concurrent handler invocations, so implementations
//! take `&self` and serialize access internally.

use crate::crawler::detail::ChallengeRecord;
use crate::crawler::request::{CrawlRequest, QueuedRequest};
use crate::storage::StorageResult;

/// Durable, URL-deduplicated queue of page-visit tasks
pub trait RequestQueue: Send + Sync {
    /// Adds a request; returns `false` (and changes nothing) if a request
    /// with the same URL was ever enqueued before.
    fn enqueue(&self, request: &CrawlRequest) -> StorageResult<bool>;

    /// Leases the oldest pending request, or `None` if nothing is pending
    fn dequeue(&self) -> StorageResult<Option<QueuedRequest>>;

    /// Marks a leased request as done
    fn mark_handled(&self, id: i64) -> StorageResult<()>;

    /// Returns a leased request to the queue for another attempt
    fn reclaim(&self, id: i64, error: &str) -> StorageResult<()>;

    /// Gives up on a leased request
    fn mark_failed(&self, id: i64, error: &str) -> StorageResult<()>;

    /// Number of requests waiting to be dequeued
    fn pending_count(&self) -> StorageResult<u64>;
}

/// Append-only store of extracted records
pub trait RecordSink: Send + Sync {
    fn append(&self, record: &ChallengeRecord) -> StorageResult<()>;
}
