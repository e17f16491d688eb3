//! Thread-safe storage handle
//!
//! Concurrent handlers share one `SqliteStorage` behind a mutex. Every queue
//! and sink call takes the lock for a single statement or short transaction.

use crate::crawler::{ChallengeRecord, CrawlRequest, QueuedRequest, RecordSink, RequestQueue};
use crate::state::RequestState;
use crate::storage::{SqliteStorage, Storage, StorageError, StorageResult};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct SharedStorage {
    inner: Arc<Mutex<SqliteStorage>>,
}

impl SharedStorage {
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            inner: Arc::new(Mutex::new(storage)),
        }
    }

    /// Shared handle over a fresh in-memory database
    pub fn in_memory() -> StorageResult<Self> {
        Ok(Self::new(SqliteStorage::new_in_memory()?))
    }

    /// Locks the underlying storage for direct access
    pub fn lock(&self) -> StorageResult<MutexGuard<'_, SqliteStorage>> {
        self.inner.lock().map_err(|_| StorageError::LockPoisoned)
    }

    pub fn record_count(&self) -> StorageResult<u64> {
        self.lock()?.count_records()
    }
}

impl RequestQueue for SharedStorage {
    fn enqueue(&self, request: &CrawlRequest) -> StorageResult<bool> {
        let inserted = self.lock()?.insert_request(request)?;
        if !inserted {
            tracing::trace!("Already queued: {}", request.url());
        }
        Ok(inserted)
    }

    fn dequeue(&self) -> StorageResult<Option<QueuedRequest>> {
        self.lock()?.lease_next_request()
    }

    fn mark_handled(&self, id: i64) -> StorageResult<()> {
        self.lock()?
            .transition_request(id, RequestState::Handled, None)
    }

    fn reclaim(&self, id: i64, error: &str) -> StorageResult<()> {
        self.lock()?.reclaim_request(id, error)
    }

    fn mark_failed(&self, id: i64, error: &str) -> StorageResult<()> {
        self.lock()?
            .transition_request(id, RequestState::Failed, Some(error))
    }

    fn pending_count(&self) -> StorageResult<u64> {
        self.lock()?.count_requests_by_state(RequestState::Pending)
    }
}

impl RecordSink for SharedStorage {
    fn append(&self, record: &ChallengeRecord) -> StorageResult<()> {
        self.lock()?.insert_record(record)
    }
}
