//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::{ChallengeRecord, CrawlRequest, QueuedRequest, RequestLabel};
use crate::state::RequestState;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RequestRecord, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

const REQUEST_COLUMNS: &str = "id, url, label, difficulty, original_url, state, retry_count,
     error_message, enqueued_at, updated_at";

const RECORD_COLUMNS: &str = "source_url, challenge_id, author_id, author_url, difficulty,
     title, tags, instructions, code, tests";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(RunStatus::Running),
        })
    }

    fn request_from_row(row: &Row<'_>) -> rusqlite::Result<RequestRecord> {
        let label: Option<String> = row.get(2)?;
        let state: String = row.get(5)?;
        Ok(RequestRecord {
            id: row.get(0)?,
            url: row.get(1)?,
            label: RequestLabel::from_db_string(label.as_deref()),
            difficulty: row.get(3)?,
            original_url: row.get(4)?,
            state: RequestState::from_db_string(&state).unwrap_or(RequestState::Failed),
            retry_count: row.get(6)?,
            error_message: row.get(7)?,
            enqueued_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn record_from_row(row: &Row<'_>) -> rusqlite::Result<(ChallengeRecord, String)> {
        let tags_json: String = row.get(6)?;
        let record = ChallengeRecord {
            source_url: row.get(0)?,
            challenge_id: row.get(1)?,
            author_id: row.get(2)?,
            author_url: row.get(3)?,
            difficulty: row.get(4)?,
            title: row.get(5)?,
            tags: Vec::new(),
            instructions: row.get(7)?,
            code: row.get(8)?,
            tests: row.get(9)?,
        };
        Ok((record, tags_json))
    }

    fn decode_tags(json: &str) -> StorageResult<Vec<String>> {
        serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                Self::run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                Self::run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE id = ?2",
            params![status.to_db_string(), run_id],
        )?;
        Ok(())
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Completed.to_db_string(), now, run_id],
        )?;
        Ok(())
    }

    // ===== Request Queue =====

    fn insert_request(&mut self, request: &CrawlRequest) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO requests
             (url, label, difficulty, original_url, state, enqueued_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                request.url(),
                request.label().to_db_string(),
                request.difficulty(),
                request.original_url(),
                RequestState::Pending.to_db_string(),
                now
            ],
        )?;
        Ok(inserted > 0)
    }

    fn lease_next_request(&mut self) -> StorageResult<Option<QueuedRequest>> {
        loop {
            let row = self
                .conn
                .query_row(
                    &format!(
                        "SELECT {} FROM requests WHERE state = ?1 ORDER BY id ASC LIMIT 1",
                        REQUEST_COLUMNS
                    ),
                    params![RequestState::Pending.to_db_string()],
                    Self::request_from_row,
                )
                .optional()?;

            let Some(row) = row else {
                return Ok(None);
            };

            let rebuilt = CrawlRequest::from_parts(
                row.label,
                row.url.clone(),
                row.difficulty.clone(),
                row.original_url.clone(),
            );

            match rebuilt {
                Some(request) => {
                    self.transition_request(row.id, RequestState::InProgress, None)?;
                    return Ok(Some(QueuedRequest {
                        id: row.id,
                        request,
                        retry_count: row.retry_count,
                    }));
                }
                None => {
                    tracing::warn!("Dropping unusable queue row {} ({})", row.id, row.url);
                    let now = Utc::now().to_rfc3339();
                    self.conn.execute(
                        "UPDATE requests SET state = ?1, error_message = ?2, updated_at = ?3 WHERE id = ?4",
                        params![
                            RequestState::Failed.to_db_string(),
                            "challenge request without difficulty",
                            now,
                            row.id
                        ],
                    )?;
                }
            }
        }
    }

    fn transition_request(
        &mut self,
        id: i64,
        to: RequestState,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let from = self.get_request(id)?.state;
        if !from.can_transition_to(to) {
            return Err(StorageError::InvalidTransition { id, from, to });
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE requests SET state = ?1, error_message = COALESCE(?2, error_message),
             updated_at = ?3 WHERE id = ?4",
            params![to.to_db_string(), error_message, now, id],
        )?;
        Ok(())
    }

    fn reclaim_request(&mut self, id: i64, error_message: &str) -> StorageResult<()> {
        self.transition_request(id, RequestState::Pending, Some(error_message))?;
        self.conn.execute(
            "UPDATE requests SET retry_count = retry_count + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    fn reset_interrupted_requests(&mut self) -> StorageResult<u64> {
        let now = Utc::now().to_rfc3339();
        let reset = self.conn.execute(
            "UPDATE requests SET state = ?1, updated_at = ?2 WHERE state = ?3",
            params![
                RequestState::Pending.to_db_string(),
                now,
                RequestState::InProgress.to_db_string()
            ],
        )?;
        Ok(reset as u64)
    }

    fn get_request(&self, id: i64) -> StorageResult<RequestRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM requests WHERE id = ?1", REQUEST_COLUMNS),
                params![id],
                Self::request_from_row,
            )
            .optional()?
            .ok_or(StorageError::RequestNotFound(id))
    }

    fn get_requests_by_state(&self, state: RequestState) -> StorageResult<Vec<RequestRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM requests WHERE state = ?1 ORDER BY id ASC",
            REQUEST_COLUMNS
        ))?;

        let requests = stmt
            .query_map(params![state.to_db_string()], Self::request_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(requests)
    }

    fn count_requests_by_state(&self, state: RequestState) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM requests WHERE state = ?1",
            params![state.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_total_requests(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM requests", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Records =====

    fn insert_record(&mut self, record: &ChallengeRecord) -> StorageResult<()> {
        let tags = serde_json::to_string(&record.tags)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO records
             (source_url, challenge_id, author_id, author_url, difficulty, title, tags,
              instructions, code, tests, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(source_url) DO UPDATE SET
                challenge_id = excluded.challenge_id,
                author_id = excluded.author_id,
                author_url = excluded.author_url,
                difficulty = excluded.difficulty,
                title = excluded.title,
                tags = excluded.tags,
                instructions = excluded.instructions,
                code = excluded.code,
                tests = excluded.tests,
                scraped_at = excluded.scraped_at",
            params![
                record.source_url,
                record.challenge_id,
                record.author_id,
                record.author_url,
                record.difficulty,
                record.title,
                tags,
                record.instructions,
                record.code,
                record.tests,
                now
            ],
        )?;
        Ok(())
    }

    fn get_records(&self) -> StorageResult<Vec<ChallengeRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM records ORDER BY id ASC",
            RECORD_COLUMNS
        ))?;

        let rows = stmt
            .query_map([], Self::record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mut record, tags_json)| {
                record.tags = Self::decode_tags(&tags_json)?;
                Ok(record)
            })
            .collect()
    }

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_records_by_difficulty(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT difficulty, COUNT(*) AS count FROM records
             GROUP BY difficulty ORDER BY count DESC, difficulty ASC",
        )?;

        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn count_tags(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare("SELECT tags FROM records")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts: HashMap<String, u64> = HashMap::new();
        for json in rows {
            for tag in Self::decode_tags(&json)? {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }

        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts)
    }

    // ===== Maintenance =====

    fn clear_crawl_data(&mut self) -> StorageResult<()> {
        self.conn
            .execute_batch("DELETE FROM requests; DELETE FROM records;")?;
        Ok(())
    }
}
