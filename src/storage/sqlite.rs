//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CommentRecord, NewRound, RoundRecord, ThreadRecord};
use crate::SyncError;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;

const UPSERT_COMMENT_SQL: &str = "
    INSERT INTO comments (post_id, thread_id, position, author, content, post_date, is_first, raw_payload)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(post_id) DO UPDATE SET
        content = excluded.content,
        raw_payload = excluded.raw_payload";

const THREAD_COLUMNS: &str =
    "thread_id, subject, author, views, replies, created_at, last_synced";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SyncError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SyncError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, SyncError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn thread_from_row(row: &Row<'_>) -> rusqlite::Result<ThreadRecord> {
    Ok(ThreadRecord {
        thread_id: row.get(0)?,
        subject: row.get(1)?,
        author: row.get(2)?,
        views: row.get(3)?,
        replies: row.get(4)?,
        created_at: row.get(5)?,
        last_synced: row.get(6)?,
    })
}

fn round_from_row(row: &Row<'_>) -> rusqlite::Result<RoundRecord> {
    Ok(RoundRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        has_more: row.get(3)?,
        processed_new_threads: row.get(4)?,
        updated_replies: row.get(5)?,
    })
}

/// Writes comments inside an open transaction
fn upsert_comments(
    tx: &Transaction<'_>,
    thread_id: i64,
    comments: &[CommentRecord],
) -> StorageResult<()> {
    let mut stmt = tx.prepare_cached(UPSERT_COMMENT_SQL)?;

    for comment in comments {
        if comment.thread_id != thread_id {
            return Err(StorageError::ForeignComment {
                post_id: comment.post_id,
                expected: thread_id,
                found: comment.thread_id,
            });
        }

        stmt.execute(params![
            comment.post_id,
            comment.thread_id,
            comment.position,
            comment.author,
            comment.content,
            comment.post_date,
            comment.is_first,
            comment.raw_payload,
        ])?;
    }

    Ok(())
}

impl Storage for SqliteStorage {
    // ===== Frontier Queries =====

    fn latest_thread_id(&self) -> StorageResult<i64> {
        let max: Option<i64> =
            self.conn
                .query_row("SELECT MAX(thread_id) FROM threads", [], |row| row.get(0))?;
        Ok(max.unwrap_or(0))
    }

    fn thread_exists(&self, thread_id: i64) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM threads WHERE thread_id = ?1",
                params![thread_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn is_tombstoned(&self, thread_id: i64) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM missing_threads WHERE thread_id = ?1",
                params![thread_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn stored_replies(&self, thread_id: i64) -> StorageResult<Option<i64>> {
        let replies = self
            .conn
            .query_row(
                "SELECT replies FROM threads WHERE thread_id = ?1",
                params![thread_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(replies)
    }

    // ===== Thread Persistence =====

    fn upsert_thread(
        &mut self,
        thread: &ThreadRecord,
        comments: &[CommentRecord],
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO threads (thread_id, subject, author, views, replies, created_at, last_synced)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(thread_id) DO UPDATE SET
                views = excluded.views,
                replies = excluded.replies,
                last_synced = excluded.last_synced",
            params![
                thread.thread_id,
                thread.subject,
                thread.author,
                thread.views,
                thread.replies,
                thread.created_at,
                thread.last_synced,
            ],
        )?;

        upsert_comments(&tx, thread.thread_id, comments)?;

        tx.commit()?;
        Ok(())
    }

    fn append_comments(
        &mut self,
        thread_id: i64,
        replies: i64,
        synced_at: i64,
        comments: &[CommentRecord],
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        upsert_comments(&tx, thread_id, comments)?;

        let updated = tx.execute(
            "UPDATE threads SET replies = ?1, last_synced = ?2 WHERE thread_id = ?3",
            params![replies, synced_at, thread_id],
        )?;

        // Dropping the transaction without commit rolls the comments back
        if updated == 0 {
            return Err(StorageError::ThreadNotFound(thread_id));
        }

        tx.commit()?;
        Ok(())
    }

    fn record_missing(&mut self, thread_id: i64, checked_at: i64) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO missing_threads (thread_id, checked_at) VALUES (?1, ?2)",
            params![thread_id, checked_at],
        )?;
        Ok(inserted > 0)
    }

    // ===== Reads for Presentation =====

    fn get_thread(&self, thread_id: i64) -> StorageResult<Option<ThreadRecord>> {
        let thread = self
            .conn
            .query_row(
                &format!("SELECT {} FROM threads WHERE thread_id = ?1", THREAD_COLUMNS),
                params![thread_id],
                thread_from_row,
            )
            .optional()?;
        Ok(thread)
    }

    fn get_comments(&self, thread_id: i64) -> StorageResult<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT post_id, thread_id, position, author, content, post_date, is_first, raw_payload
             FROM comments WHERE thread_id = ?1 ORDER BY position ASC, post_id ASC",
        )?;

        let comments = stmt
            .query_map(params![thread_id], |row| {
                Ok(CommentRecord {
                    post_id: row.get(0)?,
                    thread_id: row.get(1)?,
                    position: row.get(2)?,
                    author: row.get(3)?,
                    content: row.get(4)?,
                    post_date: row.get(5)?,
                    is_first: row.get(6)?,
                    raw_payload: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    fn recent_threads(&self, limit: u32) -> StorageResult<Vec<ThreadRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM threads ORDER BY last_synced DESC, thread_id DESC LIMIT ?1",
            THREAD_COLUMNS
        ))?;

        let threads = stmt
            .query_map(params![limit], thread_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(threads)
    }

    // ===== Round History =====

    fn record_round(&mut self, round: &NewRound) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO sync_rounds (started_at, finished_at, has_more, processed_new_threads, updated_replies)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                round.started_at,
                round.finished_at,
                round.has_more,
                round.processed_new_threads,
                round.updated_replies,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn latest_round(&self) -> StorageResult<Option<RoundRecord>> {
        let round = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, has_more, processed_new_threads, updated_replies
                 FROM sync_rounds ORDER BY id DESC LIMIT 1",
                [],
                round_from_row,
            )
            .optional()?;
        Ok(round)
    }

    // ===== Statistics =====

    fn count_threads(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM threads", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_comments(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_tombstones(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM missing_threads", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_rounds(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sync_rounds", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
