//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{CommentRecord, NewRound, RoundRecord, ThreadRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Thread not found: {0}")]
    ThreadNotFound(i64),

    #[error("Comment {post_id} belongs to thread {found}, not {expected}")]
    ForeignComment {
        post_id: i64,
        expected: i64,
        found: i64,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every write is an insert-or-update keyed by the forum's own IDs, so
/// repeating a write converges on the same rows instead of duplicating them.
/// Writes that span several rows commit atomically.
pub trait Storage {
    // ===== Frontier Queries =====

    /// Returns the highest stored thread ID, or 0 for an empty store
    fn latest_thread_id(&self) -> StorageResult<i64>;

    /// Checks whether a thread row exists
    fn thread_exists(&self, thread_id: i64) -> StorageResult<bool>;

    /// Checks whether a thread ID has been tombstoned
    fn is_tombstoned(&self, thread_id: i64) -> StorageResult<bool>;

    /// Gets the last recorded reply count for a thread, if it is stored
    fn stored_replies(&self, thread_id: i64) -> StorageResult<Option<i64>>;

    // ===== Thread Persistence =====

    /// Upserts a thread and the comments fetched with it in one transaction
    ///
    /// A new thread row gets every column. An existing row only has
    /// `views`, `replies` and `last_synced` refreshed. Comments behave the
    /// same way with `content` and `raw_payload` as the only mutable columns.
    fn upsert_thread(
        &mut self,
        thread: &ThreadRecord,
        comments: &[CommentRecord],
    ) -> StorageResult<()>;

    /// Upserts newly seen comments and bumps the thread's reply count
    ///
    /// # Arguments
    ///
    /// * `thread_id` - The owning thread
    /// * `replies` - The reply count reported by the forum
    /// * `synced_at` - Unix timestamp written to `last_synced`
    /// * `comments` - The new comments; all must belong to `thread_id`
    fn append_comments(
        &mut self,
        thread_id: i64,
        replies: i64,
        synced_at: i64,
        comments: &[CommentRecord],
    ) -> StorageResult<()>;

    /// Records a thread as inaccessible
    ///
    /// Returns true if the tombstone was newly written. An existing tombstone
    /// is left untouched.
    fn record_missing(&mut self, thread_id: i64, checked_at: i64) -> StorageResult<bool>;

    // ===== Reads for Presentation =====

    /// Gets a thread by ID
    fn get_thread(&self, thread_id: i64) -> StorageResult<Option<ThreadRecord>>;

    /// Gets all comments of a thread ordered by position
    fn get_comments(&self, thread_id: i64) -> StorageResult<Vec<CommentRecord>>;

    /// Gets the most recently synced threads
    fn recent_threads(&self, limit: u32) -> StorageResult<Vec<ThreadRecord>>;

    // ===== Round History =====

    /// Records a completed sync round, returning its ID
    fn record_round(&mut self, round: &NewRound) -> StorageResult<i64>;

    /// Gets the most recent sync round
    fn latest_round(&self) -> StorageResult<Option<RoundRecord>>;

    // ===== Statistics =====

    /// Counts stored threads
    fn count_threads(&self) -> StorageResult<u64>;

    /// Counts stored comments
    fn count_comments(&self) -> StorageResult<u64>;

    /// Counts tombstoned thread IDs
    fn count_tombstones(&self) -> StorageResult<u64>;

    /// Counts recorded sync rounds
    fn count_rounds(&self) -> StorageResult<u64>;
}
