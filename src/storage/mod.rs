//! Storage module for persisting mirrored forum data
//!
//! This module handles all database operations for the mirror, including:
//! - SQLite database initialization and schema management
//! - Idempotent thread and comment upserts
//! - Tombstones for inaccessible thread IDs
//! - Sync round history for statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::SyncError;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SyncError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SyncError> {
    SqliteStorage::new(path)
}

/// A mirrored thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRecord {
    pub thread_id: i64,
    pub subject: String,
    pub author: String,
    pub views: i64,
    pub replies: i64,
    /// Unix timestamp of the thread's creation on the forum
    pub created_at: i64,
    /// Unix timestamp of the last write touching this thread
    pub last_synced: i64,
}

/// A mirrored post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub post_id: i64,
    pub thread_id: i64,
    /// 1-based floor number within the thread
    pub position: i64,
    pub author: String,
    pub content: String,
    /// Unix timestamp of the post on the forum
    pub post_date: i64,
    pub is_first: bool,
    /// The post exactly as the forum returned it, as JSON
    pub raw_payload: String,
}

/// A sync round about to be recorded
#[derive(Debug, Clone)]
pub struct NewRound {
    pub started_at: String,
    pub finished_at: String,
    pub has_more: bool,
    pub processed_new_threads: u32,
    pub updated_replies: u32,
}

/// A recorded sync round
#[derive(Debug, Clone)]
pub struct RoundRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: String,
    pub has_more: bool,
    pub processed_new_threads: u32,
    pub updated_replies: u32,
}
