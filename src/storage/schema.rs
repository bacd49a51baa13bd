//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the mirror database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Mirrored threads, keyed by the forum's own thread ID
CREATE TABLE IF NOT EXISTS threads (
    thread_id INTEGER PRIMARY KEY,
    subject TEXT NOT NULL,
    author TEXT NOT NULL,
    views INTEGER NOT NULL DEFAULT 0,
    replies INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL DEFAULT 0,
    last_synced INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_threads_last_synced ON threads(last_synced);

-- Posts within threads, keyed by the forum's post ID
CREATE TABLE IF NOT EXISTS comments (
    post_id INTEGER PRIMARY KEY,
    thread_id INTEGER NOT NULL,
    position INTEGER NOT NULL DEFAULT 0,
    author TEXT NOT NULL,
    content TEXT NOT NULL,
    post_date INTEGER NOT NULL DEFAULT 0,
    is_first INTEGER NOT NULL DEFAULT 0,
    raw_payload TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_comments_thread ON comments(thread_id, position);

-- Thread IDs the forum answered with not-found or forbidden
CREATE TABLE IF NOT EXISTS missing_threads (
    thread_id INTEGER PRIMARY KEY,
    checked_at INTEGER NOT NULL
);

-- One row per completed sync round, for operator statistics
CREATE TABLE IF NOT EXISTS sync_rounds (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    has_more INTEGER NOT NULL,
    processed_new_threads INTEGER NOT NULL,
    updated_replies INTEGER NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
