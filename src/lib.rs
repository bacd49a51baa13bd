//! thread-mirror: an incremental forum archiver
//!
//! This crate polls a discussion forum's read API and mirrors its threads and
//! posts into a SQLite store. Each invocation is a bounded "round" that
//! discovers new threads, repairs gaps, and catches up on new replies, then
//! reports whether another round is needed.

pub mod api;
pub mod config;
pub mod output;
pub mod storage;
pub mod sync;

use thiserror::Error;

/// Main error type for thread-mirror operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Malformed JSON from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Configuration-specific errors
///
/// Raised while loading a config file, before any engine exists.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

// Re-export commonly used types
pub use api::{Credentials, ForumClient};
pub use config::Config;
pub use output::{MemoryProgress, ProgressLog, TracingProgress};
pub use storage::{SqliteStorage, Storage};
pub use sync::{drive_rounds, DriveSummary, RoundOutcome, SyncEngine, ThreadCheck};
