use serde::Deserialize;

/// Main configuration structure for thread-mirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub sync: SyncLimits,
    pub output: OutputConfig,
}

/// Remote forum API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the forum (e.g., "https://bbs.example.edu.cn")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Number of posts the detail endpoint returns per page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Whole-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// Per-round budgets that bound the work done by one invocation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SyncLimits {
    /// Simultaneous thread fetches in a batch
    pub max_concurrent: usize,

    /// Listing pages scanned for new threads
    pub new_thread_page_cap: u32,

    /// New threads handed to processing per round
    pub new_thread_cap: usize,

    /// IDs below the newest listed thread re-checked for gaps
    pub backfill_window: u64,

    /// Listing pages scanned for reply growth
    pub reply_page_cap: u32,

    /// Threads updated by the reply catch-up per round
    pub reply_update_budget: usize,

    /// Post pages fetched per incremental comment update
    pub comment_page_cap: u32,

    /// Rounds run back-to-back before giving up on `has_more`
    pub max_rounds: u32,
}

impl Default for SyncLimits {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            new_thread_page_cap: 3,
            new_thread_cap: 15,
            backfill_window: 100,
            reply_page_cap: 3,
            reply_update_budget: 8,
            comment_page_cap: 4,
            max_rounds: 20,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_user_agent() -> String {
    format!("thread-mirror/{}", env!("CARGO_PKG_VERSION"))
}

fn default_page_size() -> u32 {
    20
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}
