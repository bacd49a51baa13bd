//! Wire types for the forum's JSON read API
//!
//! Every response is wrapped in a `{"data": {...}}` envelope. Fields the
//! forum sometimes omits are optional here and receive their defaults when
//! converted into storage records.

use crate::storage::{CommentRecord, ThreadRecord};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Subject stored for threads the forum returns without one
pub const DEFAULT_SUBJECT: &str = "无标题";

/// Author stored for threads and posts the forum returns without one
pub const DEFAULT_AUTHOR: &str = "未知用户";

/// The `{"data": ...}` envelope around every response
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

/// Which "top list" to page through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// Newest threads first
    NewThreads,
    /// Threads ordered by most recent reply
    NewReplies,
}

impl Listing {
    /// The `idlist` query value selecting this listing
    pub fn id_list(&self) -> &'static str {
        match self {
            Self::NewThreads => "newthread",
            Self::NewReplies => "newreply",
        }
    }
}

/// Body of a listing response
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListingData {
    #[serde(default)]
    pub newthread: Option<Vec<ListingEntry>>,
    #[serde(default)]
    pub newreply: Option<Vec<ListingEntry>>,
}

impl ListingData {
    pub fn into_entries(self, listing: Listing) -> Vec<ListingEntry> {
        match listing {
            Listing::NewThreads => self.newthread,
            Listing::NewReplies => self.newreply,
        }
        .unwrap_or_default()
    }
}

/// One item of a listing page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListingEntry {
    pub thread_id: i64,
    #[serde(default)]
    pub replies: i64,
}

/// Body of a thread detail response, before thread and rows are interpreted
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DetailData {
    #[serde(default)]
    pub thread: Option<Value>,
    #[serde(default)]
    pub rows: Option<Vec<Value>>,
}

/// Thread metadata from the detail endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteThread {
    pub thread_id: i64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub views: Option<i64>,
    #[serde(default)]
    pub replies: Option<i64>,
    /// Creation time as a Unix timestamp
    #[serde(default)]
    pub dateline: Option<i64>,
}

impl RemoteThread {
    /// The reply count the forum currently reports
    pub fn reply_count(&self) -> i64 {
        self.replies.unwrap_or(0)
    }

    pub fn to_record(&self, synced_at: i64) -> ThreadRecord {
        ThreadRecord {
            thread_id: self.thread_id,
            subject: self
                .subject
                .clone()
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            author: self
                .author
                .clone()
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            views: self.views.unwrap_or(0),
            replies: self.reply_count(),
            created_at: self.dateline.unwrap_or(0),
            last_synced: synced_at,
        }
    }
}

/// A single post row, keeping the original JSON alongside the parsed fields
#[derive(Debug, Clone)]
pub struct RemotePost {
    pub fields: PostFields,
    pub raw: Value,
}

/// The post fields the mirror models explicitly
#[derive(Debug, Clone, Deserialize)]
pub struct PostFields {
    pub post_id: i64,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub dateline: Option<i64>,
    #[serde(default, deserialize_with = "flag")]
    pub is_first: bool,
}

impl RemotePost {
    /// Interprets a raw post row
    pub fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        let fields = PostFields::deserialize(&raw)?;
        Ok(Self { fields, raw })
    }

    pub fn position(&self) -> i64 {
        self.fields.position.unwrap_or(0)
    }

    pub fn to_record(&self, thread_id: i64) -> CommentRecord {
        CommentRecord {
            post_id: self.fields.post_id,
            thread_id,
            position: self.position(),
            author: self
                .fields
                .author
                .clone()
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            content: self.fields.message.clone().unwrap_or_default(),
            post_date: self.fields.dateline.unwrap_or(0),
            is_first: self.fields.is_first,
            raw_payload: self.raw.to_string(),
        }
    }
}

/// One page of the thread detail endpoint
#[derive(Debug, Clone)]
pub struct PostPage {
    /// Thread metadata, absent when the forum omits it
    pub thread: Option<RemoteThread>,
    /// Parsed post rows, absent when the forum omits the row list
    pub posts: Option<Vec<RemotePost>>,
    /// Number of rows on the page, including rows that failed to parse
    pub row_count: usize,
}

impl PostPage {
    pub(crate) fn from_detail(data: DetailData, thread_id: i64) -> Self {
        let row_count = data.rows.as_ref().map_or(0, Vec::len);

        let thread = data
            .thread
            .filter(|value| !value.is_null())
            .and_then(|value| match RemoteThread::deserialize(&value) {
                Ok(thread) => Some(thread),
                Err(e) => {
                    tracing::warn!("[{}] Unreadable thread metadata: {}", thread_id, e);
                    None
                }
            });

        let posts = data.rows.map(|rows| {
            rows.into_iter()
                .filter_map(|row| match RemotePost::from_value(row) {
                    Ok(post) => Some(post),
                    Err(e) => {
                        tracing::warn!("[{}] Skipping unreadable post row: {}", thread_id, e);
                        None
                    }
                })
                .collect()
        });

        Self {
            thread,
            posts,
            row_count,
        }
    }
}

/// Accepts 0/1, true/false, or "0"/"1" for boolean flags
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64().map_or(false, |v| v != 0),
        Value::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}
