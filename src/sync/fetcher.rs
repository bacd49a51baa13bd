//! Full thread fetch and persist
//!
//! Fetches the first page of a thread together with its metadata and writes
//! the thread row and every returned post in one transaction.

use crate::api::DetailFetch;
use crate::storage::{CommentRecord, Storage};
use crate::sync::{now_unix, SyncContext};
use crate::SyncError;

/// Outcome of a full thread fetch that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadFetch {
    /// The thread and its first page of posts were written
    Stored {
        /// Number of posts written
        comments: usize,
    },

    /// The forum answered not-found or forbidden and the ID was tombstoned
    Tombstoned {
        /// The HTTP status code
        status: u16,
    },

    /// The response lacked thread metadata or post rows, nothing was written
    Skipped,
}

impl<'a, S: Storage + Send> SyncContext<'a, S> {
    /// Fetches a thread's metadata and first post page and upserts them
    ///
    /// # Outcomes
    ///
    /// | Response | Result |
    /// |----------|--------|
    /// | 2xx with thread and rows | `Stored`, one atomic write |
    /// | 2xx missing thread or rows | `Skipped`, no writes |
    /// | 403, 404 | `Tombstoned`, tombstone inserted if absent |
    /// | other status, transport or JSON failure | `Err` |
    ///
    /// A store write failure is returned as an error as well.
    pub async fn fetch_thread(&self, thread_id: i64) -> Result<ThreadFetch, SyncError> {
        let page = match self
            .client()
            .fetch_post_page(self.credentials, thread_id, 1)
            .await?
        {
            DetailFetch::Page(page) => page,
            DetailFetch::Inaccessible { status } => {
                self.log(&format!(
                    "[{}] Inaccessible (status {}), recording as missing",
                    thread_id, status
                ));
                let checked_at = now_unix();
                self.with_storage(|s| s.record_missing(thread_id, checked_at))?;
                return Ok(ThreadFetch::Tombstoned { status });
            }
        };

        let (thread, posts) = match (page.thread, page.posts) {
            (Some(thread), Some(posts)) => (thread, posts),
            _ => {
                self.log(&format!(
                    "[{}] Incomplete response (no thread or rows), skipping",
                    thread_id
                ));
                return Ok(ThreadFetch::Skipped);
            }
        };

        if thread.thread_id != thread_id {
            tracing::warn!(
                "[{}] Forum returned thread {} instead",
                thread_id,
                thread.thread_id
            );
        }

        let record = thread.to_record(now_unix());
        let comments: Vec<CommentRecord> = posts
            .iter()
            .map(|post| post.to_record(record.thread_id))
            .collect();

        self.with_storage(|s| s.upsert_thread(&record, &comments))?;

        let short_subject: String = record.subject.chars().take(15).collect();
        self.log(&format!(
            "[{}] Synced \"{}\" ({} posts)",
            thread_id,
            short_subject,
            comments.len()
        ));

        Ok(ThreadFetch::Stored {
            comments: comments.len(),
        })
    }
}
