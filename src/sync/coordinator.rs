//! Round orchestration and single-thread checks
//!
//! A round runs the frontier scan, fetches the new threads in bounded
//! batches, repairs gaps in the recent ID window, and finally catches up on
//! replies. Each step derives its starting point from the store, so a round
//! can be repeated at any time.

use crate::api::{Credentials, DetailFetch};
use crate::output::ProgressLog;
use crate::storage::Storage;
use crate::sync::{run_in_chunks, SyncEngine, ThreadFetch};
use crate::SyncError;
use serde::Serialize;

/// Result of one bounded sync round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundOutcome {
    /// True when the round left work behind and should be repeated
    pub has_more: bool,

    /// New threads whose fetch completed without error
    pub processed_new_threads: u32,

    /// Threads updated by the reply catch-up
    pub updated_replies: u32,
}

/// Outcome of an on-demand check of one thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadCheck {
    /// The thread was not stored, so it was fetched in full
    Fetched(ThreadFetch),

    /// The stored reply count matches the forum
    UpToDate {
        /// The stored reply count
        replies: i64,
    },

    /// New posts were fetched incrementally
    Updated {
        /// Number of posts written
        new_comments: usize,
    },

    /// The forum did not return usable thread details; nothing was written
    Unavailable,
}

impl<S: Storage + Send> SyncEngine<S> {
    /// Runs one full sync round
    ///
    /// # Steps
    ///
    /// 1. Scan the newest-threads listing down to the store's highest ID
    /// 2. Fetch up to `new-thread-cap` of the discovered threads,
    ///    `max-concurrent` at a time
    /// 3. Backfill the ID window below the forum's newest thread
    /// 4. Catch up on threads with new replies
    ///
    /// Failures of individual threads are logged and do not end the round.
    /// Store read failures do.
    pub async fn run_round(
        &self,
        credentials: &Credentials,
        progress: &dyn ProgressLog,
    ) -> Result<RoundOutcome, SyncError> {
        let ctx = self.context(credentials, progress);
        progress.line("Starting sync round");

        let scan = ctx.scan_frontier().await?;

        let mut processed_new_threads = 0u32;
        if !scan.to_process().is_empty() {
            let ctx_ref = &ctx;
            let results = run_in_chunks(
                scan.to_process().to_vec(),
                self.limits().max_concurrent,
                |thread_id| async move { (thread_id, ctx_ref.fetch_thread(thread_id).await) },
            )
            .await;

            for (thread_id, result) in results {
                match result {
                    Ok(_) => processed_new_threads += 1,
                    Err(e) => {
                        tracing::warn!("[{}] New thread fetch failed: {}", thread_id, e);
                        progress.line(&format!("[{}] Failed to process thread: {}", thread_id, e));
                    }
                }
            }
            progress.line("New thread sync complete");
        }

        if let Some(api_latest_id) = scan.api_latest_id.filter(|id| *id > 0) {
            ctx.audit_backfill(api_latest_id).await?;
        }

        let catch_up = ctx.catch_up_replies().await?;

        let outcome = RoundOutcome {
            has_more: scan.overflow() || catch_up.has_more_replies,
            processed_new_threads,
            updated_replies: catch_up.updated,
        };

        tracing::info!(
            "Round finished: {} new threads, {} reply updates, more: {}",
            outcome.processed_new_threads,
            outcome.updated_replies,
            outcome.has_more
        );
        progress.line("All sync tasks finished");

        Ok(outcome)
    }

    /// Brings a single thread up to date on demand
    ///
    /// An unknown thread is fetched in full. For a stored thread the first
    /// detail page is read to compare reply counts, and new posts are fetched
    /// incrementally when the forum is ahead.
    pub async fn check_thread(
        &self,
        credentials: &Credentials,
        progress: &dyn ProgressLog,
        thread_id: i64,
    ) -> Result<ThreadCheck, SyncError> {
        let ctx = self.context(credentials, progress);

        let stored = match self.with_storage(|s| s.stored_replies(thread_id))? {
            Some(stored) => stored,
            None => return Ok(ThreadCheck::Fetched(ctx.fetch_thread(thread_id).await?)),
        };

        let page = match self.client.fetch_post_page(credentials, thread_id, 1).await {
            Ok(DetailFetch::Page(page)) => page,
            Ok(DetailFetch::Inaccessible { status }) => {
                tracing::debug!("[{}] Detail returned status {}", thread_id, status);
                return Ok(ThreadCheck::Unavailable);
            }
            Err(e @ (SyncError::HttpStatus { .. } | SyncError::Decode { .. })) => {
                tracing::debug!("[{}] Detail unavailable: {}", thread_id, e);
                return Ok(ThreadCheck::Unavailable);
            }
            Err(e) => return Err(e),
        };

        let api_replies = match page.thread {
            Some(thread) => thread.reply_count(),
            None => return Ok(ThreadCheck::Unavailable),
        };

        if api_replies <= stored {
            return Ok(ThreadCheck::UpToDate { replies: stored });
        }

        progress.line(&format!(
            "[{}] New replies found ({} -> {}), updating",
            thread_id, stored, api_replies
        ));
        let new_comments = ctx
            .fetch_new_comments(thread_id, api_replies, stored)
            .await?;

        Ok(ThreadCheck::Updated { new_comments })
    }
}
