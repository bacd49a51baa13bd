//! Reply catch-up driven by the "newest replies" listing
//!
//! The listing orders threads by their latest reply. Walking it and comparing
//! each reported reply count against the stored one finds the threads that
//! grew since they were last synced. A page on which nothing needed an update
//! means the backlog is cleared.

use crate::api::Listing;
use crate::storage::Storage;
use crate::sync::SyncContext;
use crate::SyncError;

/// Counters and continuation signal for one catch-up pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatchUpReport {
    /// Threads whose update completed without error
    pub updated: u32,

    /// Threads that needed an update but were left for a later round
    pub deferred: u32,

    /// Threads whose update returned an error
    pub failed: u32,

    /// False only when a whole listing page needed no update
    pub has_more_replies: bool,

    /// Listing pages fetched successfully
    pub pages_scanned: u32,
}

impl<'a, S: Storage + Send> SyncContext<'a, S> {
    /// Walks the newest-replies listing and syncs threads that grew
    ///
    /// # Dispatch
    ///
    /// | Stored replies | Listing replies | Action |
    /// |----------------|-----------------|--------|
    /// | none | any | full fetch |
    /// | `n` | `> n` | incremental fetch past position `n` |
    /// | `n` | `<= n` | nothing |
    ///
    /// At most `reply-update-budget` updates are started per pass. Threads
    /// past the budget still mark their page as needing updates, so the pass
    /// reports more work instead of a false steady state.
    ///
    /// # Termination
    ///
    /// A page needing zero updates ends the pass with `has_more_replies`
    /// false. An empty page, a failed page, or the page cap end it with
    /// `has_more_replies` true.
    pub async fn catch_up_replies(&self) -> Result<CatchUpReport, SyncError> {
        self.log("Checking threads with new replies");

        let budget = self.limits().reply_update_budget;
        let mut dispatched = 0usize;
        let mut report = CatchUpReport {
            has_more_replies: true,
            ..CatchUpReport::default()
        };

        for page in 1..=self.limits().reply_page_cap {
            self.log(&format!("Requesting newest replies, page {}", page));

            let entries = match self
                .client()
                .fetch_listing(self.credentials, Listing::NewReplies, page)
                .await
            {
                Ok(entries) => entries,
                Err(e) => {
                    self.log(&format!("Newest replies page {} failed: {}", page, e));
                    break;
                }
            };
            report.pages_scanned += 1;

            if entries.is_empty() {
                self.log("Newest replies listing is empty");
                break;
            }

            let mut page_needs_update = 0u32;

            for entry in entries {
                let stored = self
                    .with_storage(|s| s.stored_replies(entry.thread_id))?
                    .unwrap_or(-1);

                if entry.replies <= stored {
                    continue;
                }
                page_needs_update += 1;

                if dispatched >= budget {
                    report.deferred += 1;
                    continue;
                }
                dispatched += 1;

                let result = if stored < 0 {
                    self.fetch_thread(entry.thread_id).await.map(|_| ())
                } else {
                    self.fetch_new_comments(entry.thread_id, entry.replies, stored)
                        .await
                        .map(|_| ())
                };

                match result {
                    Ok(()) => report.updated += 1,
                    Err(e) => {
                        report.failed += 1;
                        self.log(&format!("[{}] Reply update failed: {}", entry.thread_id, e));
                    }
                }
            }

            if page_needs_update == 0 {
                self.log("Whole page up to date, reply sync complete");
                report.has_more_replies = false;
                break;
            }
        }

        self.log(&format!(
            "Reply sync finished: {} updated, {} deferred, {} failed",
            report.updated, report.deferred, report.failed
        ));

        Ok(report)
    }
}
