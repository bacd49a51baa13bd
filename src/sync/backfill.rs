//! Gap repair over a window of recent thread IDs
//!
//! Threads can be missed when the listing moves faster than a round reads
//! it. Each round walks the IDs just below the forum's newest thread and
//! fetches any that are neither stored nor tombstoned.

use crate::storage::Storage;
use crate::sync::{SyncContext, ThreadFetch};
use crate::SyncError;

/// Counters for one backfill pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// IDs that were neither stored nor tombstoned and so were fetched
    pub checked: u32,

    /// Fetches that stored a thread
    pub fetched: u32,

    /// Fetches that returned an error
    pub failed: u32,
}

/// Lowest ID of the window ending at `api_latest_id`
pub(crate) fn window_start(api_latest_id: i64, window: u64) -> i64 {
    let window = i64::try_from(window).unwrap_or(i64::MAX);
    api_latest_id.saturating_sub(window).max(1)
}

impl<'a, S: Storage + Send> SyncContext<'a, S> {
    /// Fetches every unknown ID in `[api_latest_id - window, api_latest_id]`
    ///
    /// IDs are visited newest first, one at a time. A failed fetch is logged
    /// and the walk continues. Store read failures abort the pass.
    pub async fn audit_backfill(&self, api_latest_id: i64) -> Result<BackfillReport, SyncError> {
        let lowest = window_start(api_latest_id, self.limits().backfill_window);
        self.log(&format!(
            "Backfill check for thread IDs {}..={}",
            lowest, api_latest_id
        ));

        let mut report = BackfillReport::default();

        for thread_id in (lowest..=api_latest_id).rev() {
            let known = self.with_storage(|s| {
                Ok(s.thread_exists(thread_id)? || s.is_tombstoned(thread_id)?)
            })?;
            if known {
                continue;
            }

            report.checked += 1;
            match self.fetch_thread(thread_id).await {
                Ok(ThreadFetch::Stored { .. }) => report.fetched += 1,
                Ok(_) => {}
                Err(e) => {
                    report.failed += 1;
                    self.log(&format!("[{}] Backfill fetch failed: {}", thread_id, e));
                }
            }
        }

        self.log(&format!(
            "Backfill done: {} checked, {} fetched, {} failed",
            report.checked, report.fetched, report.failed
        ));

        Ok(report)
    }
}
