//! Discovery of threads newer than anything stored

use crate::api::Listing;
use crate::storage::Storage;
use crate::sync::SyncContext;
use crate::SyncError;

/// Result of paging the "newest threads" listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierScan {
    /// Highest thread ID in the store when the scan started (0 if empty)
    pub latest_known_id: i64,

    /// Newest thread ID on the listing's first page, if that page loaded
    pub api_latest_id: Option<i64>,

    /// Thread IDs newer than `latest_known_id`, newest first
    pub discovered: Vec<i64>,

    /// How many discovered threads one round may process
    pub cap: usize,
}

impl FrontierScan {
    /// The discovered threads handed to processing this round
    pub fn to_process(&self) -> &[i64] {
        &self.discovered[..self.discovered.len().min(self.cap)]
    }

    /// True when more threads were discovered than one round may process
    pub fn overflow(&self) -> bool {
        self.discovered.len() > self.cap
    }
}

impl<'a, S: Storage + Send> SyncContext<'a, S> {
    /// Pages the newest-threads listing until it reaches a known thread
    ///
    /// The listing is newest first, so the first entry at or below the
    /// store's highest ID ends the scan. An empty page, a failed page, or the
    /// page cap also end it, keeping whatever was collected. Only a failure
    /// to read the store's highest ID is an error.
    pub async fn scan_frontier(&self) -> Result<FrontierScan, SyncError> {
        let latest_known_id = self.with_storage(|s| s.latest_thread_id())?;
        self.log(&format!("Latest stored thread ID: {}", latest_known_id));

        let mut scan = FrontierScan {
            latest_known_id,
            api_latest_id: None,
            discovered: Vec::new(),
            cap: self.limits().new_thread_cap,
        };

        'pages: for page in 1..=self.limits().new_thread_page_cap {
            self.log(&format!("Requesting newest threads, page {}", page));

            let entries = match self
                .client()
                .fetch_listing(self.credentials, Listing::NewThreads, page)
                .await
            {
                Ok(entries) => entries,
                Err(e) => {
                    self.log(&format!("Newest threads page {} failed: {}", page, e));
                    break;
                }
            };

            if entries.is_empty() {
                self.log("No more threads listed");
                break;
            }

            if page == 1 {
                scan.api_latest_id = entries.first().map(|entry| entry.thread_id);
            }

            for entry in entries {
                if entry.thread_id <= latest_known_id {
                    break 'pages;
                }
                scan.discovered.push(entry.thread_id);
            }
        }

        if scan.discovered.is_empty() {
            self.log("No new threads found");
        } else {
            self.log(&format!(
                "Found {} new threads, processing {} this round",
                scan.discovered.len(),
                scan.to_process().len()
            ));
        }

        Ok(scan)
    }
}
