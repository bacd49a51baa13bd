//! Incremental post fetching for threads that are already mirrored
//!
//! Only posts with a position beyond the stored reply count are written. The
//! scan starts on the page holding the last known post, so a page that was
//! short when first fetched is read again.

use crate::api::DetailFetch;
use crate::storage::{CommentRecord, Storage};
use crate::sync::{now_unix, SyncContext};
use crate::SyncError;

/// First detail page that can hold a post past `stored_replies`
pub(crate) fn start_page(stored_replies: i64, page_size: u32) -> u32 {
    let page_size = i64::from(page_size.max(1));
    let page = (stored_replies.max(0) / page_size).max(1);
    u32::try_from(page).unwrap_or(u32::MAX)
}

impl<'a, S: Storage + Send> SyncContext<'a, S> {
    /// Fetches and stores posts added since the thread was last synced
    ///
    /// Returns the number of posts written. When no post past
    /// `stored_replies` turns up, nothing is written and the stored reply
    /// count stays as it was, even though the listing reported more.
    ///
    /// A failed page ends the scan early. Whatever earlier pages produced is
    /// still written, and the reply count is set to `api_replies`.
    pub async fn fetch_new_comments(
        &self,
        thread_id: i64,
        api_replies: i64,
        stored_replies: i64,
    ) -> Result<usize, SyncError> {
        let page_size = self.client().page_size();
        let first = start_page(stored_replies, page_size);
        let last = first.saturating_add(self.limits().comment_page_cap.max(1) - 1);

        let mut fresh: Vec<CommentRecord> = Vec::new();

        for page in first..=last {
            let fetched = match self
                .client()
                .fetch_post_page(self.credentials, thread_id, page)
                .await
            {
                Ok(DetailFetch::Page(fetched)) => fetched,
                Ok(DetailFetch::Inaccessible { status }) => {
                    tracing::warn!(
                        "[{}] Page {} inaccessible (status {}), stopping",
                        thread_id,
                        page,
                        status
                    );
                    break;
                }
                Err(e) => {
                    tracing::warn!("[{}] Failed to fetch page {}: {}", thread_id, page, e);
                    break;
                }
            };

            let posts = match fetched.posts {
                Some(posts) if fetched.row_count > 0 => posts,
                _ => break,
            };

            fresh.extend(
                posts
                    .iter()
                    .filter(|post| post.position() > stored_replies)
                    .map(|post| post.to_record(thread_id)),
            );

            if fetched.row_count < page_size as usize {
                break;
            }
        }

        if fresh.is_empty() {
            tracing::debug!(
                "[{}] No posts beyond position {} yet",
                thread_id,
                stored_replies
            );
            return Ok(0);
        }

        let synced_at = now_unix();
        self.with_storage(|s| s.append_comments(thread_id, api_replies, synced_at, &fresh))?;

        self.log(&format!(
            "[{}] +{} new posts (replies {} -> {})",
            thread_id,
            fresh.len(),
            stored_replies,
            api_replies
        ));

        Ok(fresh.len())
    }
}
