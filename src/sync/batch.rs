//! Chunked concurrency for batches of independent work
//!
//! Items run in consecutive chunks of at most `concurrency` futures. A chunk
//! is awaited in full before the next one starts, which caps the number of
//! simultaneous outbound requests without a semaphore.

use futures::future::join_all;
use std::future::Future;

/// Runs `handler` over `items` with at most `concurrency` in flight
///
/// Every item runs to completion regardless of how its siblings fare, and the
/// outputs are returned in input order. Handlers that can fail should return
/// a `Result` so each failure stays with its own item.
///
/// # Example
///
/// ```
/// use thread_mirror::sync::run_in_chunks;
///
/// # async fn example() {
/// let doubled = run_in_chunks(vec![1, 2, 3], 2, |n| async move { n * 2 }).await;
/// assert_eq!(doubled, vec![2, 4, 6]);
/// # }
/// ```
pub async fn run_in_chunks<T, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    mut handler: F,
) -> Vec<Fut::Output>
where
    F: FnMut(T) -> Fut,
    Fut: Future,
{
    let chunk_size = concurrency.max(1);
    let mut outputs = Vec::with_capacity(items.len());
    let mut items = items.into_iter().peekable();

    while items.peek().is_some() {
        let chunk: Vec<Fut> = items.by_ref().take(chunk_size).map(&mut handler).collect();
        outputs.extend(join_all(chunk).await);
    }

    outputs
}
