//! Statistics generation from the mirror database
//!
//! This module provides functionality for extracting and displaying
//! archive statistics from the storage layer.

use crate::storage::{RoundRecord, Storage};
use crate::SyncError;

/// Archive statistics summary
#[derive(Debug, Clone)]
pub struct ArchiveStatistics {
    /// Number of mirrored threads
    pub total_threads: u64,

    /// Number of mirrored posts
    pub total_comments: u64,

    /// Number of thread IDs recorded as inaccessible
    pub tombstones: u64,

    /// Highest mirrored thread ID (0 when empty)
    pub latest_thread_id: i64,

    /// Number of sync rounds recorded
    pub rounds: u64,

    /// The most recent sync round, if any
    pub last_round: Option<RoundRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(ArchiveStatistics)` - Successfully loaded statistics
/// * `Err(SyncError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<ArchiveStatistics, SyncError> {
    Ok(ArchiveStatistics {
        total_threads: storage.count_threads()?,
        total_comments: storage.count_comments()?,
        tombstones: storage.count_tombstones()?,
        latest_thread_id: storage.latest_thread_id()?,
        rounds: storage.count_rounds()?,
        last_round: storage.latest_round()?,
    })
}

/// Average posts per mirrored thread
pub fn comments_per_thread(stats: &ArchiveStatistics) -> f64 {
    if stats.total_threads > 0 {
        stats.total_comments as f64 / stats.total_threads as f64
    } else {
        0.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &ArchiveStatistics) {
    println!("=== Archive Statistics ===\n");

    println!("Overview:");
    println!("  Threads mirrored: {}", stats.total_threads);
    println!(
        "  Posts mirrored: {} ({:.1} per thread)",
        stats.total_comments,
        comments_per_thread(stats)
    );
    println!("  Inaccessible thread IDs: {}", stats.tombstones);
    println!("  Newest thread ID: {}", stats.latest_thread_id);
    println!();

    println!("Sync Rounds: {}", stats.rounds);
    if let Some(round) = &stats.last_round {
        println!("  Last round #{}:", round.id);
        println!("    Started: {}", round.started_at);
        println!("    Finished: {}", round.finished_at);
        println!("    New threads: {}", round.processed_new_threads);
        println!("    Reply updates: {}", round.updated_replies);
        println!(
            "    Backlog remaining: {}",
            if round.has_more { "yes" } else { "no" }
        );
    }
}
