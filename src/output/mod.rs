//! Output module for progress reporting and statistics
//!
//! This module handles:
//! - Streaming line-oriented progress while a sync round runs
//! - Recording archive statistics for operators

mod progress;
pub mod stats;

pub use progress::{MemoryProgress, ProgressLog, TracingProgress, WriterProgress};
pub use stats::{load_statistics, print_statistics, ArchiveStatistics};
