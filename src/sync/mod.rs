//! Incremental synchronization engine
//!
//! This module contains the logic that keeps the mirror in step with the
//! forum, including:
//! - Discovering threads newer than anything stored (frontier scan)
//! - Fetching and persisting whole threads and appending new posts
//! - Re-checking a window of recent IDs for gaps (backfill)
//! - Following the "newest replies" listing to pick up reply growth
//! - Orchestrating all of the above as one bounded round
//!
//! The engine keeps no cursor between rounds. Every scan derives its starting
//! point from the store, so running another round is always safe.

mod backfill;
mod batch;
mod catchup;
mod coordinator;
mod driver;
mod fetcher;
mod frontier;
mod incremental;

pub use backfill::BackfillReport;
pub use batch::run_in_chunks;
pub use catchup::CatchUpReport;
pub use coordinator::{RoundOutcome, ThreadCheck};
pub use driver::{drive_rounds, DriveSummary};
pub use fetcher::ThreadFetch;
pub use frontier::FrontierScan;

use crate::api::{Credentials, ForumClient};
use crate::config::{Config, SyncLimits};
use crate::output::ProgressLog;
use crate::storage::{Storage, StorageResult};
use crate::SyncError;
use std::sync::{Arc, Mutex};

/// The sync engine: a forum client, a store, and the per-round budgets
pub struct SyncEngine<S: Storage> {
    client: ForumClient,
    storage: Arc<Mutex<S>>,
    limits: SyncLimits,
}

impl<S: Storage + Send> SyncEngine<S> {
    pub fn new(client: ForumClient, storage: S, limits: SyncLimits) -> Self {
        Self::with_shared_storage(client, Arc::new(Mutex::new(storage)), limits)
    }

    /// Creates an engine over a store that other components also read
    pub fn with_shared_storage(
        client: ForumClient,
        storage: Arc<Mutex<S>>,
        limits: SyncLimits,
    ) -> Self {
        Self {
            client,
            storage,
            limits,
        }
    }

    /// Creates an engine from a loaded configuration
    pub fn from_config(config: &Config, storage: S) -> Result<Self, SyncError> {
        let client = ForumClient::new(&config.api)?;
        Ok(Self::new(client, storage, config.sync.clone()))
    }

    pub fn limits(&self) -> &SyncLimits {
        &self.limits
    }

    /// Shared handle to the underlying store
    pub fn storage(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.storage)
    }

    /// Binds credentials and a progress sink for one unit of work
    pub fn context<'a>(
        &'a self,
        credentials: &'a Credentials,
        progress: &'a dyn ProgressLog,
    ) -> SyncContext<'a, S> {
        SyncContext {
            engine: self,
            credentials,
            progress,
        }
    }

    /// Runs `f` against the store while holding its lock
    ///
    /// The lock is never held across an await point.
    pub(crate) fn with_storage<T>(
        &self,
        f: impl FnOnce(&mut S) -> StorageResult<T>,
    ) -> Result<T, SyncError> {
        let mut storage = self.storage.lock().map_err(|_| SyncError::LockPoisoned)?;
        Ok(f(&mut storage)?)
    }
}

/// Everything one sync operation needs: the engine, the caller's
/// credentials, and where to report progress
pub struct SyncContext<'a, S: Storage> {
    engine: &'a SyncEngine<S>,
    credentials: &'a Credentials,
    progress: &'a dyn ProgressLog,
}

impl<'a, S: Storage + Send> SyncContext<'a, S> {
    fn client(&self) -> &ForumClient {
        &self.engine.client
    }

    fn limits(&self) -> &SyncLimits {
        &self.engine.limits
    }

    fn log(&self, message: &str) {
        self.progress.line(message);
    }

    fn with_storage<T>(&self, f: impl FnOnce(&mut S) -> StorageResult<T>) -> Result<T, SyncError> {
        self.engine.with_storage(f)
    }
}

/// Current time as a Unix timestamp, the unit used for `last_synced`
pub(crate) fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
