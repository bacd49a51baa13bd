//! Repeated rounds until the forum is caught up
//!
//! The driver re-invokes the round while it reports more work, bounded by
//! `max-rounds`, and records each round in the store's round history.

use crate::api::Credentials;
use crate::output::ProgressLog;
use crate::storage::{NewRound, Storage};
use crate::sync::{RoundOutcome, SyncEngine};
use crate::SyncError;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Totals across all rounds run by [`drive_rounds`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveSummary {
    /// Number of rounds run
    pub rounds: u32,

    /// New threads processed across all rounds
    pub processed_new_threads: u32,

    /// Reply updates across all rounds
    pub updated_replies: u32,

    /// True when the round limit was reached with work still pending
    pub has_more: bool,
}

impl DriveSummary {
    fn absorb(&mut self, outcome: &RoundOutcome) {
        self.rounds += 1;
        self.processed_new_threads += outcome.processed_new_threads;
        self.updated_replies += outcome.updated_replies;
        self.has_more = outcome.has_more;
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Runs rounds until one reports no more work or `max-rounds` is reached
///
/// Each completed round is written to the round history. A round that fails
/// ends the drive with its error; rounds completed before it stay recorded.
pub async fn drive_rounds<S: Storage + Send>(
    engine: &SyncEngine<S>,
    credentials: &Credentials,
    progress: &dyn ProgressLog,
) -> Result<DriveSummary, SyncError> {
    let max_rounds = engine.limits().max_rounds.max(1);
    let mut summary = DriveSummary::default();

    while summary.rounds < max_rounds {
        progress.line(&format!("=== Round {} ===", summary.rounds + 1));

        let started_at = timestamp();
        let outcome = engine.run_round(credentials, progress).await?;
        let finished_at = timestamp();

        let round = NewRound {
            started_at,
            finished_at,
            has_more: outcome.has_more,
            processed_new_threads: outcome.processed_new_threads,
            updated_replies: outcome.updated_replies,
        };
        let round_id = engine.with_storage(|s| s.record_round(&round))?;
        tracing::debug!("Recorded round {}", round_id);

        summary.absorb(&outcome);

        if !outcome.has_more {
            break;
        }
    }

    if summary.has_more {
        progress.line(&format!(
            "Stopped after {} rounds with work remaining",
            summary.rounds
        ));
    } else {
        progress.line(&format!("Caught up after {} rounds", summary.rounds));
    }

    Ok(summary)
}
