//! Store-side tail of the pipeline: apply validation outcomes through the
//! dedup engine and count what happened.
//!
//! A single item's storage failure is absorbed (logged and skipped), the
//! same way a validation failure is: only acquisition failures are fatal to
//! a job.

use uuid::Uuid;

use crate::dedup::{DedupEngine, InsertOutcome};
use crate::store::EventStore;
use crate::types::validation::{ValidationOutcome, ValidationStatus};

/// Counters produced by storing one job's validation outcomes.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoreCounters {
    /// Items that survived validation (everything not rejected).
    pub validated: i64,
    /// Rows actually written (including flagged duplicates).
    pub stored: i64,
    pub rejected: i64,
    pub exact_duplicates: i64,
    pub flagged_duplicates: i64,
}

/// Store each outcome in order, applying the reject and duplicate policies.
pub async fn store_outcomes<S: EventStore>(
    engine: &DedupEngine<S>,
    market_id: Uuid,
    outcomes: Vec<ValidationOutcome>,
) -> StoreCounters {
    let mut counters = StoreCounters::default();

    for outcome in outcomes {
        // Reject is absolute: never persisted, whatever the confidence.
        if outcome.status == ValidationStatus::Rejected {
            counters.rejected += 1;
            continue;
        }
        counters.validated += 1;

        let result = engine
            .insert(
                market_id,
                outcome.corrected,
                outcome.status,
                Some(outcome.verdict.confidence),
                outcome.note,
            )
            .await;

        match result {
            Ok(InsertOutcome::Inserted(_)) => counters.stored += 1,
            Ok(InsertOutcome::FlaggedDuplicate(_)) => {
                counters.stored += 1;
                counters.flagged_duplicates += 1;
            }
            Ok(InsertOutcome::ExactDuplicate { existing_id }) => {
                tracing::debug!(existing_id = %existing_id, "skipped exact duplicate");
                counters.exact_duplicates += 1;
            }
            Err(e) => {
                // Item-level failure: keep going with the rest of the batch.
                tracing::warn!(error = %e, "failed to store item, continuing");
            }
        }
    }

    counters
}
