//! Duplicate detection and the insert policy.
//!
//! Two layers: an exact fingerprint match skips insertion outright, and a
//! fuzzy same-date title match inserts anyway but flags the record for human
//! adjudication. Probable duplicates are never silently merged or dropped.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::fingerprint::fingerprint;
use crate::similarity::title_similarity;
use crate::store::{EventStore, StoredEvent};
use crate::types::candidate::CandidateEvent;
use crate::types::validation::ValidationStatus;

/// Title word-set similarity at or above which a same-date record is
/// flagged as a probable duplicate.
pub const FUZZY_DUPLICATE_THRESHOLD: f64 = 0.85;

/// Outcome of a dedup-checked insert.
#[derive(Debug)]
pub enum InsertOutcome {
    /// Stored as a new event.
    Inserted(StoredEvent),
    /// Same fingerprint already stored; nothing written.
    ExactDuplicate { existing_id: Uuid },
    /// Stored, but flagged for human review as a probable duplicate.
    FlaggedDuplicate(StoredEvent),
}

impl InsertOutcome {
    /// Whether a new row was written.
    pub fn stored(&self) -> bool {
        !matches!(self, InsertOutcome::ExactDuplicate { .. })
    }
}

/// Applies the duplicate policy on top of an [`EventStore`].
pub struct DedupEngine<S: EventStore> {
    store: Arc<S>,
}

impl<S: EventStore> DedupEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fingerprint for a candidate: normalized title, date key, location.
    pub fn fingerprint_for(candidate: &CandidateEvent) -> String {
        fingerprint(
            &candidate.title,
            &candidate.date_key(),
            candidate.location_name.as_deref().unwrap_or_default(),
        )
    }

    /// Insert a validated candidate, applying the duplicate policy:
    ///
    /// 1. Exact fingerprint match: skip, report the existing record.
    /// 2. Same-market, same-date title similarity at or above the threshold:
    ///    insert flagged (`is_duplicate`, forced needs_review, note).
    /// 3. Otherwise insert with the caller's validation status.
    pub async fn insert(
        &self,
        market_id: Uuid,
        candidate: CandidateEvent,
        status: ValidationStatus,
        confidence: Option<f64>,
        notes: Option<String>,
    ) -> crate::error::Result<InsertOutcome> {
        let fp = Self::fingerprint_for(&candidate);

        if let Some(existing) = self.store.find_by_fingerprint(&fp).await? {
            tracing::debug!(
                title = %candidate.title,
                existing_id = %existing.id,
                "exact duplicate, skipping insert"
            );
            return Ok(InsertOutcome::ExactDuplicate {
                existing_id: existing.id,
            });
        }

        let fuzzy_match = match candidate.day() {
            Some(day) => {
                let peers = self.store.find_by_market_and_date(market_id, day).await?;
                peers
                    .into_iter()
                    .map(|peer| {
                        let similarity = title_similarity(&candidate.title, &peer.candidate.title);
                        (peer, similarity)
                    })
                    .filter(|(_, similarity)| *similarity >= FUZZY_DUPLICATE_THRESHOLD)
                    .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            }
            None => None,
        };

        if let Some((peer, similarity)) = fuzzy_match {
            tracing::info!(
                title = %candidate.title,
                peer = %peer.candidate.title,
                similarity = similarity,
                "probable duplicate, flagging for review"
            );
            let flag_note = format!(
                "possible duplicate of \"{}\" (title similarity {:.2})",
                peer.candidate.title, similarity
            );
            let combined_notes = match notes {
                Some(existing_notes) => format!("{existing_notes}; {flag_note}"),
                None => flag_note,
            };
            let stored = self
                .store
                .insert(StoredEvent {
                    id: Uuid::new_v4(),
                    market_id,
                    candidate,
                    validation_status: ValidationStatus::NeedsReview,
                    validation_confidence: confidence,
                    validation_notes: Some(combined_notes),
                    fingerprint: fp,
                    is_duplicate: true,
                    created_at: Utc::now(),
                })
                .await?;
            return Ok(InsertOutcome::FlaggedDuplicate(stored));
        }

        let event = self
            .store
            .insert(StoredEvent {
                id: Uuid::new_v4(),
                market_id,
                candidate,
                validation_status: status,
                validation_confidence: confidence,
                validation_notes: notes,
                fingerprint: fp,
                is_duplicate: false,
                created_at: Utc::now(),
            })
            .await?;

        Ok(InsertOutcome::Inserted(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryEventStore;
    use chrono::TimeZone;

    fn candidate(title: &str, day: u32, location: &str) -> CandidateEvent {
        CandidateEvent {
            title: title.into(),
            starts_at: Some(Utc.with_ymd_and_hms(2025, 6, day, 18, 0, 0).unwrap()),
            location_name: Some(location.into()),
            ..Default::default()
        }
    }

    fn engine() -> (DedupEngine<MemoryEventStore>, Arc<MemoryEventStore>) {
        let store = Arc::new(MemoryEventStore::new());
        (DedupEngine::new(Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn test_insert_new_event() {
        let (engine, store) = engine();
        let outcome = engine
            .insert(
                Uuid::new_v4(),
                candidate("Sunset Yoga", 1, "City Park"),
                ValidationStatus::Validated,
                Some(0.9),
                None,
            )
            .await
            .unwrap();

        assert!(matches!(outcome, InsertOutcome::Inserted(_)));
        assert_eq!(store.len(), 1);
        let stored = &store.all()[0];
        assert_eq!(stored.validation_status, ValidationStatus::Validated);
        assert!(!stored.is_duplicate);
    }

    #[tokio::test]
    async fn test_exact_duplicate_skipped() {
        let (engine, store) = engine();
        let market_id = Uuid::new_v4();

        engine
            .insert(
                market_id,
                candidate("Sunset Yoga", 1, "City Park"),
                ValidationStatus::Validated,
                Some(0.9),
                None,
            )
            .await
            .unwrap();

        // Same logical event, different case and punctuation.
        let outcome = engine
            .insert(
                market_id,
                candidate("SUNSET YOGA!", 1, "city park"),
                ValidationStatus::Validated,
                Some(0.95),
                None,
            )
            .await
            .unwrap();

        assert!(matches!(outcome, InsertOutcome::ExactDuplicate { .. }));
        assert!(!outcome.stored());
        assert_eq!(store.len(), 1);
        // Original is unaffected.
        assert!((store.all()[0].validation_confidence.unwrap() - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_fuzzy_duplicate_flagged_not_dropped() {
        let (engine, store) = engine();
        let market_id = Uuid::new_v4();

        engine
            .insert(
                market_id,
                candidate("Friday Sunset Yoga Class at City Park with Live Music", 1, "City Park"),
                ValidationStatus::Validated,
                Some(0.9),
                None,
            )
            .await
            .unwrap();

        // One extra word over a ten-word overlap: similarity 10/11 ≈ 0.91.
        let outcome = engine
            .insert(
                market_id,
                candidate(
                    "Free Friday Sunset Yoga Class at City Park with Live Music",
                    1,
                    "City Park",
                ),
                ValidationStatus::Validated,
                Some(0.95),
                None,
            )
            .await
            .unwrap();

        let InsertOutcome::FlaggedDuplicate(stored) = outcome else {
            panic!("expected flagged duplicate");
        };
        assert_eq!(store.len(), 2);
        assert!(stored.is_duplicate);
        // Forced into review regardless of its own validation confidence.
        assert_eq!(stored.validation_status, ValidationStatus::NeedsReview);
        assert!(stored
            .validation_notes
            .as_deref()
            .unwrap()
            .contains("possible duplicate"));
    }

    #[tokio::test]
    async fn test_fuzzy_scan_limited_to_same_market_and_date() {
        let (engine, store) = engine();
        let market_a = Uuid::new_v4();
        let market_b = Uuid::new_v4();

        engine
            .insert(
                market_a,
                candidate("Friday Sunset Yoga Class at City Park with Live Music", 1, "City Park"),
                ValidationStatus::Validated,
                Some(0.9),
                None,
            )
            .await
            .unwrap();

        // Same title, different market: not a duplicate.
        let other_market = engine
            .insert(
                market_b,
                candidate("Friday Sunset Yoga Class at City Park with Live Music", 1, "Lake Plaza"),
                ValidationStatus::Validated,
                Some(0.9),
                None,
            )
            .await
            .unwrap();
        assert!(matches!(other_market, InsertOutcome::Inserted(_)));

        // Same market, different date: not a duplicate.
        let other_date = engine
            .insert(
                market_a,
                candidate("Friday Sunset Yoga Class at City Park with Live Music", 8, "City Park"),
                ValidationStatus::Validated,
                Some(0.9),
                None,
            )
            .await
            .unwrap();
        assert!(matches!(other_date, InsertOutcome::Inserted(_)));

        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_below_threshold_titles_not_flagged() {
        let (engine, _store) = engine();
        let market_id = Uuid::new_v4();

        engine
            .insert(
                market_id,
                candidate("Sunset Yoga", 1, "City Park"),
                ValidationStatus::Validated,
                Some(0.9),
                None,
            )
            .await
            .unwrap();

        // {sunset, yoga} vs {sunset, yoga, class}: 2/3, below the threshold.
        let outcome = engine
            .insert(
                market_id,
                candidate("Sunset Yoga Class", 1, "City Park"),
                ValidationStatus::Validated,
                Some(0.9),
                None,
            )
            .await
            .unwrap();
        assert!(matches!(outcome, InsertOutcome::Inserted(_)));
    }
}
