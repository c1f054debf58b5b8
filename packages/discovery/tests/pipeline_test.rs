//! End-to-end pipeline tests over the in-memory store and mock providers:
//! acquisition parsing, validation policy, and duplicate handling.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use discovery::pipeline::store_outcomes;
use discovery::providers::logger::NoopCallLogger;
use discovery::providers::validator::ValidationContext;
use discovery::testing::{MockSearchProvider, MockValidationProvider};
use discovery::{
    AcquisitionStrategy, CandidateEvent, CategoryConfig, DateWindow, DedupEngine, MarketConfig,
    MemoryEventStore, SearchStrategy, ValidationProviderError, ValidationStage, ValidationStatus,
};

fn market() -> MarketConfig {
    MarketConfig {
        id: Uuid::new_v4(),
        name: "Springfield".into(),
        region: "Springfield metro area".into(),
        center_lat: 44.9,
        center_lng: -93.2,
        radius_miles: 25.0,
    }
}

fn category() -> CategoryConfig {
    CategoryConfig {
        id: Uuid::new_v4(),
        name: "Outdoor Fitness".into(),
        pillar: "wellness".into(),
        search_prompt: None,
        exclusions: None,
    }
}

fn window() -> DateWindow {
    DateWindow::days_from(Utc.with_ymd_and_hms(2025, 5, 25, 0, 0, 0).unwrap(), 30)
}

fn candidate(title: &str) -> CandidateEvent {
    CandidateEvent {
        title: title.into(),
        starts_at: Some(Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap()),
        location_name: Some("City Park".into()),
        ..Default::default()
    }
}

fn stage(provider: Arc<MockValidationProvider>) -> ValidationStage {
    ValidationStage::new(provider, Arc::new(NoopCallLogger)).with_delay(Duration::ZERO)
}

#[tokio::test]
async fn accepted_candidate_is_stored_validated() {
    // Scenario: a clean candidate validated at accept/0.9.
    let store = Arc::new(MemoryEventStore::new());
    let engine = DedupEngine::new(Arc::clone(&store));
    let market_id = Uuid::new_v4();

    let outcomes = stage(Arc::new(MockValidationProvider::new()))
        .validate(
            vec![candidate("Sunset Yoga")],
            &ValidationContext::default(),
            None,
        )
        .await;
    let counters = store_outcomes(&engine, market_id, outcomes).await;

    assert_eq!(counters.validated, 1);
    assert_eq!(counters.stored, 1);
    assert_eq!(store.len(), 1);

    let stored = &store.all()[0];
    assert_eq!(stored.validation_status, ValidationStatus::Validated);
    assert!(!stored.is_duplicate);
    assert_eq!(stored.candidate.title, "Sunset Yoga");
}

#[tokio::test]
async fn resubmitted_candidate_is_skipped() {
    // Scenario: the exact candidate resubmitted in a later job writes
    // nothing and leaves the original untouched.
    let store = Arc::new(MemoryEventStore::new());
    let engine = DedupEngine::new(Arc::clone(&store));
    let market_id = Uuid::new_v4();
    let context = ValidationContext::default();

    let first = stage(Arc::new(MockValidationProvider::new()))
        .validate(vec![candidate("Sunset Yoga")], &context, None)
        .await;
    store_outcomes(&engine, market_id, first).await;

    let second = stage(Arc::new(MockValidationProvider::new()))
        .validate(vec![candidate("Sunset Yoga")], &context, None)
        .await;
    let counters = store_outcomes(&engine, market_id, second).await;

    assert_eq!(counters.stored, 0);
    assert_eq!(counters.exact_duplicates, 1);
    assert_eq!(store.len(), 1);
    assert_eq!(store.all()[0].validation_status, ValidationStatus::Validated);
}

#[tokio::test]
async fn near_duplicate_title_is_flagged_for_review() {
    // Scenario: a same-date candidate whose title overlaps the stored one
    // above the fuzzy threshold is inserted but flagged.
    let store = Arc::new(MemoryEventStore::new());
    let engine = DedupEngine::new(Arc::clone(&store));
    let market_id = Uuid::new_v4();
    let context = ValidationContext::default();

    let first = stage(Arc::new(MockValidationProvider::new()))
        .validate(
            vec![candidate(
                "Friday Sunset Yoga Class at City Park with Live Music",
            )],
            &context,
            None,
        )
        .await;
    store_outcomes(&engine, market_id, first).await;

    let second = stage(Arc::new(MockValidationProvider::new()))
        .validate(
            vec![candidate(
                "Free Friday Sunset Yoga Class at City Park with Live Music",
            )],
            &context,
            None,
        )
        .await;
    let counters = store_outcomes(&engine, market_id, second).await;

    // Flagged, not rejected: both rows exist.
    assert_eq!(counters.stored, 1);
    assert_eq!(counters.flagged_duplicates, 1);
    assert_eq!(store.len(), 2);

    let flagged = store
        .all()
        .into_iter()
        .find(|e| e.is_duplicate)
        .expect("flagged row");
    // Review is forced regardless of the item's own validation confidence.
    assert_eq!(flagged.validation_status, ValidationStatus::NeedsReview);
    assert!(flagged
        .validation_notes
        .as_deref()
        .unwrap()
        .contains("possible duplicate"));
}

#[tokio::test]
async fn mid_job_provider_error_degrades_one_item_only() {
    // Scenario: the validation provider fails for one of three candidates.
    // The job still processes all three; the degraded item lands in review,
    // never in rejected.
    let store = Arc::new(MemoryEventStore::new());
    let engine = DedupEngine::new(Arc::clone(&store));
    let market_id = Uuid::new_v4();

    let provider = Arc::new(MockValidationProvider::new().with_results(vec![
        Ok(MockValidationProvider::accept(0.9)),
        Err(ValidationProviderError("HTTP 500".into())),
        Ok(MockValidationProvider::accept(0.85)),
    ]));

    let candidates = vec![
        candidate("Sunrise Run Club"),
        candidate("Community Garden Tour"),
        candidate("Evening Paddle Meetup"),
    ];
    let found = candidates.len() as i64;

    let outcomes = stage(provider)
        .validate(candidates, &ValidationContext::default(), None)
        .await;
    let counters = store_outcomes(&engine, market_id, outcomes).await;

    assert_eq!(found, 3);
    assert_eq!(counters.validated, 3);
    assert_eq!(counters.rejected, 0);
    assert_eq!(counters.stored, 3);

    let degraded = store
        .all()
        .into_iter()
        .find(|e| e.candidate.title == "Community Garden Tour")
        .expect("degraded row");
    assert_eq!(degraded.validation_status, ValidationStatus::NeedsReview);
    assert!((degraded.validation_confidence.unwrap() - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn rejected_candidate_is_never_stored() {
    let store = Arc::new(MemoryEventStore::new());
    let engine = DedupEngine::new(Arc::clone(&store));

    let provider = Arc::new(MockValidationProvider::new().with_results(vec![
        // High confidence does not soften a reject.
        Ok(MockValidationProvider::reject(0.99)),
    ]));
    let outcomes = stage(provider)
        .validate(
            vec![candidate("Buy Gold Now Seminar")],
            &ValidationContext::default(),
            None,
        )
        .await;
    let counters = store_outcomes(&engine, Uuid::new_v4(), outcomes).await;

    assert_eq!(counters.rejected, 1);
    assert_eq!(counters.validated, 0);
    assert_eq!(counters.stored, 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn search_acquisition_feeds_validation_and_storage() {
    // Full pipeline: provider prose → parsed candidates → validation →
    // dedup/store.
    let response = r#"Here is what I found this week:
[
  {"title": "Sunset Yoga", "date": "2025-06-01", "location": "City Park"},
  {"title": "", "date": "2025-06-02", "location": "Anywhere"},
  {"title": "Winter Gala", "date": "2025-01-15", "location": "Grand Hall"}
]
Hope this helps!"#;

    let search = Arc::new(MockSearchProvider::new().with_response(response));
    let strategy = SearchStrategy::new(search, Arc::new(NoopCallLogger), category());

    let acquisition = strategy.acquire(&market(), window()).await.unwrap();
    // The untitled and out-of-window candidates are filtered before
    // validation and never counted as found.
    assert_eq!(acquisition.candidates.len(), 1);
    assert!(acquisition.query.contains("Outdoor Fitness"));
    assert_eq!(acquisition.raw_response, response);

    let store = Arc::new(MemoryEventStore::new());
    let engine = DedupEngine::new(Arc::clone(&store));
    let outcomes = stage(Arc::new(MockValidationProvider::new()))
        .validate(
            acquisition.candidates,
            &ValidationContext::default(),
            None,
        )
        .await;
    let counters = store_outcomes(&engine, market().id, outcomes).await;

    assert_eq!(counters.stored, 1);
    assert_eq!(store.all()[0].candidate.title, "Sunset Yoga");
}
