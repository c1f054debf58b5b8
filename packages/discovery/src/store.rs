//! Storage seam for stored events.
//!
//! The dedup engine only needs three operations, so the trait stays small
//! and the server can implement it over Postgres while tests use
//! [`MemoryEventStore`].

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{DiscoveryError, Result};
use crate::types::candidate::CandidateEvent;
use crate::types::validation::ValidationStatus;

/// A persisted event as the dedup engine sees it.
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub id: Uuid,
    pub market_id: Uuid,
    pub candidate: CandidateEvent,
    pub validation_status: ValidationStatus,
    pub validation_confidence: Option<f64>,
    pub validation_notes: Option<String>,
    pub fingerprint: String,
    pub is_duplicate: bool,
    pub created_at: DateTime<Utc>,
}

/// Durable store for events, keyed by fingerprint.
///
/// Implementations must enforce fingerprint uniqueness; the engine checks
/// before inserting, but the store is the invariant's backstop.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<StoredEvent>>;

    /// Events in a market whose parsed start falls on `date`: the scan set
    /// for the fuzzy-duplicate pass.
    async fn find_by_market_and_date(
        &self,
        market_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<StoredEvent>>;

    async fn insert(&self, event: StoredEvent) -> Result<StoredEvent>;
}

/// In-memory store for tests and a reference for the insert contract.
#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<Vec<StoredEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all stored events, insertion-ordered.
    pub fn all(&self) -> Vec<StoredEvent> {
        self.events.read().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<StoredEvent>> {
        let events = self.events.read().unwrap();
        Ok(events.iter().find(|e| e.fingerprint == fingerprint).cloned())
    }

    async fn find_by_market_and_date(
        &self,
        market_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<StoredEvent>> {
        let events = self.events.read().unwrap();
        Ok(events
            .iter()
            .filter(|e| e.market_id == market_id && e.candidate.day() == Some(date))
            .cloned()
            .collect())
    }

    async fn insert(&self, event: StoredEvent) -> Result<StoredEvent> {
        let mut events = self.events.write().unwrap();
        if events.iter().any(|e| e.fingerprint == event.fingerprint) {
            return Err(DiscoveryError::Storage(
                format!("fingerprint already stored: {}", event.fingerprint).into(),
            ));
        }
        events.push(event.clone());
        Ok(event)
    }
}
