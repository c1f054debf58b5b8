//! Postgres implementations of the discovery storage and audit seams.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use discovery::error::DiscoveryError;
use discovery::providers::{CallLogger, ProviderCallRecord};
use discovery::{EventStore, StoredEvent};

use super::models::{EventRecord, ProviderCall};

/// [`EventStore`] over the events table.
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<StoredEvent>, DiscoveryError> {
        let row = EventRecord::find_by_fingerprint(fingerprint, &self.pool)
            .await
            .map_err(|e| DiscoveryError::Storage(e.into()))?;
        Ok(row.map(EventRecord::into_stored))
    }

    async fn find_by_market_and_date(
        &self,
        market_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<StoredEvent>, DiscoveryError> {
        let rows = EventRecord::find_by_market_and_date(market_id, date, &self.pool)
            .await
            .map_err(|e| DiscoveryError::Storage(e.into()))?;
        Ok(rows.into_iter().map(EventRecord::into_stored).collect())
    }

    async fn insert(&self, event: StoredEvent) -> Result<StoredEvent, DiscoveryError> {
        let row = EventRecord::from_stored(&event)
            .insert(&self.pool)
            .await
            .map_err(|e| DiscoveryError::Storage(e.into()))?;

        match row {
            Some(inserted) => Ok(inserted.into_stored()),
            None => {
                // Lost a race on the fingerprint constraint: another job
                // stored the same event first. Report theirs: the
                // expected skip-path, not a failure.
                let existing = EventRecord::find_by_fingerprint(&event.fingerprint, &self.pool)
                    .await
                    .map_err(|e| DiscoveryError::Storage(e.into()))?;
                existing.map(EventRecord::into_stored).ok_or_else(|| {
                    DiscoveryError::Storage(
                        format!("conflicting row vanished: {}", event.fingerprint).into(),
                    )
                })
            }
        }
    }
}

/// [`CallLogger`] over the provider_calls table. Failures are logged and
/// swallowed: the audit trail never interrupts a job.
pub struct PostgresCallLogger {
    pool: PgPool,
}

impl PostgresCallLogger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CallLogger for PostgresCallLogger {
    async fn log_call(&self, record: ProviderCallRecord) {
        if let Err(e) = ProviderCall::from_record(&record).insert(&self.pool).await {
            tracing::error!(
                provider = %record.provider,
                operation = %record.operation,
                error = %e,
                "failed to persist provider call record"
            );
        }
    }
}
