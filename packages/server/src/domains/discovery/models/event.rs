//! Stored event model.
//!
//! One row per surviving candidate. The fingerprint column carries a unique
//! constraint: the dedup engine checks before inserting, and the constraint
//! is the backstop under concurrent jobs.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use discovery::{CandidateEvent, StoredEvent, ValidationStatus};

/// Validation lifecycle of a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "validation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    #[default]
    Pending,
    Validated,
    Rejected,
    NeedsReview,
}

impl ValidationState {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(ValidationState::Pending),
            "validated" => Some(ValidationState::Validated),
            "rejected" => Some(ValidationState::Rejected),
            "needs_review" => Some(ValidationState::NeedsReview),
            _ => None,
        }
    }
}

impl From<ValidationStatus> for ValidationState {
    fn from(status: ValidationStatus) -> Self {
        match status {
            ValidationStatus::Pending => ValidationState::Pending,
            ValidationStatus::Validated => ValidationState::Validated,
            ValidationStatus::Rejected => ValidationState::Rejected,
            ValidationStatus::NeedsReview => ValidationState::NeedsReview,
        }
    }
}

impl From<ValidationState> for ValidationStatus {
    fn from(state: ValidationState) -> Self {
        match state {
            ValidationState::Pending => ValidationStatus::Pending,
            ValidationState::Validated => ValidationStatus::Validated,
            ValidationState::Rejected => ValidationStatus::Rejected,
            ValidationState::NeedsReview => ValidationStatus::NeedsReview,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: Uuid,
    pub market_id: Uuid,
    pub job_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub date_raw: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location_name: Option<String>,
    pub address: Option<String>,
    pub is_virtual: bool,
    pub cost: Option<String>,
    pub tags: Vec<String>,
    pub source_url: Option<String>,
    pub validation_status: ValidationState,
    pub validation_confidence: Option<f64>,
    pub validation_notes: Option<String>,
    pub fingerprint: String,
    pub is_duplicate: bool,
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    /// Flatten a pipeline event into a row.
    pub fn from_stored(event: &StoredEvent) -> Self {
        let c = &event.candidate;
        Self {
            id: event.id,
            market_id: event.market_id,
            job_id: c.job_id,
            title: c.title.clone(),
            description: c.description.clone(),
            date_raw: c.date_raw.clone(),
            starts_at: c.starts_at,
            ends_at: c.ends_at,
            location_name: c.location_name.clone(),
            address: c.address.clone(),
            is_virtual: c.is_virtual,
            cost: c.cost.clone(),
            tags: c.tags.clone(),
            source_url: c.source_url.clone(),
            validation_status: event.validation_status.into(),
            validation_confidence: event.validation_confidence,
            validation_notes: event.validation_notes.clone(),
            fingerprint: event.fingerprint.clone(),
            is_duplicate: event.is_duplicate,
            created_at: event.created_at,
        }
    }

    /// Rehydrate the pipeline view of this row.
    pub fn into_stored(self) -> StoredEvent {
        StoredEvent {
            id: self.id,
            market_id: self.market_id,
            candidate: CandidateEvent {
                title: self.title,
                description: self.description,
                date_raw: self.date_raw,
                starts_at: self.starts_at,
                ends_at: self.ends_at,
                location_name: self.location_name,
                address: self.address,
                is_virtual: self.is_virtual,
                cost: self.cost,
                tags: self.tags,
                source_url: self.source_url,
                job_id: self.job_id,
            },
            validation_status: self.validation_status.into(),
            validation_confidence: self.validation_confidence,
            validation_notes: self.validation_notes,
            fingerprint: self.fingerprint,
            is_duplicate: self.is_duplicate,
            created_at: self.created_at,
        }
    }

    // =========================================================================
    // SQL Queries - ALL queries must be in models/
    // =========================================================================

    /// Insert, skipping silently on a fingerprint conflict.
    ///
    /// Returns None when another row already holds the fingerprint: the
    /// expected skip-path under concurrent inserts, not an error.
    pub async fn insert(&self, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, EventRecord>(
            r#"
            INSERT INTO events (
                id, market_id, job_id, title, description, date_raw,
                starts_at, ends_at, location_name, address, is_virtual, cost,
                tags, source_url, validation_status, validation_confidence,
                validation_notes, fingerprint, is_duplicate, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            ON CONFLICT (fingerprint) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.market_id)
        .bind(self.job_id)
        .bind(&self.title)
        .bind(&self.description)
        .bind(&self.date_raw)
        .bind(self.starts_at)
        .bind(self.ends_at)
        .bind(&self.location_name)
        .bind(&self.address)
        .bind(self.is_virtual)
        .bind(&self.cost)
        .bind(&self.tags)
        .bind(&self.source_url)
        .bind(self.validation_status)
        .bind(self.validation_confidence)
        .bind(&self.validation_notes)
        .bind(&self.fingerprint)
        .bind(self.is_duplicate)
        .bind(self.created_at)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    pub async fn find_by_fingerprint(fingerprint: &str, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, EventRecord>(
            "SELECT * FROM events WHERE fingerprint = $1",
        )
        .bind(fingerprint)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Events in a market starting on a given day, the fuzzy-duplicate
    /// scan set.
    pub async fn find_by_market_and_date(
        market_id: Uuid,
        date: NaiveDate,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, EventRecord>(
            r#"
            SELECT * FROM events
            WHERE market_id = $1 AND starts_at::date = $2
            "#,
        )
        .bind(market_id)
        .bind(date)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Listing for the collaborator API, all filters optional.
    pub async fn list(
        job_id: Option<Uuid>,
        market_id: Option<Uuid>,
        status: Option<ValidationState>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, EventRecord>(
            r#"
            SELECT * FROM events
            WHERE ($1::uuid IS NULL OR job_id = $1)
              AND ($2::uuid IS NULL OR market_id = $2)
              AND ($3::validation_status IS NULL OR validation_status = $3)
            ORDER BY created_at DESC
            LIMIT $4
            "#,
        )
        .bind(job_id)
        .bind(market_id)
        .bind(status)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}
