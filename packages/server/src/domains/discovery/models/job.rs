//! Discovery job model: the durable record of one discovery attempt.
//!
//! The jobs table doubles as the work queue. Workers claim due pending rows
//! with `FOR UPDATE SKIP LOCKED`; every status transition is persisted
//! before the next stage begins, and terminal rows are write-protected.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// States of the linear job pipeline. No cycles: a job moves forward until
/// `completed`, or drops to `failed` from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "discovery_job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Searching,
    Crawling,
    Validating,
    Storing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal states accept no further writes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Legal forward transitions of the pipeline.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == JobStatus::Failed {
            return true;
        }
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Searching)
                | (JobStatus::Pending, JobStatus::Crawling)
                | (JobStatus::Searching, JobStatus::Validating)
                | (JobStatus::Crawling, JobStatus::Validating)
                | (JobStatus::Validating, JobStatus::Storing)
                | (JobStatus::Storing, JobStatus::Completed)
        )
    }
}

/// How a job acquires candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "discovery_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobMethod {
    Search,
    Crawl,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct DiscoveryJob {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,
    pub market_id: Uuid,
    /// Set for search jobs.
    #[builder(default, setter(strip_option))]
    pub category_id: Option<Uuid>,
    /// Set for crawl jobs.
    #[builder(default, setter(strip_option))]
    pub source_id: Option<Uuid>,
    pub method: JobMethod,
    #[builder(default)]
    pub status: JobStatus,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    #[builder(default = 0)]
    pub events_found: i64,
    #[builder(default = 0)]
    pub events_validated: i64,
    #[builder(default = 0)]
    pub events_stored: i64,
    /// Exact prompt/query sent to the provider.
    #[builder(default, setter(strip_option))]
    pub query_used: Option<String>,
    /// Raw provider response, kept for audit.
    #[builder(default, setter(strip_option))]
    pub raw_response: Option<String>,
    #[builder(default, setter(strip_option))]
    pub error_message: Option<String>,
    /// Stagger anchor: workers only claim jobs whose run_at is due.
    #[builder(default = Utc::now())]
    pub run_at: DateTime<Utc>,
    #[builder(default, setter(strip_option))]
    pub worker_id: Option<String>,
    #[builder(default, setter(strip_option))]
    pub started_at: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub completed_at: Option<DateTime<Utc>>,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl DiscoveryJob {
    /// Insert a new job row.
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        let job = sqlx::query_as::<_, DiscoveryJob>(
            r#"
            INSERT INTO discovery_jobs (
                id, market_id, category_id, source_id, method, status,
                window_start, window_end, events_found, events_validated,
                events_stored, query_used, raw_response, error_message,
                run_at, worker_id, started_at, completed_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.market_id)
        .bind(self.category_id)
        .bind(self.source_id)
        .bind(self.method)
        .bind(self.status)
        .bind(self.window_start)
        .bind(self.window_end)
        .bind(self.events_found)
        .bind(self.events_validated)
        .bind(self.events_stored)
        .bind(&self.query_used)
        .bind(&self.raw_response)
        .bind(&self.error_message)
        .bind(self.run_at)
        .bind(&self.worker_id)
        .bind(self.started_at)
        .bind(self.completed_at)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await?;
        Ok(job)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        let job = sqlx::query_as::<_, DiscoveryJob>(
            "SELECT * FROM discovery_jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(job)
    }

    /// Recent jobs, optionally limited to one market.
    pub async fn list_recent(
        market_id: Option<Uuid>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let jobs = sqlx::query_as::<_, DiscoveryJob>(
            r#"
            SELECT * FROM discovery_jobs
            WHERE ($1::uuid IS NULL OR market_id = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(market_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(jobs)
    }

    /// Claim the next due pending job for this worker.
    ///
    /// Uses `FOR UPDATE SKIP LOCKED` for concurrent-safe claiming and moves
    /// the job straight into its running status, so observers never see a
    /// claimed job still marked pending.
    pub async fn claim_due(worker_id: &str, pool: &PgPool) -> Result<Option<Self>> {
        let job = sqlx::query_as::<_, DiscoveryJob>(
            r#"
            UPDATE discovery_jobs
            SET status = CASE method
                    WHEN 'search'::discovery_method THEN 'searching'::discovery_job_status
                    ELSE 'crawling'::discovery_job_status
                END,
                worker_id = $1,
                started_at = NOW(),
                updated_at = NOW()
            WHERE id = (
                SELECT id FROM discovery_jobs
                WHERE status = 'pending' AND run_at <= NOW()
                ORDER BY run_at
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(worker_id)
        .fetch_optional(pool)
        .await?;
        Ok(job)
    }

    /// Persist a status transition, refusing writes to terminal rows.
    ///
    /// Returns false when the row was terminal (or missing) and nothing was
    /// written.
    pub async fn transition(id: Uuid, next: JobStatus, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE discovery_jobs
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('completed', 'failed')
            "#,
        )
        .bind(id)
        .bind(next)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record what acquisition produced.
    pub async fn record_acquisition(
        id: Uuid,
        events_found: i64,
        query_used: &str,
        raw_response: &str,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE discovery_jobs
            SET events_found = $2, query_used = $3, raw_response = $4, updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('completed', 'failed')
            "#,
        )
        .bind(id)
        .bind(events_found)
        .bind(query_used)
        .bind(raw_response)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Final transition to completed, with counters.
    pub async fn complete(
        id: Uuid,
        events_validated: i64,
        events_stored: i64,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE discovery_jobs
            SET status = 'completed',
                events_validated = $2,
                events_stored = $3,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('completed', 'failed')
            "#,
        )
        .bind(id)
        .bind(events_validated)
        .bind(events_stored)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Terminal failure with the recorded error. There is no automatic
    /// retry; re-running is a new job.
    pub async fn fail(id: Uuid, error_message: &str, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE discovery_jobs
            SET status = 'failed',
                error_message = $2,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('completed', 'failed')
            "#,
        )
        .bind(id)
        .bind(error_message)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Storing.is_terminal());
    }

    #[test]
    fn test_forward_transitions() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Searching));
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Crawling));
        assert!(JobStatus::Searching.can_transition_to(JobStatus::Validating));
        assert!(JobStatus::Crawling.can_transition_to(JobStatus::Validating));
        assert!(JobStatus::Validating.can_transition_to(JobStatus::Storing));
        assert!(JobStatus::Storing.can_transition_to(JobStatus::Completed));
    }

    #[test]
    fn test_no_skipping_or_backwards() {
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Storing));
        assert!(!JobStatus::Validating.can_transition_to(JobStatus::Searching));
        assert!(!JobStatus::Storing.can_transition_to(JobStatus::Validating));
    }

    #[test]
    fn test_failure_from_any_non_terminal_state() {
        for status in [
            JobStatus::Pending,
            JobStatus::Searching,
            JobStatus::Crawling,
            JobStatus::Validating,
            JobStatus::Storing,
        ] {
            assert!(status.can_transition_to(JobStatus::Failed));
        }
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for next in [
            JobStatus::Pending,
            JobStatus::Searching,
            JobStatus::Validating,
            JobStatus::Storing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert!(!JobStatus::Completed.can_transition_to(next));
            assert!(!JobStatus::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_builder_defaults() {
        let job = DiscoveryJob::builder()
            .market_id(Uuid::new_v4())
            .method(JobMethod::Search)
            .window_start(Utc::now())
            .window_end(Utc::now() + chrono::Duration::days(30))
            .build();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.events_found, 0);
        assert!(job.error_message.is_none());
    }
}
