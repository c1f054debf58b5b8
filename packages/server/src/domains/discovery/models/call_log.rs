//! Provider call audit rows. Write-only from the pipeline's perspective.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use discovery::providers::ProviderCallRecord;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProviderCall {
    pub id: Uuid,
    pub provider: String,
    pub operation: String,
    pub duration_ms: i64,
    pub total_tokens: Option<i64>,
    pub success: bool,
    pub request_summary: String,
    pub response_summary: String,
    pub job_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ProviderCall {
    pub fn from_record(record: &ProviderCallRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider: record.provider.clone(),
            operation: record.operation.clone(),
            duration_ms: record.duration_ms,
            total_tokens: record.total_tokens,
            success: record.success,
            request_summary: record.request_summary.clone(),
            response_summary: record.response_summary.clone(),
            job_id: record.job_id,
            created_at: Utc::now(),
        }
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO provider_calls (
                id, provider, operation, duration_ms, total_tokens, success,
                request_summary, response_summary, job_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(self.id)
        .bind(&self.provider)
        .bind(&self.operation)
        .bind(self.duration_ms)
        .bind(self.total_tokens)
        .bind(self.success)
        .bind(&self.request_summary)
        .bind(&self.response_summary)
        .bind(self.job_id)
        .bind(self.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }
}
