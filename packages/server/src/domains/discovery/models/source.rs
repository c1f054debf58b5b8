//! Crawl source model - a URL crawled on a recurring schedule.
//!
//! Health fields (`consecutive_failures`, `active`, last-crawl columns) are
//! mutated exclusively through [`CrawlSource::apply_health`] after each
//! crawl attempt, keeping the rules themselves in `discovery::health`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use discovery::{CrawlFrequency, SourceConfig, SourceHealth};

/// Crawl cadence, mirrored from the pipeline's frequency classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "crawl_frequency", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SourceFrequency {
    Daily,
    TwiceWeekly,
    Weekly,
}

impl From<SourceFrequency> for CrawlFrequency {
    fn from(frequency: SourceFrequency) -> Self {
        match frequency {
            SourceFrequency::Daily => CrawlFrequency::Daily,
            SourceFrequency::TwiceWeekly => CrawlFrequency::TwiceWeekly,
            SourceFrequency::Weekly => CrawlFrequency::Weekly,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CrawlSource {
    pub id: Uuid,
    pub market_id: Uuid,
    pub name: String,
    pub url: String,
    pub content_selector: Option<String>,
    pub frequency: SourceFrequency,
    pub active: bool,
    pub consecutive_failures: i32,
    pub last_crawl_status: Option<String>,
    pub last_crawl_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_events_found: i64,
    pub total_events_found: i64,
    pub created_at: DateTime<Utc>,
}

impl CrawlSource {
    /// Read-only view handed to the crawl strategy.
    pub fn to_config(&self) -> SourceConfig {
        SourceConfig {
            id: self.id,
            name: self.name.clone(),
            url: self.url.clone(),
            content_selector: self.content_selector.clone(),
        }
    }

    /// Health view for the pipeline's bookkeeping rules.
    pub fn to_health(&self) -> SourceHealth {
        SourceHealth {
            active: self.active,
            consecutive_failures: self.consecutive_failures,
            frequency: self.frequency.into(),
            last_crawl_at: self.last_crawl_at,
            last_crawl_status: self.last_crawl_status.clone(),
            last_error: self.last_error.clone(),
            last_events_found: self.last_events_found,
            total_events_found: self.total_events_found,
        }
    }

    // =========================================================================
    // SQL Queries - ALL queries must be in models/
    // =========================================================================

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let source = sqlx::query_as::<_, CrawlSource>(
            "SELECT * FROM crawl_sources WHERE id = $1",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(source)
    }

    /// Active sources in a market that are due for a crawl: never crawled,
    /// or past the interval for their frequency class. Auto-disabled
    /// sources drop out of this set until manually re-enabled.
    pub async fn find_due_for_crawl(market_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        let sources = sqlx::query_as::<_, CrawlSource>(
            r#"
            SELECT * FROM crawl_sources
            WHERE active = true
              AND market_id = $1
              AND (last_crawl_at IS NULL
                   OR last_crawl_at < NOW() - (
                       CASE frequency
                           WHEN 'daily'::crawl_frequency THEN INTERVAL '24 hours'
                           WHEN 'twice_weekly'::crawl_frequency THEN INTERVAL '84 hours'
                           ELSE INTERVAL '168 hours'
                       END))
            ORDER BY last_crawl_at NULLS FIRST
            "#,
        )
        .bind(market_id)
        .fetch_all(pool)
        .await?;
        Ok(sources)
    }

    /// Persist a mutated health view after a crawl attempt.
    pub async fn apply_health(id: Uuid, health: &SourceHealth, pool: &PgPool) -> Result<Self> {
        let source = sqlx::query_as::<_, CrawlSource>(
            r#"
            UPDATE crawl_sources
            SET active = $2,
                consecutive_failures = $3,
                last_crawl_status = $4,
                last_crawl_at = $5,
                last_error = $6,
                last_events_found = $7,
                total_events_found = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(health.active)
        .bind(health.consecutive_failures)
        .bind(&health.last_crawl_status)
        .bind(health.last_crawl_at)
        .bind(&health.last_error)
        .bind(health.last_events_found)
        .bind(health.total_events_found)
        .fetch_one(pool)
        .await?;
        Ok(source)
    }

    /// Manual reactivation; the pipeline itself never re-enables a source.
    pub async fn set_active(id: Uuid, active: bool, pool: &PgPool) -> Result<Self> {
        let source = sqlx::query_as::<_, CrawlSource>(
            r#"
            UPDATE crawl_sources
            SET active = $2, consecutive_failures = CASE WHEN $2 THEN 0 ELSE consecutive_failures END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(active)
        .fetch_one(pool)
        .await?;
        Ok(source)
    }
}
