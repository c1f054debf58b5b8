//! Read-only configuration views handed to the pipeline.
//!
//! These mirror the configuration store's market/category/source records.
//! The pipeline never writes them; curation screens own their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Market geometry and identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub id: Uuid,
    pub name: String,
    /// Human description of the covered region, used in provider prompts.
    pub region: String,
    pub center_lat: f64,
    pub center_lng: f64,
    pub radius_miles: f64,
}

/// Category metadata used to assemble search queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub id: Uuid,
    pub name: String,
    /// Domain taxonomy tag (not structurally relevant to the pipeline).
    pub pillar: String,
    /// Optional category-specific search sub-prompt.
    pub search_prompt: Option<String>,
    /// Optional exclusion rules appended to the query.
    pub exclusions: Option<String>,
}

/// Crawl target configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    /// Optional CSS selector narrowing extraction to the content region.
    pub content_selector: Option<String>,
}

/// Half-open `[start, end)` discovery window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window spanning `days` from `start`.
    pub fn days_from(start: DateTime<Utc>, days: i64) -> Self {
        Self {
            start,
            end: start + chrono::Duration::days(days),
        }
    }

    /// Whole days covered, rounded up; used as the provider recency hint.
    pub fn span_days(&self) -> i64 {
        let secs = (self.end - self.start).num_seconds().max(0);
        (secs + 86_399) / 86_400
    }
}
