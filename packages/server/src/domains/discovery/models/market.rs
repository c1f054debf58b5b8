//! Market model - a metro area the pipeline discovers events for.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use discovery::MarketConfig;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Market {
    pub id: Uuid,
    pub name: String,
    pub region: String,
    pub center_lat: f64,
    pub center_lng: f64,
    pub radius_miles: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Market {
    /// Read-only view handed to the pipeline.
    pub fn to_config(&self) -> MarketConfig {
        MarketConfig {
            id: self.id,
            name: self.name.clone(),
            region: self.region.clone(),
            center_lat: self.center_lat,
            center_lng: self.center_lng,
            radius_miles: self.radius_miles,
        }
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let market = sqlx::query_as::<_, Market>("SELECT * FROM markets WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(market)
    }

    pub async fn find_active(pool: &PgPool) -> Result<Vec<Self>> {
        let markets = sqlx::query_as::<_, Market>(
            "SELECT * FROM markets WHERE active = true ORDER BY created_at",
        )
        .fetch_all(pool)
        .await?;
        Ok(markets)
    }
}
