//! Category model - one search job per active category per market batch.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use discovery::CategoryConfig;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub pillar: String,
    pub search_prompt: Option<String>,
    pub exclusions: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn to_config(&self) -> CategoryConfig {
        CategoryConfig {
            id: self.id,
            name: self.name.clone(),
            pillar: self.pillar.clone(),
            search_prompt: self.search_prompt.clone(),
            exclusions: self.exclusions.clone(),
        }
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(category)
    }

    pub async fn find_active(pool: &PgPool) -> Result<Vec<Self>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE active = true ORDER BY name",
        )
        .fetch_all(pool)
        .await?;
        Ok(categories)
    }
}
