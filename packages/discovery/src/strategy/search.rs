//! Search-based acquisition.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AcquisitionError;
use crate::parse::parse_candidates;
use crate::providers::logger::{CallLogger, CallMeta, ProviderCallRecord};
use crate::providers::search::SearchProvider;
use crate::strategy::{Acquisition, AcquisitionStrategy};
use crate::types::candidate::filter_candidates;
use crate::types::context::{CategoryConfig, DateWindow, MarketConfig};

/// Acquires candidates by querying a web-search-capable provider for one
/// category in one market.
pub struct SearchStrategy {
    provider: Arc<dyn SearchProvider>,
    logger: Arc<dyn CallLogger>,
    category: CategoryConfig,
    job_id: Option<Uuid>,
}

impl SearchStrategy {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        logger: Arc<dyn CallLogger>,
        category: CategoryConfig,
    ) -> Self {
        Self {
            provider,
            logger,
            category,
            job_id: None,
        }
    }

    /// Attach the discovery job id for provenance and call audit.
    pub fn with_job(mut self, job_id: Uuid) -> Self {
        self.job_id = Some(job_id);
        self
    }
}

/// Assemble the natural-language query for a market/category/window.
pub fn build_search_query(
    market: &MarketConfig,
    category: &CategoryConfig,
    window: DateWindow,
) -> String {
    let mut query = format!(
        "Find upcoming local events in {} ({}) within {:.0} miles of the city \
         center, in the category \"{}\".",
        market.name, market.region, market.radius_miles, category.name
    );
    if let Some(prompt) = &category.search_prompt {
        query.push_str(&format!(" {prompt}"));
    }
    query.push_str(&format!(
        " Only include events happening between {} and {}.",
        window.start.format("%Y-%m-%d"),
        window.end.format("%Y-%m-%d")
    ));
    if let Some(exclusions) = &category.exclusions {
        query.push_str(&format!(" Exclude: {exclusions}."));
    }
    query.push_str(
        " Respond with a JSON array of event objects with fields: title, \
         description, date (ISO 8601), location_name, address, is_virtual, \
         cost, tags, source_url.",
    );
    query
}

#[async_trait]
impl AcquisitionStrategy for SearchStrategy {
    fn method(&self) -> &'static str {
        "search"
    }

    async fn acquire(
        &self,
        market: &MarketConfig,
        window: DateWindow,
    ) -> Result<Acquisition, AcquisitionError> {
        let query = build_search_query(market, &self.category, window);
        tracing::info!(
            market = %market.name,
            category = %self.category.name,
            "running search acquisition"
        );

        let reply = match self.provider.search(&query, Some(window.span_days())).await {
            Ok(reply) => reply,
            Err(e) => {
                self.logger
                    .log_call(ProviderCallRecord::new(
                        "search",
                        "web_search",
                        &query,
                        &e.to_string(),
                        CallMeta::default(),
                        false,
                        self.job_id,
                    ))
                    .await;
                return Err(e);
            }
        };

        self.logger
            .log_call(ProviderCallRecord::new(
                "search",
                "web_search",
                &query,
                &reply.text,
                reply.meta,
                true,
                self.job_id,
            ))
            .await;

        let parsed = parse_candidates(&reply.text);
        let parsed_count = parsed.len();
        let mut candidates = filter_candidates(parsed, window.start);
        for candidate in &mut candidates {
            candidate.job_id = self.job_id;
        }

        tracing::info!(
            parsed = parsed_count,
            kept = candidates.len(),
            "search acquisition complete"
        );

        Ok(Acquisition {
            candidates,
            query,
            raw_response: reply.text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

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
            search_prompt: Some("Include free park programming.".into()),
            exclusions: Some("gym membership promotions".into()),
        }
    }

    fn window() -> DateWindow {
        DateWindow::days_from(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(), 30)
    }

    #[test]
    fn test_query_includes_market_category_and_window() {
        let query = build_search_query(&market(), &category(), window());
        assert!(query.contains("Springfield"));
        assert!(query.contains("Outdoor Fitness"));
        assert!(query.contains("2025-06-01"));
        assert!(query.contains("2025-07-01"));
        assert!(query.contains("free park programming"));
        assert!(query.contains("Exclude: gym membership promotions"));
        assert!(query.contains("JSON array"));
    }

    #[test]
    fn test_query_without_optional_prompts() {
        let mut cat = category();
        cat.search_prompt = None;
        cat.exclusions = None;
        let query = build_search_query(&market(), &cat, window());
        assert!(!query.contains("Exclude:"));
    }
}
