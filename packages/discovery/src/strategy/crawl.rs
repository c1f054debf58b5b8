//! Crawl-based acquisition.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AcquisitionError;
use crate::html::extract_readable_text;
use crate::providers::logger::{CallLogger, CallMeta, ProviderCallRecord};
use crate::providers::search::EventExtractor;
use crate::strategy::{Acquisition, AcquisitionStrategy};
use crate::types::candidate::filter_candidates;
use crate::types::context::{DateWindow, MarketConfig, SourceConfig};

/// Timeout for fetching a crawl target. The only timeout in a job: the job
/// itself has none.
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Acquires candidates by fetching one configured source page and having
/// the provider extract events from its readable text.
pub struct CrawlStrategy {
    http_client: reqwest::Client,
    extractor: Arc<dyn EventExtractor>,
    logger: Arc<dyn CallLogger>,
    source: SourceConfig,
    job_id: Option<Uuid>,
}

impl CrawlStrategy {
    pub fn new(
        extractor: Arc<dyn EventExtractor>,
        logger: Arc<dyn CallLogger>,
        source: SourceConfig,
    ) -> Result<Self, AcquisitionError> {
        let http_client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent("townbeat-crawler/0.1")
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| AcquisitionError::Transport {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http_client,
            extractor,
            logger,
            source,
            job_id: None,
        })
    }

    /// Attach the discovery job id for provenance and call audit.
    pub fn with_job(mut self, job_id: Uuid) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// Fetch the source page. Any transport or HTTP failure is a
    /// source-unreachable error, which the orchestrator also records against
    /// the source's health.
    async fn fetch_page(&self) -> Result<String, AcquisitionError> {
        let url = &self.source.url;
        let response = self.http_client.get(url).send().await.map_err(|e| {
            AcquisitionError::SourceUnreachable {
                url: url.clone(),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::SourceUnreachable {
                url: url.clone(),
                message: format!("HTTP {status}"),
            });
        }

        response
            .text()
            .await
            .map_err(|e| AcquisitionError::SourceUnreachable {
                url: url.clone(),
                message: format!("failed to read body: {e}"),
            })
    }
}

/// Assemble the extraction prompt for a source page.
pub fn build_extraction_prompt(
    source: &SourceConfig,
    market: &MarketConfig,
    window: DateWindow,
    page_text: &str,
) -> String {
    format!(
        "The following text came from {} ({}), a page covering events in {} \
         ({}). List every event in the text happening between {} and {}. Use \
         the page URL as source_url when the text gives no better link.\n\n\
         Page text:\n{}",
        source.name,
        source.url,
        market.name,
        market.region,
        window.start.format("%Y-%m-%d"),
        window.end.format("%Y-%m-%d"),
        page_text
    )
}

#[async_trait]
impl AcquisitionStrategy for CrawlStrategy {
    fn method(&self) -> &'static str {
        "crawl"
    }

    async fn acquire(
        &self,
        market: &MarketConfig,
        window: DateWindow,
    ) -> Result<Acquisition, AcquisitionError> {
        tracing::info!(source = %self.source.name, url = %self.source.url, "crawling source");

        let html = self.fetch_page().await?;
        let page_text = extract_readable_text(&html, self.source.content_selector.as_deref());

        if page_text.is_empty() {
            tracing::warn!(url = %self.source.url, "page had no readable text");
            return Ok(Acquisition {
                candidates: vec![],
                query: String::new(),
                raw_response: String::new(),
            });
        }

        let prompt = build_extraction_prompt(&self.source, market, window, &page_text);

        let reply = match self.extractor.extract_events(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                self.logger
                    .log_call(ProviderCallRecord::new(
                        "crawl",
                        "extract_events",
                        &prompt,
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
                "crawl",
                "extract_events",
                &prompt,
                &reply.raw,
                reply.meta,
                true,
                self.job_id,
            ))
            .await;

        let parsed: Vec<_> = reply
            .events
            .into_iter()
            .map(|raw| raw.into_candidate())
            .collect();
        let parsed_count = parsed.len();

        let mut candidates = filter_candidates(parsed, window.start);
        for candidate in &mut candidates {
            candidate.job_id = self.job_id;
            if candidate.source_url.is_none() {
                candidate.source_url = Some(self.source.url.clone());
            }
        }

        tracing::info!(
            source = %self.source.name,
            parsed = parsed_count,
            kept = candidates.len(),
            "crawl acquisition complete"
        );

        Ok(Acquisition {
            candidates,
            query: prompt,
            raw_response: reply.raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_extraction_prompt_includes_source_and_window() {
        let source = SourceConfig {
            id: Uuid::new_v4(),
            name: "Parks Department".into(),
            url: "https://parks.example.org/events".into(),
            content_selector: None,
        };
        let market = MarketConfig {
            id: Uuid::new_v4(),
            name: "Springfield".into(),
            region: "Springfield metro area".into(),
            center_lat: 44.9,
            center_lng: -93.2,
            radius_miles: 25.0,
        };
        let window =
            DateWindow::days_from(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(), 7);

        let prompt = build_extraction_prompt(&source, &market, window, "Yoga at dawn, June 3.");
        assert!(prompt.contains("Parks Department"));
        assert!(prompt.contains("https://parks.example.org/events"));
        assert!(prompt.contains("2025-06-01"));
        assert!(prompt.contains("2025-06-08"));
        assert!(prompt.contains("Yoga at dawn"));
    }
}
