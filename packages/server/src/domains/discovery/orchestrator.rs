//! Job orchestrator: drives one claimed job through the linear pipeline.
//!
//! Acquisition → Validation → Dedup/Store, persisting every status
//! transition so observers see live progress. Acquisition failures are
//! fatal to the job (no retry; a re-run is a new job); per-item failures
//! inside validation and storage are absorbed by the stages themselves.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use discovery::pipeline::store_outcomes;
use discovery::providers::validator::ValidationContext;
use discovery::providers::CallLogger;
use discovery::{
    Acquisition, AcquisitionStrategy, CrawlOutcome, CrawlStrategy, DateWindow, DedupEngine,
    SearchStrategy, ValidationStage,
};

use crate::kernel::ServerKernel;

use super::models::{Category, CrawlSource, DiscoveryJob, JobMethod, JobStatus, Market};
use super::store_bridge::{PostgresCallLogger, PostgresEventStore};

pub struct Orchestrator {
    kernel: Arc<ServerKernel>,
}

impl Orchestrator {
    pub fn new(kernel: Arc<ServerKernel>) -> Self {
        Self { kernel }
    }

    /// Run a claimed job to its terminal state.
    ///
    /// Any error from the pipeline marks the job failed with the message
    /// recorded; this method itself never propagates pipeline errors.
    pub async fn run(&self, job: DiscoveryJob) {
        let job_id = job.id;
        tracing::info!(job_id = %job_id, method = ?job.method, "starting discovery job");

        if let Err(e) = self.execute(&job).await {
            tracing::error!(job_id = %job_id, error = %e, "discovery job failed");
            match DiscoveryJob::fail(job_id, &e.to_string(), &self.kernel.db_connection).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(job_id = %job_id, "job already terminal, failure not recorded")
                }
                Err(persist_err) => {
                    tracing::error!(job_id = %job_id, error = %persist_err, "could not mark job failed")
                }
            }
        }
    }

    async fn execute(&self, job: &DiscoveryJob) -> Result<()> {
        let pool = &self.kernel.db_connection;
        let market = Market::find_by_id(job.market_id, pool)
            .await
            .context("job references unknown market")?;
        let market_config = market.to_config();
        let window = DateWindow::new(job.window_start, job.window_end);
        let logger: Arc<dyn CallLogger> = Arc::new(PostgresCallLogger::new(pool.clone()));

        // Acquisition. The claim already moved the job into its running
        // status (searching/crawling).
        let (acquisition, context) = match job.method {
            JobMethod::Search => self.acquire_by_search(job, &market_config, window, &logger).await?,
            JobMethod::Crawl => self.acquire_by_crawl(job, &market_config, window, &logger).await?,
        };

        DiscoveryJob::record_acquisition(
            job.id,
            acquisition.candidates.len() as i64,
            &acquisition.query,
            &acquisition.raw_response,
            pool,
        )
        .await?;

        // Validation: one provider call per candidate, per-item failures
        // absorbed by the stage.
        DiscoveryJob::transition(job.id, JobStatus::Validating, pool).await?;
        let stage = ValidationStage::new(self.kernel.validation_provider.clone(), logger);
        let outcomes = stage
            .validate(acquisition.candidates, &context, Some(job.id))
            .await;

        // Dedup and storage.
        DiscoveryJob::transition(job.id, JobStatus::Storing, pool).await?;
        let engine = DedupEngine::new(Arc::new(PostgresEventStore::new(pool.clone())));
        let counters = store_outcomes(&engine, job.market_id, outcomes).await;

        DiscoveryJob::complete(job.id, counters.validated, counters.stored, pool).await?;
        tracing::info!(
            job_id = %job.id,
            validated = counters.validated,
            stored = counters.stored,
            exact_duplicates = counters.exact_duplicates,
            flagged_duplicates = counters.flagged_duplicates,
            rejected = counters.rejected,
            "discovery job completed"
        );
        Ok(())
    }

    async fn acquire_by_search(
        &self,
        job: &DiscoveryJob,
        market: &discovery::MarketConfig,
        window: DateWindow,
        logger: &Arc<dyn CallLogger>,
    ) -> Result<(Acquisition, ValidationContext)> {
        let pool = &self.kernel.db_connection;
        let category_id = job
            .category_id
            .ok_or_else(|| anyhow!("search job has no category"))?;
        let category = Category::find_by_id(category_id, pool)
            .await
            .context("job references unknown category")?;

        let context = ValidationContext {
            market_name: market.name.clone(),
            region: market.region.clone(),
            category: Some(category.name.clone()),
            pillar: Some(category.pillar.clone()),
        };

        let strategy = SearchStrategy::new(
            self.kernel.search_provider.clone(),
            logger.clone(),
            category.to_config(),
        )
        .with_job(job.id);

        let acquisition = strategy.acquire(market, window).await?;
        Ok((acquisition, context))
    }

    async fn acquire_by_crawl(
        &self,
        job: &DiscoveryJob,
        market: &discovery::MarketConfig,
        window: DateWindow,
        logger: &Arc<dyn CallLogger>,
    ) -> Result<(Acquisition, ValidationContext)> {
        let pool = &self.kernel.db_connection;
        let source_id = job
            .source_id
            .ok_or_else(|| anyhow!("crawl job has no source"))?;
        let source = CrawlSource::find_by_id(source_id, pool)
            .await
            .context("job references unknown source")?;

        let context = ValidationContext {
            market_name: market.name.clone(),
            region: market.region.clone(),
            category: None,
            pillar: None,
        };

        let strategy = CrawlStrategy::new(
            self.kernel.event_extractor.clone(),
            logger.clone(),
            source.to_config(),
        )?
        .with_job(job.id);

        match strategy.acquire(market, window).await {
            Ok(acquisition) => {
                let outcome = if acquisition.candidates.is_empty() {
                    CrawlOutcome::NoEvents
                } else {
                    CrawlOutcome::Success {
                        events_found: acquisition.candidates.len() as i64,
                    }
                };
                self.record_source_outcome(&source, &outcome).await;
                Ok((acquisition, context))
            }
            Err(e) => {
                // Only fetch failures count against the source; a provider
                // outage is not the source's fault.
                if e.is_source_failure() {
                    self.record_source_outcome(
                        &source,
                        &CrawlOutcome::Error {
                            message: e.to_string(),
                        },
                    )
                    .await;
                }
                Err(e.into())
            }
        }
    }

    /// Apply a crawl outcome to the source's health and persist it. Health
    /// bookkeeping failures are logged, not fatal: the job result stands on
    /// its own.
    async fn record_source_outcome(&self, source: &CrawlSource, outcome: &CrawlOutcome) {
        let mut health = source.to_health();
        health.record_outcome(outcome, chrono::Utc::now());
        if let Err(e) =
            CrawlSource::apply_health(source.id, &health, &self.kernel.db_connection).await
        {
            tracing::error!(source_id = %source.id, error = %e, "failed to persist source health");
        }
    }
}
