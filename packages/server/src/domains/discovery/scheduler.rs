//! Batch scheduling with stagger delays.
//!
//! Batches create one pending job per target with `run_at` spaced by a
//! stagger constant, so peak concurrent external calls stay soft-bounded
//! without a hard admission gate. Three grains: per-category within a
//! market's search batch, per-source within its crawl batch, and per-market
//! within the daily full sweep.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use discovery::DateWindow;

use super::models::{Category, CrawlSource, DiscoveryJob, JobMethod, Market};

/// Stagger between category search jobs in one market batch.
pub const CATEGORY_STAGGER_SECS: i64 = 30;
/// Stagger between crawl jobs in one market batch.
pub const SOURCE_STAGGER_SECS: i64 = 45;
/// Stagger between markets in a full sweep (coarsest grain).
pub const MARKET_STAGGER_SECS: i64 = 120;
/// Discovery window length for scheduled batches.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Start time for the i-th job of a batch.
pub fn staggered_run_at(base: DateTime<Utc>, index: usize, stagger_secs: i64) -> DateTime<Utc> {
    base + Duration::seconds(index as i64 * stagger_secs)
}

/// One search job per active category, stagger-spaced from `base`.
pub async fn schedule_market_search(
    market_id: Uuid,
    base: DateTime<Utc>,
    window: DateWindow,
    pool: &PgPool,
) -> Result<Vec<DiscoveryJob>> {
    let categories = Category::find_active(pool).await?;
    let mut jobs = Vec::with_capacity(categories.len());

    for (index, category) in categories.iter().enumerate() {
        let job = DiscoveryJob::builder()
            .market_id(market_id)
            .category_id(category.id)
            .method(JobMethod::Search)
            .window_start(window.start)
            .window_end(window.end)
            .run_at(staggered_run_at(base, index, CATEGORY_STAGGER_SECS))
            .build();
        jobs.push(job.insert(pool).await?);
    }

    tracing::info!(market_id = %market_id, jobs = jobs.len(), "scheduled search batch");
    Ok(jobs)
}

/// One crawl job per due active source, stagger-spaced from `base`.
/// Auto-disabled sources are excluded by the due query.
pub async fn schedule_market_crawls(
    market_id: Uuid,
    base: DateTime<Utc>,
    window: DateWindow,
    pool: &PgPool,
) -> Result<Vec<DiscoveryJob>> {
    let sources = CrawlSource::find_due_for_crawl(market_id, pool).await?;
    let mut jobs = Vec::with_capacity(sources.len());

    for (index, source) in sources.iter().enumerate() {
        let job = DiscoveryJob::builder()
            .market_id(market_id)
            .source_id(source.id)
            .method(JobMethod::Crawl)
            .window_start(window.start)
            .window_end(window.end)
            .run_at(staggered_run_at(base, index, SOURCE_STAGGER_SECS))
            .build();
        jobs.push(job.insert(pool).await?);
    }

    tracing::info!(market_id = %market_id, jobs = jobs.len(), "scheduled crawl batch");
    Ok(jobs)
}

/// Search and crawl batches for every active market, markets themselves
/// stagger-spaced. Returns the number of jobs created.
pub async fn schedule_full_sweep(pool: &PgPool) -> Result<usize> {
    let markets = Market::find_active(pool).await?;
    let now = Utc::now();
    let window = DateWindow::days_from(now, DEFAULT_WINDOW_DAYS);
    let mut total = 0;

    for (index, market) in markets.iter().enumerate() {
        let base = staggered_run_at(now, index, MARKET_STAGGER_SECS);
        total += schedule_market_search(market.id, base, window, pool).await?.len();
        total += schedule_market_crawls(market.id, base, window, pool).await?.len();
    }

    tracing::info!(markets = markets.len(), jobs = total, "scheduled full sweep");
    Ok(total)
}

/// Start the daily full-sweep cron task.
pub async fn start_scheduler(pool: PgPool) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // Full discovery sweep - runs every day at 06:00 UTC
    let sweep_pool = pool.clone();
    let sweep_job = Job::new_async("0 0 6 * * *", move |_uuid, _lock| {
        let pool = sweep_pool.clone();
        Box::pin(async move {
            match schedule_full_sweep(&pool).await {
                Ok(count) => tracing::info!(jobs = count, "daily sweep scheduled"),
                Err(e) => tracing::error!(error = %e, "daily sweep scheduling failed"),
            }
        })
    })?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    tracing::info!("scheduled tasks started (full discovery sweep daily at 06:00 UTC)");
    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stagger_spacing() {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap();
        assert_eq!(staggered_run_at(base, 0, CATEGORY_STAGGER_SECS), base);
        assert_eq!(
            staggered_run_at(base, 1, CATEGORY_STAGGER_SECS),
            base + Duration::seconds(30)
        );
        assert_eq!(
            staggered_run_at(base, 4, SOURCE_STAGGER_SECS),
            base + Duration::seconds(180)
        );
    }

    #[test]
    fn test_market_grain_is_coarsest() {
        assert!(MARKET_STAGGER_SECS > SOURCE_STAGGER_SECS);
        assert!(SOURCE_STAGGER_SECS > CATEGORY_STAGGER_SECS);
    }
}
