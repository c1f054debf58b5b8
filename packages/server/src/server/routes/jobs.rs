//! Job creation and status routes. Plain CRUD over the jobs table; the
//! worker pool picks up whatever lands there.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use discovery::DateWindow;

use crate::domains::discovery::models::{DiscoveryJob, JobMethod};
use crate::domains::discovery::scheduler;
use crate::kernel::ServerKernel;
use crate::server::error::ApiError;

#[derive(Deserialize)]
pub struct CreateJobRequest {
    pub market_id: Uuid,
    /// Exactly one of category_id (search) or source_id (crawl).
    pub category_id: Option<Uuid>,
    pub source_id: Option<Uuid>,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
}

/// Manually trigger a single discovery job. Runs as soon as a worker is
/// free; manual triggers are not staggered.
pub async fn create_job(
    State(kernel): State<Arc<ServerKernel>>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<DiscoveryJob>), ApiError> {
    let method = match (request.category_id, request.source_id) {
        (Some(_), None) => JobMethod::Search,
        (None, Some(_)) => JobMethod::Crawl,
        _ => {
            return Err(ApiError::BadRequest(
                "provide exactly one of category_id or source_id".to_string(),
            ))
        }
    };

    let window_start = request.window_start.unwrap_or_else(Utc::now);
    let window_end = request
        .window_end
        .unwrap_or_else(|| window_start + chrono::Duration::days(scheduler::DEFAULT_WINDOW_DAYS));
    if window_end <= window_start {
        return Err(ApiError::BadRequest(
            "window_end must be after window_start".to_string(),
        ));
    }

    let mut job = DiscoveryJob::builder()
        .market_id(request.market_id)
        .method(method)
        .window_start(window_start)
        .window_end(window_end)
        .build();
    job.category_id = request.category_id;
    job.source_id = request.source_id;

    let job = job.insert(&kernel.db_connection).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[derive(Deserialize)]
pub struct BatchRequest {
    /// Batch one market, or sweep every active market when omitted.
    pub market_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub jobs_created: usize,
}

/// Trigger a staggered batch: one market's search + crawl jobs, or a full
/// sweep across active markets.
pub async fn create_batch(
    State(kernel): State<Arc<ServerKernel>>,
    Json(request): Json<BatchRequest>,
) -> Result<(StatusCode, Json<BatchResponse>), ApiError> {
    let pool = &kernel.db_connection;
    let jobs_created = match request.market_id {
        Some(market_id) => {
            let now = Utc::now();
            let window = DateWindow::days_from(now, scheduler::DEFAULT_WINDOW_DAYS);
            let search = scheduler::schedule_market_search(market_id, now, window, pool).await?;
            let crawls = scheduler::schedule_market_crawls(market_id, now, window, pool).await?;
            search.len() + crawls.len()
        }
        None => scheduler::schedule_full_sweep(pool).await?,
    };

    Ok((StatusCode::CREATED, Json(BatchResponse { jobs_created })))
}

pub async fn get_job(
    State(kernel): State<Arc<ServerKernel>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DiscoveryJob>, ApiError> {
    let job = DiscoveryJob::find_by_id(id, &kernel.db_connection)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(job))
}

#[derive(Deserialize)]
pub struct ListJobsQuery {
    pub market: Option<Uuid>,
    pub limit: Option<i64>,
}

pub async fn list_jobs(
    State(kernel): State<Arc<ServerKernel>>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<DiscoveryJob>>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let jobs = DiscoveryJob::list_recent(query.market, limit, &kernel.db_connection).await?;
    Ok(Json(jobs))
}
