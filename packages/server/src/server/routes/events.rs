//! Stored-event listing for downstream curation.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::domains::discovery::models::{EventRecord, ValidationState};
use crate::kernel::ServerKernel;
use crate::server::error::ApiError;

#[derive(Deserialize)]
pub struct ListEventsQuery {
    pub job: Option<Uuid>,
    pub market: Option<Uuid>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_events(
    State(kernel): State<Arc<ServerKernel>>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Vec<EventRecord>>, ApiError> {
    let status = match &query.status {
        Some(raw) => Some(
            ValidationState::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown status: {raw}")))?,
        ),
        None => None,
    };

    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    let events =
        EventRecord::list(query.job, query.market, status, limit, &kernel.db_connection).await?;
    Ok(Json(events))
}
