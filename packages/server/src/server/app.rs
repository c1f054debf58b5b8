//! Application setup and router composition.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerKernel;
use crate::server::routes::{events, health, jobs};

/// Build the collaborator-facing router.
pub fn build_app(kernel: Arc<ServerKernel>) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/jobs", post(jobs::create_job).get(jobs::list_jobs))
        .route("/api/jobs/batch", post(jobs::create_batch))
        .route("/api/jobs/:id", get(jobs::get_job))
        .route("/api/events", get(events::list_events))
        .layer(TraceLayer::new_for_http())
        .with_state(kernel)
}
