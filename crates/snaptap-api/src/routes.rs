//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{download_file, download_zip, health, job_status, recent_jobs, submit_job};
use crate::middleware::{cors_layer, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/download", post(submit_job))
        .route("/status/:job_id", get(job_status))
        .route("/recent", get(recent_jobs))
        // Static segment wins over the capture, so /zip never shadows an index
        .route("/files/:job_id/zip", get(download_zip))
        .route("/files/:job_id/:file_index", get(download_file));

    let health_routes = Router::new().route("/health", get(health));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
