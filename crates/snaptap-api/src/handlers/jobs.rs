//! Job submission, status polling and the recent-jobs listing.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use snaptap_models::{normalize_url, parse_url_list, Job, JobId, JobItem, JobSummary, MediaFormat};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::worker;

/// Request body for `POST /api/download`.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Whitespace/newline separated URLs
    #[serde(default)]
    pub urls: String,

    /// Target format; defaults to mp3
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "mp3".to_string()
}

/// Response body for `POST /api/download`.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: JobId,
}

/// Full job view for `GET /api/status/:job_id`.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub id: JobId,
    pub status: String,
    pub format: MediaFormat,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<JobItem>,
    /// Completed output file names, in item order
    pub files: Vec<String>,
}

/// POST /api/download
///
/// Parse the submitted URL list, create a pending job and spawn its worker.
/// The response returns immediately with the job id; progress is polled via
/// the status endpoint.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    let urls: Vec<String> = parse_url_list(&request.urls)
        .iter()
        .map(|u| normalize_url(u))
        .collect();
    if urls.is_empty() {
        return Err(ApiError::validation("Please provide at least one valid URL."));
    }

    let format: MediaFormat = request
        .format
        .parse()
        .map_err(|e: snaptap_models::FormatParseError| ApiError::validation(e.to_string()))?;

    let job = Job::new(urls, format, &state.config.data_dir);
    let job_id = job.id.clone();

    info!(job_id = %job_id, urls = job.items.len(), format = %format, "Job submitted");

    state.store.insert(job).await;
    worker::spawn_job(state.store.clone(), state.downloader.clone(), job_id.clone());

    Ok(Json(SubmitResponse { job_id }))
}

/// GET /api/status/:job_id
///
/// Returns the job's aggregate status plus ordered per-item states,
/// progress and file names; 404 once the janitor has reaped the job.
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job = state
        .store
        .get(&JobId::from_string(job_id))
        .await
        .ok_or_else(|| ApiError::not_found("Job not found."))?;

    Ok(Json(JobStatusResponse {
        id: job.id.clone(),
        status: job.status.as_str().to_string(),
        format: job.format,
        created_at: job.created_at.to_rfc3339(),
        updated_at: job.updated_at.to_rfc3339(),
        files: job.completed_files().iter().map(|f| f.to_string()).collect(),
        items: job.items,
    }))
}

/// GET /api/recent
///
/// Most recent jobs, newest first, capped at `MAX_RECENT`.
pub async fn recent_jobs(State(state): State<AppState>) -> Json<Vec<JobSummary>> {
    Json(state.store.list_recent(state.config.max_recent).await)
}
