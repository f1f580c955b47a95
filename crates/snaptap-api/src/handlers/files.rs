//! File and ZIP download handlers.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::io::ReaderStream;

use snaptap_media::safe_filename;
use snaptap_models::{ItemState, JobId};

use crate::error::{ApiError, ApiResult};
use crate::packaging::{self, PackagingError};
use crate::state::AppState;
use crate::store::ReadLease;

/// Open file that keeps the job's read lease alive until the body has been
/// fully streamed, so the janitor cannot reap the directory mid-response.
struct LeasedFile {
    file: File,
    _lease: Option<ReadLease>,
}

impl AsyncRead for LeasedFile {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_read(cx, buf)
    }
}

/// GET /api/files/:job_id/:file_index
///
/// Serve one completed item's file as an attachment. 404 when the job or
/// index is unknown or the item has not finished.
pub async fn download_file(
    State(state): State<AppState>,
    Path((job_id, file_index)): Path<(String, usize)>,
) -> ApiResult<Response> {
    let job_id = JobId::from_string(job_id);
    let job = state
        .store
        .get(&job_id)
        .await
        .ok_or_else(|| ApiError::not_found("Job not found."))?;

    let item = job
        .items
        .get(file_index)
        .ok_or_else(|| ApiError::not_found("File not found."))?;

    if item.state != ItemState::Done {
        return Err(ApiError::not_found("File not found."));
    }
    let file_name = item
        .output_file
        .as_deref()
        .ok_or_else(|| ApiError::not_found("File not found."))?;

    // Hold a read lease so an expired job can't be reaped mid-read; the
    // streamed body owns it until the last chunk is sent.
    let lease = state.store.acquire_lease(&job_id).await;

    let path = job.output_dir.join(file_name);
    let file = File::open(&path)
        .await
        .map_err(|_| ApiError::not_found("File not found."))?;
    let len = file
        .metadata()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to stat {}: {}", path.display(), e)))?
        .len();

    let body = Body::from_stream(ReaderStream::new(LeasedFile {
        file,
        _lease: lease,
    }));

    let download_name = safe_filename(file_name, "download");
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(file_name))
        .header(header::CONTENT_LENGTH, len)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download_name),
        )
        .body(body)
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

/// GET /api/files/:job_id/zip
///
/// Bundle the job's completed files into a ZIP. 404 for an unknown job,
/// 409 when nothing has completed yet.
pub async fn download_zip(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let job_id = JobId::from_string(job_id);
    let job = state
        .store
        .get(&job_id)
        .await
        .ok_or_else(|| ApiError::not_found("Job not found."))?;

    let lease = state.store.acquire_lease(&job_id).await;
    let result = packaging::build_zip(&job).await;
    drop(lease);

    let bytes = result.map_err(|e| match e {
        PackagingError::Empty => ApiError::NoCompletedItems,
        other => ApiError::internal(other.to_string()),
    })?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.zip\"", job.id),
        )
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

/// Pick a content type from the file extension.
fn content_type_for(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    if lower.ends_with(".mp3") {
        "audio/mpeg"
    } else if lower.ends_with(".mp4") {
        "video/mp4"
    } else {
        "application/octet-stream"
    }
}
