//! Per-job downloader worker.
//!
//! One task per job, spawned at submission time; the creating request never
//! waits on it. Items are processed strictly in submission order, and one
//! item's failure never aborts the rest of the job.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use snaptap_media::{DownloadProgress, DownloadRequest, DownloadStage, Downloader};
use snaptap_models::{ItemState, JobId, JobStatus};

use crate::store::JobStore;

/// Spawn the background worker for a job.
pub fn spawn_job(
    store: JobStore,
    downloader: Arc<dyn Downloader>,
    job_id: JobId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_job(store, downloader, job_id).await;
    })
}

/// Process every item of a job, then set its aggregate status.
pub async fn run_job(store: JobStore, downloader: Arc<dyn Downloader>, job_id: JobId) {
    let Some(job) = store.get(&job_id).await else {
        warn!(job_id = %job_id, "Worker started for unknown job");
        return;
    };

    info!(job_id = %job_id, items = job.items.len(), format = %job.format, "Job started");
    store
        .update(&job_id, |job| job.status = JobStatus::Running)
        .await;

    for index in 0..job.items.len() {
        let url = job.items[index].url.clone();

        store
            .update(&job_id, |job| {
                job.items[index].state = ItemState::Downloading;
                job.items[index].progress = 0.0;
            })
            .await;

        // Progress events cross from the downloader's sync callback into the
        // async store through this channel.
        let (tx, mut rx) = mpsc::unbounded_channel::<DownloadProgress>();
        let relay_store = store.clone();
        let relay_id = job_id.clone();
        let relay = tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                relay_store
                    .update(&relay_id, |job| {
                        let item = &mut job.items[index];
                        item.progress = update.percent;
                        item.state = match update.stage {
                            DownloadStage::Downloading => ItemState::Downloading,
                            DownloadStage::Converting => ItemState::Converting,
                        };
                    })
                    .await;
            }
        });

        let request = DownloadRequest {
            url: url.clone(),
            format: job.format,
            output_dir: job.output_dir.clone(),
        };
        let result = downloader
            .download(request, Box::new(move |p| {
                let _ = tx.send(p);
            }))
            .await;

        // The sender is owned by the callback, which the downloader has
        // dropped by now; wait for the relay to drain so a stale progress
        // event can't overwrite the terminal state below.
        let _ = relay.await;

        match result {
            Ok(path) => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.to_string_lossy().to_string());
                store
                    .update(&job_id, |job| job.items[index].complete(file_name.clone()))
                    .await;
                info!(job_id = %job_id, index, url = %url, "Item done");
            }
            Err(e) => {
                error!(job_id = %job_id, index, url = %url, "Item failed: {}", e);
                store
                    .update(&job_id, |job| job.items[index].fail(e.to_string()))
                    .await;
            }
        }
    }

    store
        .update(&job_id, |job| {
            job.status = JobStatus::aggregate(&job.items);
        })
        .await;

    if let Some(job) = store.get(&job_id).await {
        info!(job_id = %job_id, status = %job.status.as_str(), "Job finished");
    }
}
