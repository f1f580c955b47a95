//! TTL-based cleanup of expired jobs.
//!
//! Runs on a fixed interval and evicts jobs that are terminal, older than
//! the TTL, and not currently being read. Eviction deletes the job's
//! directory tree and its store record; both halves tolerate already-gone
//! state, so a repeated sweep is a no-op.

use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::store::JobStore;

/// Cleanup janitor service.
pub struct CleanupJanitor {
    store: JobStore,
    ttl: Duration,
    sweep_interval: Duration,
}

impl CleanupJanitor {
    pub fn new(store: JobStore, ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            store,
            ttl,
            sweep_interval,
        }
    }

    /// Run the sweep loop indefinitely; spawn as a background task.
    pub async fn run(&self) {
        info!(
            ttl_secs = self.ttl.as_secs(),
            interval_secs = self.sweep_interval.as_secs(),
            "Starting cleanup janitor"
        );

        let mut ticker = interval(self.sweep_interval);

        loop {
            ticker.tick().await;

            match self.sweep_once().await {
                Ok(0) => {}
                Ok(removed) => info!("Cleanup sweep removed {} expired job(s)", removed),
                Err(e) => error!("Cleanup sweep error: {}", e),
            }
        }
    }

    /// Run one sweep; returns the number of jobs evicted.
    pub async fn sweep_once(&self) -> anyhow::Result<usize> {
        let ttl = chrono::Duration::from_std(self.ttl)?;
        let now = Utc::now();
        let mut removed = 0usize;

        for job in self.store.snapshot().await {
            // Only terminal jobs are eligible, however old they are
            if !job.status.is_terminal() {
                continue;
            }
            if job.age(now) <= ttl {
                continue;
            }
            // Someone is streaming a file or ZIP out of this directory;
            // catch the job on a later sweep.
            if self.store.has_readers(&job.id).await {
                warn!(job_id = %job.id, "Skipping expired job with active readers");
                continue;
            }

            match tokio::fs::remove_dir_all(&job.output_dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    error!(
                        job_id = %job.id,
                        dir = %job.output_dir.display(),
                        "Failed to remove job directory: {}", e
                    );
                    continue;
                }
            }

            // Re-check the lease under the write lock: a reader may have
            // arrived since the snapshot check above. If one did, the
            // directory is already gone but the record stays for the next
            // sweep, and the reader's open gets a clean 404.
            if self.store.remove_if_unread(&job.id).await.is_none() {
                warn!(job_id = %job.id, "Expired job gained a reader mid-sweep, deferring");
                continue;
            }
            info!(job_id = %job.id, "Evicted expired job");
            removed += 1;
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaptap_models::{Job, JobStatus, MediaFormat};
    use tempfile::TempDir;

    async fn insert_job(store: &JobStore, data_dir: &std::path::Path, status: JobStatus, age_hours: i64) -> Job {
        let mut job = Job::new(vec!["https://a".into()], MediaFormat::Mp3, data_dir);
        job.status = status;
        job.created_at = Utc::now() - chrono::Duration::hours(age_hours);
        tokio::fs::create_dir_all(&job.output_dir).await.unwrap();
        tokio::fs::write(job.output_dir.join("a.mp3"), b"x")
            .await
            .unwrap();
        store.insert(job.clone()).await;
        job
    }

    fn janitor(store: &JobStore) -> CleanupJanitor {
        CleanupJanitor::new(
            store.clone(),
            Duration::from_secs(6 * 3600),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_expired_terminal_job_is_evicted() {
        let dir = TempDir::new().unwrap();
        let store = JobStore::new();
        let job = insert_job(&store, dir.path(), JobStatus::Done, 7).await;

        let removed = janitor(&store).sweep_once().await.unwrap();

        assert_eq!(removed, 1);
        assert!(store.get(&job.id).await.is_none());
        assert!(!job.output_dir.exists());
    }

    #[tokio::test]
    async fn test_fresh_job_survives() {
        let dir = TempDir::new().unwrap();
        let store = JobStore::new();
        let job = insert_job(&store, dir.path(), JobStatus::Done, 1).await;

        let removed = janitor(&store).sweep_once().await.unwrap();

        assert_eq!(removed, 0);
        assert!(store.get(&job.id).await.is_some());
        assert!(job.output_dir.exists());
    }

    #[tokio::test]
    async fn test_running_job_is_never_evicted() {
        let dir = TempDir::new().unwrap();
        let store = JobStore::new();
        let job = insert_job(&store, dir.path(), JobStatus::Running, 100).await;

        let removed = janitor(&store).sweep_once().await.unwrap();

        assert_eq!(removed, 0);
        assert!(store.get(&job.id).await.is_some());
    }

    #[tokio::test]
    async fn test_active_reader_defers_eviction() {
        let dir = TempDir::new().unwrap();
        let store = JobStore::new();
        let job = insert_job(&store, dir.path(), JobStatus::Partial, 7).await;

        let lease = store.acquire_lease(&job.id).await.unwrap();
        assert_eq!(janitor(&store).sweep_once().await.unwrap(), 0);
        assert!(store.get(&job.id).await.is_some());

        // Once the reader is done the next sweep reaps it
        drop(lease);
        assert_eq!(janitor(&store).sweep_once().await.unwrap(), 1);
        assert!(store.get(&job.id).await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent_on_missing_dir() {
        let dir = TempDir::new().unwrap();
        let store = JobStore::new();
        let job = insert_job(&store, dir.path(), JobStatus::Failed, 7).await;

        // Directory already gone, e.g. removed out-of-band
        tokio::fs::remove_dir_all(&job.output_dir).await.unwrap();

        let removed = janitor(&store).sweep_once().await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(&job.id).await.is_none());

        // Second sweep finds nothing to do
        assert_eq!(janitor(&store).sweep_once().await.unwrap(), 0);
    }
}
