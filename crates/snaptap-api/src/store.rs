//! In-memory job store.
//!
//! Process-lifetime only: initialized empty at startup, no persistence.
//! The store is a cloneable handle injected into request handlers through
//! `AppState`; all mutation happens under the write lock, so readers always
//! see item records whole.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use snaptap_models::{Job, JobId, JobSummary};

/// Shared handle to the job table.
#[derive(Clone, Default)]
pub struct JobStore {
    inner: Arc<RwLock<HashMap<JobId, JobEntry>>>,
}

struct JobEntry {
    job: Job,
    /// Read-lease token: file and ZIP serving clone this while reading the
    /// job directory, and the janitor skips jobs with outstanding clones.
    lease: Arc<()>,
}

/// Lease held while streaming a job's files.
///
/// Keeps the janitor from deleting the directory mid-read; dropped
/// automatically when the response has been built.
pub struct ReadLease {
    _token: Arc<()>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created job.
    pub async fn insert(&self, job: Job) {
        let mut jobs = self.inner.write().await;
        jobs.insert(
            job.id.clone(),
            JobEntry {
                job,
                lease: Arc::new(()),
            },
        );
    }

    /// Get a snapshot of a job.
    pub async fn get(&self, id: &JobId) -> Option<Job> {
        let jobs = self.inner.read().await;
        jobs.get(id).map(|e| e.job.clone())
    }

    /// Mutate a job under the write lock, bumping `updated_at`.
    ///
    /// Returns false if the job no longer exists (already reaped).
    pub async fn update<F>(&self, id: &JobId, f: F) -> bool
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.inner.write().await;
        match jobs.get_mut(id) {
            Some(entry) => {
                f(&mut entry.job);
                entry.job.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Most recent jobs first, truncated to `limit`.
    pub async fn list_recent(&self, limit: usize) -> Vec<JobSummary> {
        let jobs = self.inner.read().await;
        let mut summaries: Vec<JobSummary> = jobs.values().map(|e| e.job.summary()).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries.truncate(limit);
        summaries
    }

    /// Snapshot of every job, for the janitor sweep.
    pub async fn snapshot(&self) -> Vec<Job> {
        let jobs = self.inner.read().await;
        jobs.values().map(|e| e.job.clone()).collect()
    }

    /// Remove a job record. Idempotent.
    pub async fn remove(&self, id: &JobId) -> Option<Job> {
        let mut jobs = self.inner.write().await;
        jobs.remove(id).map(|e| e.job)
    }

    /// Remove a job record unless a read lease is outstanding.
    ///
    /// The lease check and the removal happen under one write lock, so a
    /// lease acquired concurrently either blocks this call or keeps the
    /// record alive. Returns `None` when the job is leased or already gone.
    pub async fn remove_if_unread(&self, id: &JobId) -> Option<Job> {
        let mut jobs = self.inner.write().await;
        match jobs.get(id) {
            Some(entry) if Arc::strong_count(&entry.lease) > 1 => None,
            Some(_) => jobs.remove(id).map(|e| e.job),
            None => None,
        }
    }

    /// Acquire a read lease on a job's directory.
    pub async fn acquire_lease(&self, id: &JobId) -> Option<ReadLease> {
        let jobs = self.inner.read().await;
        jobs.get(id).map(|e| ReadLease {
            _token: Arc::clone(&e.lease),
        })
    }

    /// Whether any read lease on the job is outstanding.
    pub async fn has_readers(&self, id: &JobId) -> bool {
        let jobs = self.inner.read().await;
        jobs.get(id)
            .map(|e| Arc::strong_count(&e.lease) > 1)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaptap_models::{ItemState, JobStatus, MediaFormat};
    use std::path::Path;

    fn make_job(urls: &[&str]) -> Job {
        Job::new(
            urls.iter().map(|s| s.to_string()).collect(),
            MediaFormat::Mp3,
            Path::new("/tmp/snaptap-test"),
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = JobStore::new();
        let job = make_job(&["https://a"]);
        let id = job.id.clone();

        store.insert(job).await;
        let fetched = store.get(&id).await.unwrap();
        assert_eq!(fetched.items.len(), 1);

        let missing = JobId::from_string("nope");
        assert!(store.get(&missing).await.is_none());
    }

    #[tokio::test]
    async fn test_update_bumps_timestamp() {
        let store = JobStore::new();
        let job = make_job(&["https://a"]);
        let id = job.id.clone();
        let created = job.updated_at;
        store.insert(job).await;

        let ok = store
            .update(&id, |job| {
                job.status = JobStatus::Running;
                job.items[0].state = ItemState::Downloading;
            })
            .await;
        assert!(ok);

        let fetched = store.get(&id).await.unwrap();
        assert_eq!(fetched.status, JobStatus::Running);
        assert_eq!(fetched.items[0].state, ItemState::Downloading);
        assert!(fetched.updated_at >= created);
    }

    #[tokio::test]
    async fn test_update_missing_job_is_noop() {
        let store = JobStore::new();
        let ok = store
            .update(&JobId::from_string("gone"), |job| {
                job.status = JobStatus::Done;
            })
            .await;
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_list_recent_orders_and_truncates() {
        let store = JobStore::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let mut job = make_job(&["https://a"]);
            job.created_at = Utc::now() - chrono::Duration::minutes(10 - i);
            ids.push(job.id.clone());
            store.insert(job).await;
        }

        let recent = store.list_recent(3).await;
        assert_eq!(recent.len(), 3);
        // Newest first: the last inserted job has the latest created_at
        assert_eq!(recent[0].id, ids[4]);
        assert_eq!(recent[1].id, ids[3]);
        assert!(recent[0].created_at >= recent[1].created_at);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = JobStore::new();
        let job = make_job(&["https://a"]);
        let id = job.id.clone();
        store.insert(job).await;

        assert!(store.remove(&id).await.is_some());
        assert!(store.remove(&id).await.is_none());
        assert!(store.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_read_lease_tracking() {
        let store = JobStore::new();
        let job = make_job(&["https://a"]);
        let id = job.id.clone();
        store.insert(job).await;

        assert!(!store.has_readers(&id).await);

        let lease = store.acquire_lease(&id).await.unwrap();
        assert!(store.has_readers(&id).await);

        drop(lease);
        assert!(!store.has_readers(&id).await);

        assert!(store.acquire_lease(&JobId::from_string("gone")).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_if_unread_respects_leases() {
        let store = JobStore::new();
        let job = make_job(&["https://a"]);
        let id = job.id.clone();
        store.insert(job).await;

        let lease = store.acquire_lease(&id).await.unwrap();
        assert!(store.remove_if_unread(&id).await.is_none());
        assert!(store.get(&id).await.is_some());

        drop(lease);
        assert!(store.remove_if_unread(&id).await.is_some());
        assert!(store.get(&id).await.is_none());

        // Already gone
        assert!(store.remove_if_unread(&id).await.is_none());
    }
}
