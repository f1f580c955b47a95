//! Job definitions.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ItemState, JobItem, MediaFormat};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Aggregate status of a job, derived from its item states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, worker not yet started
    #[default]
    Pending,
    /// Worker is iterating the items
    Running,
    /// Every item finished successfully
    Done,
    /// Every item failed
    Failed,
    /// Mixed outcome after the worker finished iterating
    Partial,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
            JobStatus::Partial => "partial",
        }
    }

    /// Terminal jobs are eligible for TTL eviction.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed | JobStatus::Partial)
    }

    /// Compute the aggregate status once the worker has finished iterating.
    ///
    /// `done` iff all items are done, `failed` iff all items errored,
    /// `partial` otherwise.
    pub fn aggregate(items: &[JobItem]) -> Self {
        if !items.is_empty() && items.iter().all(|i| i.state == ItemState::Done) {
            JobStatus::Done
        } else if !items.is_empty() && items.iter().all(|i| i.state == ItemState::Error) {
            JobStatus::Failed
        } else {
            JobStatus::Partial
        }
    }
}

/// One user submission: a set of URLs and a target format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Target format, fixed at creation
    pub format: MediaFormat,

    /// Per-URL records, in submission order
    pub items: Vec<JobItem>,

    /// Aggregate status
    #[serde(default)]
    pub status: JobStatus,

    /// Creation timestamp (drives TTL eviction)
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Job-scoped output directory
    pub output_dir: PathBuf,
}

impl Job {
    /// Create a pending job for a list of URLs.
    ///
    /// `urls` must already be parsed and non-empty; `data_dir` is the
    /// server-wide download root under which the job directory is scoped.
    pub fn new(urls: Vec<String>, format: MediaFormat, data_dir: &std::path::Path) -> Self {
        let id = JobId::new();
        let now = Utc::now();
        let output_dir = data_dir.join(id.as_str());

        Self {
            items: urls.into_iter().map(JobItem::new).collect(),
            format,
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            output_dir,
            id,
        }
    }

    /// Age of the job.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }

    /// Names of the output files of completed items, in item order.
    pub fn completed_files(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| i.state == ItemState::Done)
            .filter_map(|i| i.output_file.as_deref())
            .collect()
    }

    /// Summary view for the recent-jobs listing.
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            format: self.format,
            status: self.status,
            created_at: self.created_at,
            url_count: self.items.len(),
        }
    }
}

/// Compact job view for `GET /api/recent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    pub format: MediaFormat,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub url_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn job_with_states(states: &[ItemState]) -> Vec<JobItem> {
        states
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut item = JobItem::new(format!("https://example.com/{i}"));
                item.state = *s;
                item
            })
            .collect()
    }

    #[test]
    fn test_job_creation() {
        let job = Job::new(
            vec!["https://a".into(), "https://b".into()],
            MediaFormat::Mp3,
            Path::new("/tmp/data"),
        );

        assert_eq!(job.items.len(), 2);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.items[0].url, "https://a");
        assert_eq!(job.output_dir, Path::new("/tmp/data").join(job.id.as_str()));
    }

    #[test]
    fn test_aggregate_all_done() {
        let items = job_with_states(&[ItemState::Done, ItemState::Done]);
        assert_eq!(JobStatus::aggregate(&items), JobStatus::Done);
    }

    #[test]
    fn test_aggregate_all_failed() {
        let items = job_with_states(&[ItemState::Error, ItemState::Error]);
        assert_eq!(JobStatus::aggregate(&items), JobStatus::Failed);
    }

    #[test]
    fn test_aggregate_mixed_is_partial() {
        let items = job_with_states(&[ItemState::Done, ItemState::Error]);
        assert_eq!(JobStatus::aggregate(&items), JobStatus::Partial);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Partial.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn test_completed_files_skips_unfinished() {
        let mut items = job_with_states(&[ItemState::Done, ItemState::Downloading]);
        items[0].output_file = Some("a.mp3".into());

        let job = Job {
            items,
            ..Job::new(vec!["x".into()], MediaFormat::Mp3, Path::new("/tmp"))
        };
        assert_eq!(job.completed_files(), vec!["a.mp3"]);
    }
}
