//! HTTP handlers.

pub mod files;
pub mod health;
pub mod jobs;

pub use files::{download_file, download_zip};
pub use health::health;
pub use jobs::{recent_jobs, submit_job, job_status};
