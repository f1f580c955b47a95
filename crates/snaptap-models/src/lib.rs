//! Shared data models for the SnapTap backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their per-URL items
//! - Target media formats
//! - URL-list parsing and normalization

pub mod format;
pub mod item;
pub mod job;
pub mod utils;

// Re-export common types
pub use format::{FormatParseError, MediaFormat};
pub use item::{ItemState, JobItem};
pub use job::{Job, JobId, JobStatus, JobSummary};
pub use utils::{normalize_url, parse_url_list};
