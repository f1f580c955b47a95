//! yt-dlp CLI wrapper for media extraction.
//!
//! This crate provides:
//! - Per-URL download/transcode via the external `yt-dlp` binary
//! - Progress parsing from `--newline` output
//! - Output file discovery and filename sanitization
//! - A `Downloader` trait seam so the worker can be tested without yt-dlp

pub mod download;
pub mod error;
pub mod fs_utils;
pub mod progress;

pub use download::{check_ytdlp, DownloadRequest, Downloader, YtDlp};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{safe_filename, unique_archive_name};
pub use progress::{parse_progress_line, DownloadProgress, DownloadStage, ProgressCallback};
