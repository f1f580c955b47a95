//! Per-URL item state within a job.

use serde::{Deserialize, Serialize};

/// State of a single URL within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Waiting for the worker to reach this item
    #[default]
    Queued,
    /// yt-dlp is fetching the media
    Downloading,
    /// Post-processing (audio extraction / container merge) in progress
    Converting,
    /// Output file written
    Done,
    /// Extraction failed; `error_message` holds the cause
    Error,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Queued => "queued",
            ItemState::Downloading => "downloading",
            ItemState::Converting => "converting",
            ItemState::Done => "done",
            ItemState::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemState::Done | ItemState::Error)
    }
}

/// One submitted URL and its extraction state.
///
/// Mutated exclusively by the downloader worker; readers get cloned
/// snapshots from the job store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobItem {
    /// URL as submitted (after normalization)
    pub url: String,

    /// Current state
    #[serde(default)]
    pub state: ItemState,

    /// Download progress percentage (0-100)
    #[serde(default)]
    pub progress: f32,

    /// Error message (only in `error` state)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Output file name within the job directory (only in `done` state)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

impl JobItem {
    /// Create a new queued item for a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: ItemState::Queued,
            progress: 0.0,
            error_message: None,
            output_file: None,
        }
    }

    /// Mark the item done with its output file name.
    pub fn complete(&mut self, output_file: impl Into<String>) {
        self.state = ItemState::Done;
        self.progress = 100.0;
        self.output_file = Some(output_file.into());
        self.error_message = None;
    }

    /// Mark the item failed with a human-readable cause.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = ItemState::Error;
        self.error_message = Some(message.into());
        self.output_file = None;
    }
}
