//! Application state.

use std::sync::Arc;

use snaptap_media::{Downloader, MediaResult, YtDlp};

use crate::config::AppConfig;
use crate::store::JobStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: JobStore,
    pub downloader: Arc<dyn Downloader>,
}

impl AppState {
    /// Create application state with the real yt-dlp downloader.
    ///
    /// Fails only if cookie text from the environment cannot be written to
    /// its backing temp file.
    pub fn new(config: AppConfig) -> MediaResult<Self> {
        let downloader = Arc::new(YtDlp::from_cookie_sources(
            config.cookies_file.clone(),
            config.cookies_text.as_deref(),
        )?);
        Ok(Self {
            config: Arc::new(config),
            store: JobStore::new(),
            downloader,
        })
    }

    /// Create state with an injected downloader (used by tests).
    pub fn with_downloader(config: AppConfig, downloader: Arc<dyn Downloader>) -> Self {
        Self {
            config: Arc::new(config),
            store: JobStore::new(),
            downloader,
        }
    }
}
