//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Root directory for job output directories
    pub data_dir: PathBuf,
    /// Netscape cookies file passed through to yt-dlp
    pub cookies_file: Option<PathBuf>,
    /// Raw cookie text, materialized into a temp file when no file is mounted
    pub cookies_text: Option<String>,
    /// Maximum number of jobs returned by the recent listing
    pub max_recent: usize,
    /// Age after which a terminal job is purged
    pub job_ttl: Duration,
    /// Interval between janitor sweeps
    pub cleanup_interval: Duration,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            data_dir: PathBuf::from("./tmp_downloads"),
            cookies_file: None,
            cookies_text: None,
            max_recent: 10,
            job_ttl: Duration::from_secs(6 * 3600),
            cleanup_interval: Duration::from_secs(30 * 60),
            cors_origins: vec!["*".to_string()],
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
        }
    }
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("SNAPTAP_HOST").unwrap_or(defaults.host),
            port: std::env::var("SNAPTAP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: std::env::var("SNAPTAP_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            cookies_file: std::env::var("YTDLP_COOKIES_FILE").ok().map(PathBuf::from),
            cookies_text: std::env::var("YTDLP_COOKIES_TEXT").ok(),
            max_recent: std::env::var("MAX_RECENT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_recent),
            job_ttl: std::env::var("JOB_TTL_HOURS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(|h| Duration::from_secs(h * 3600))
                .unwrap_or(defaults.job_ttl),
            cleanup_interval: std::env::var("CLEANUP_INTERVAL_MINUTES")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(|m| Duration::from_secs(m * 60))
                .unwrap_or(defaults.cleanup_interval),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.max_recent, 10);
        assert_eq!(config.job_ttl, Duration::from_secs(6 * 3600));
        assert_eq!(config.cleanup_interval, Duration::from_secs(30 * 60));
        assert!(!config.is_production());
    }
}
