//! yt-dlp progress parsing.
//!
//! With `--newline`, yt-dlp emits one status line per progress tick:
//!
//! ```text
//! [download]  42.3% of 10.27MiB at 2.81MiB/s ETA 00:02
//! [download] 100% of 10.27MiB in 00:03
//! [ExtractAudio] Destination: /data/abc/Song.mp3
//! [Merger] Merging formats into "/data/abc/Clip.mp4"
//! ```

use serde::{Deserialize, Serialize};

/// Stage of a single-URL extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStage {
    /// Fetching media from the source
    Downloading,
    /// Post-processing: audio extraction or container merge
    Converting,
}

/// Progress information parsed from one yt-dlp output line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub stage: DownloadStage,
    /// Percentage 0-100; post-processing stages report 100
    pub percent: f32,
}

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(DownloadProgress) + Send + 'static>;

/// Parse one line of yt-dlp `--newline` output.
///
/// Returns `None` for lines that carry no progress information.
pub fn parse_progress_line(line: &str) -> Option<DownloadProgress> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("[download]") {
        // "  42.3% of ..." - percent is the first token
        let token = rest.split_whitespace().next()?;
        let percent: f32 = token.strip_suffix('%')?.parse().ok()?;
        return Some(DownloadProgress {
            stage: DownloadStage::Downloading,
            percent: percent.clamp(0.0, 100.0),
        });
    }

    if line.starts_with("[ExtractAudio]") || line.starts_with("[Merger]") {
        return Some(DownloadProgress {
            stage: DownloadStage::Converting,
            percent: 100.0,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_download_percent() {
        let p = parse_progress_line("[download]  42.3% of 10.27MiB at 2.81MiB/s ETA 00:02")
            .unwrap();
        assert_eq!(p.stage, DownloadStage::Downloading);
        assert!((p.percent - 42.3).abs() < 0.01);

        let p = parse_progress_line("[download] 100% of 10.27MiB in 00:03").unwrap();
        assert!((p.percent - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_parse_postprocess_stages() {
        let p = parse_progress_line("[ExtractAudio] Destination: /data/x/Song.mp3").unwrap();
        assert_eq!(p.stage, DownloadStage::Converting);

        let p = parse_progress_line("[Merger] Merging formats into \"/data/x/Clip.mp4\"").unwrap();
        assert_eq!(p.stage, DownloadStage::Converting);
    }

    #[test]
    fn test_ignores_non_progress_lines() {
        assert!(parse_progress_line("[youtube] abc: Downloading webpage").is_none());
        assert!(parse_progress_line("[download] Destination: /data/x/Song.webm").is_none());
        assert!(parse_progress_line("").is_none());
    }
}
