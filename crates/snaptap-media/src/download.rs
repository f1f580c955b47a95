//! Media download using yt-dlp.
//!
//! One invocation per URL: yt-dlp fetches the source and (for mp3) runs the
//! ffmpeg post-processor itself, so this module only builds arguments,
//! relays progress lines, and attributes the produced file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use snaptap_models::MediaFormat;

use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{files_with_extension, newest_new_file};
use crate::progress::{parse_progress_line, ProgressCallback};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A single-URL extraction request.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Source URL
    pub url: String,
    /// Target format
    pub format: MediaFormat,
    /// Job-scoped directory the output lands in
    pub output_dir: PathBuf,
}

/// Seam between the job worker and the external extraction binary.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch one URL into the request's output directory.
    ///
    /// Returns the path of the produced file. Progress is relayed through
    /// the callback as yt-dlp reports it.
    async fn download(
        &self,
        request: DownloadRequest,
        progress: ProgressCallback,
    ) -> MediaResult<PathBuf>;
}

/// Check if yt-dlp is available.
pub fn check_ytdlp() -> MediaResult<PathBuf> {
    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)
}

/// Real downloader backed by the `yt-dlp` binary.
pub struct YtDlp {
    /// Netscape cookies file handed through to yt-dlp, if configured
    cookies_file: Option<PathBuf>,
    /// Backing file for cookie text supplied via environment; removed on drop
    cookies_temp: Option<tempfile::NamedTempFile>,
}

impl YtDlp {
    pub fn new(cookies_file: Option<PathBuf>) -> Self {
        Self {
            cookies_file,
            cookies_temp: None,
        }
    }

    /// Resolve cookies from either a mounted file or raw cookie text.
    ///
    /// A mounted file always wins. Otherwise the text is materialized into a
    /// temp file that lives as long as this downloader.
    pub fn from_cookie_sources(
        cookies_file: Option<PathBuf>,
        cookies_text: Option<&str>,
    ) -> MediaResult<Self> {
        let cookies_temp = match (&cookies_file, cookies_text) {
            (None, Some(text)) if !text.trim().is_empty() => {
                let mut tmp = tempfile::Builder::new()
                    .prefix("snaptap-cookies-")
                    .suffix(".txt")
                    .tempfile()?;
                tmp.write_all(text.as_bytes())?;
                tmp.flush()?;
                Some(tmp)
            }
            _ => None,
        };

        Ok(Self {
            cookies_file,
            cookies_temp,
        })
    }

    fn cookies_path(&self) -> Option<&Path> {
        self.cookies_file
            .as_deref()
            .or_else(|| self.cookies_temp.as_ref().map(|t| t.path()))
    }

    /// Build the argument vector for one URL.
    fn build_args(&self, request: &DownloadRequest) -> Vec<String> {
        let output_template = request
            .output_dir
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .to_string();

        let mut args: Vec<String> = vec![
            "--newline".into(),
            "--no-playlist".into(),
            "--no-warnings".into(),
            "--user-agent".into(),
            USER_AGENT.into(),
            "--add-header".into(),
            "Accept-Language:en-US,en;q=0.9".into(),
            "-o".into(),
            output_template,
        ];

        match request.format {
            MediaFormat::Mp3 => {
                args.extend([
                    "-f".into(),
                    "bestaudio/best".into(),
                    "-x".into(),
                    "--audio-format".into(),
                    "mp3".into(),
                    "--audio-quality".into(),
                    "320K".into(),
                ]);
            }
            MediaFormat::Mp4 => {
                args.extend([
                    "-f".into(),
                    "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".into(),
                    "--merge-output-format".into(),
                    "mp4".into(),
                ]);
            }
        }

        if let Some(cookies) = self.cookies_path() {
            args.push("--cookies".into());
            args.push(cookies.to_string_lossy().to_string());
        }

        args.push(request.url.clone());
        args
    }
}

#[async_trait]
impl Downloader for YtDlp {
    async fn download(
        &self,
        request: DownloadRequest,
        progress: ProgressCallback,
    ) -> MediaResult<PathBuf> {
        check_ytdlp()?;

        tokio::fs::create_dir_all(&request.output_dir).await?;

        let ext = request.format.extension();
        let before = files_with_extension(&request.output_dir, ext).await?;

        let args = self.build_args(&request);
        debug!("Running yt-dlp {}", args.join(" "));
        info!(url = %request.url, format = %request.format, "Starting extraction");

        let mut child = Command::new("yt-dlp")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Progress lines arrive on stdout with --newline
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::download_failed("failed to capture yt-dlp stdout"))?;
        let progress_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(update) = parse_progress_line(&line) {
                    progress(update);
                }
            }
        });

        // Drain stderr concurrently so the child never blocks on a full pipe
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::download_failed("failed to capture yt-dlp stderr"))?;
        let stderr_handle = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let status = child.wait().await?;
        let _ = progress_handle.await;
        let stderr_output = stderr_handle.await.unwrap_or_default();

        if !status.success() {
            debug!("yt-dlp stderr: {}", stderr_output);
            let cause = stderr_output
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("yt-dlp exited with non-zero status");
            return Err(MediaError::download_failed(cause));
        }

        let after = files_with_extension(&request.output_dir, ext).await?;
        let output = newest_new_file(&before, &after).await;

        match output {
            Some(path) => {
                info!(url = %request.url, output = %path.display(), "Extraction complete");
                Ok(path)
            }
            None => {
                warn!(url = %request.url, "yt-dlp succeeded but no new output file found");
                Err(MediaError::OutputMissing(request.output_dir))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(format: MediaFormat) -> DownloadRequest {
        DownloadRequest {
            url: "https://www.youtube.com/watch?v=abc123def45".into(),
            format,
            output_dir: PathBuf::from("/data/job1"),
        }
    }

    #[test]
    fn test_mp3_args() {
        let args = YtDlp::new(None).build_args(&request(MediaFormat::Mp3));

        assert!(args.contains(&"--newline".to_string()));
        assert!(args.contains(&"-x".to_string()));
        assert!(args.contains(&"--audio-format".to_string()));
        assert!(args.contains(&"320K".to_string()));
        assert!(!args.contains(&"--cookies".to_string()));
        assert_eq!(args.last().unwrap(), &request(MediaFormat::Mp3).url);
    }

    #[test]
    fn test_mp4_args() {
        let args = YtDlp::new(None).build_args(&request(MediaFormat::Mp4));

        assert!(args.contains(&"--merge-output-format".to_string()));
        assert!(args.contains(&"mp4".to_string()));
        assert!(!args.contains(&"-x".to_string()));
    }

    #[test]
    fn test_cookies_passthrough() {
        let ytdlp = YtDlp::new(Some(PathBuf::from("/etc/snaptap/cookies.txt")));
        let args = ytdlp.build_args(&request(MediaFormat::Mp3));

        let idx = args.iter().position(|a| a == "--cookies").unwrap();
        assert_eq!(args[idx + 1], "/etc/snaptap/cookies.txt");
    }

    fn cookies_arg(ytdlp: &YtDlp) -> Option<String> {
        let args = ytdlp.build_args(&request(MediaFormat::Mp3));
        let idx = args.iter().position(|a| a == "--cookies")?;
        Some(args[idx + 1].clone())
    }

    #[test]
    fn test_cookie_text_materializes_temp_file() {
        let text = "# Netscape HTTP Cookie File\n.youtube.com\tTRUE\t/\tTRUE\t0\tk\tv\n";
        let ytdlp = YtDlp::from_cookie_sources(None, Some(text)).unwrap();

        let path = cookies_arg(&ytdlp).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn test_cookie_file_wins_over_text() {
        let ytdlp = YtDlp::from_cookie_sources(
            Some(PathBuf::from("/etc/snaptap/cookies.txt")),
            Some("ignored"),
        )
        .unwrap();

        assert_eq!(cookies_arg(&ytdlp).unwrap(), "/etc/snaptap/cookies.txt");
    }

    #[test]
    fn test_cookie_temp_file_removed_on_drop() {
        let ytdlp = YtDlp::from_cookie_sources(None, Some("cookie data")).unwrap();
        let path = PathBuf::from(cookies_arg(&ytdlp).unwrap());
        assert!(path.exists());

        drop(ytdlp);
        assert!(!path.exists());
    }

    #[test]
    fn test_blank_cookie_text_is_ignored() {
        let ytdlp = YtDlp::from_cookie_sources(None, Some("   \n")).unwrap();
        assert!(cookies_arg(&ytdlp).is_none());
    }

    #[test]
    fn test_output_template_is_job_scoped() {
        let args = YtDlp::new(None).build_args(&request(MediaFormat::Mp3));
        let idx = args.iter().position(|a| a == "-o").unwrap();
        assert!(args[idx + 1].starts_with("/data/job1/"));
    }
}
