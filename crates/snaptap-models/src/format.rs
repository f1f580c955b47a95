//! Target media formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing an unknown format string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported format: {0} (choose mp3 or mp4)")]
pub struct FormatParseError(pub String);

/// Output format for a job, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    /// Audio-only extraction, transcoded to 320kbps MP3
    #[default]
    Mp3,
    /// Best available video+audio, merged into an MP4 container
    Mp4,
}

impl MediaFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFormat::Mp3 => "mp3",
            MediaFormat::Mp4 => "mp4",
        }
    }

    /// File extension produced by yt-dlp for this format.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Whether yt-dlp runs a post-processing (transcode) step for this format.
    pub fn requires_transcode(&self) -> bool {
        matches!(self, MediaFormat::Mp3)
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(MediaFormat::Mp3),
            "mp4" => Ok(MediaFormat::Mp4),
            other => Err(FormatParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        assert_eq!("mp3".parse::<MediaFormat>(), Ok(MediaFormat::Mp3));
        assert_eq!("MP4".parse::<MediaFormat>(), Ok(MediaFormat::Mp4));
        assert!("flac".parse::<MediaFormat>().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        assert_eq!(serde_json::to_string(&MediaFormat::Mp3).unwrap(), "\"mp3\"");
        let parsed: MediaFormat = serde_json::from_str("\"mp4\"").unwrap();
        assert_eq!(parsed, MediaFormat::Mp4);
        assert!(serde_json::from_str::<MediaFormat>("\"avi\"").is_err());
    }

    #[test]
    fn test_transcode_flag() {
        assert!(MediaFormat::Mp3.requires_transcode());
        assert!(!MediaFormat::Mp4.requires_transcode());
    }
}
