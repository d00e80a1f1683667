use std::fmt;
use std::path::PathBuf;

/// Normalized metadata for one fetched video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub title: String,
    pub id: String,
    pub uploader: Uploader,
    pub music: Music,
    /// Already formatted as `m:ss`
    pub duration: String,
    pub download_urls: DownloadUrls,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Uploader {
    /// Always starts with `@`
    pub username: String,
    pub profile_picture: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Music {
    pub song_name: String,
    pub artist: String,
}

/// Empty string means "not available"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadUrls {
    pub no_watermark: String,
    pub with_watermark: String,
    /// Audio downloads are disabled; this stays empty.
    pub audio_only: String,
}

impl DownloadUrls {
    pub fn get(&self, kind: DownloadKind) -> &str {
        match kind {
            DownloadKind::NoWatermark => &self.no_watermark,
            DownloadKind::WithWatermark => &self.with_watermark,
            DownloadKind::AudioOnly => &self.audio_only,
        }
    }
}

/// Which variant of the video the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    NoWatermark,
    WithWatermark,
    AudioOnly,
}

impl DownloadKind {
    /// Whether the UI may ever enable this kind.
    pub fn is_supported(self) -> bool {
        !matches!(self, DownloadKind::AudioOnly)
    }

    /// Target file name, e.g. `tsun-123-no-watermark.mp4`. `None` for kinds
    /// that cannot be downloaded.
    ///
    /// The id comes from upstream, so both parts are reduced to
    /// `[A-Za-z0-9_-]` and the result is always a single path component.
    pub fn file_name(self, prefix: &str, video_id: &str) -> Option<String> {
        let prefix = file_safe(prefix, "tsun");
        let video_id = file_safe(video_id, "video");
        match self {
            DownloadKind::NoWatermark => Some(format!("{prefix}-{video_id}-no-watermark.mp4")),
            DownloadKind::WithWatermark => Some(format!("{prefix}-{video_id}-with-watermark.mp4")),
            DownloadKind::AudioOnly => None,
        }
    }
}

fn file_safe(raw: &str, fallback: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if cleaned.chars().all(|c| c == '_') {
        fallback.to_string()
    } else {
        cleaned
    }
}

impl fmt::Display for DownloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DownloadKind::NoWatermark => "no-watermark",
            DownloadKind::WithWatermark => "with-watermark",
            DownloadKind::AudioOnly => "audio-only",
        })
    }
}

/// Represents the current state of a download
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadStatus {
    /// Download is in progress
    Downloading,
    /// Download has completed successfully, saved at the given path
    Done(PathBuf),
    /// Download failed and the URL was handed to the browser
    Failed(String),
}

/// Data structure for tracking a download task in the UI
pub struct DownloadTask {
    /// Unique key for progress routing (the target file name)
    pub file_name: String,
    /// Human-readable title of the video
    pub title: String,
    /// Current status of the download
    pub status: DownloadStatus,
    /// Progress fraction (0.0 to 1.0)
    pub progress: f32,
}
