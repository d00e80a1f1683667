//! Maps the upstream payload onto [`VideoInfo`].
//!
//! The API answers in two shapes: fields nested under `data`, or the same
//! fields at the top level. Every field is looked up through an ordered list
//! of JSON pointers and the first present, non-empty value wins.

use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::model::{DownloadUrls, Music, Uploader, VideoInfo};

pub const PLACEHOLDER_AVATAR: &str = "https://images.pexels.com/photos/1239291/pexels-photo-1239291.jpeg?auto=compress&cs=tinysrgb&w=48&h=48&fit=crop";

const TITLE: &[&str] = &["/data/title", "/title"];
const ID: &[&str] = &["/data/id", "/aweme_id"];
const USERNAME: &[&str] = &[
    "/data/author/unique_id",
    "/data/author/nickname",
    "/author/unique_id",
    "/author/nickname",
    "/data/author/username",
    "/author/username",
];
const AVATAR: &[&str] = &[
    "/data/author/avatar_larger",
    "/data/author/avatar_medium",
    "/data/author/avatar_thumb",
    "/author/avatar_larger",
    "/author/avatar_medium",
    "/author/avatar_thumb",
    "/data/author/avatar",
    "/author/avatar",
];
const SONG: &[&str] = &["/data/music/title", "/music/title"];
const ARTIST: &[&str] = &["/data/music/author", "/music/author", "/data/author/nickname"];
const DURATION: &[&str] = &["/data/duration", "/duration"];
const NO_WATERMARK: &[&str] = &["/data/hdplay", "/data/play", "/hdplay", "/play"];
const WITH_WATERMARK: &[&str] = &["/data/wmplay", "/wmplay", "/data/play", "/play"];

pub fn normalize(payload: &Value) -> AppResult<VideoInfo> {
    let download_urls = DownloadUrls {
        no_watermark: first_text(payload, NO_WATERMARK).unwrap_or_default(),
        with_watermark: first_text(payload, WITH_WATERMARK).unwrap_or_default(),
        audio_only: String::new(),
    };
    if download_urls.no_watermark.is_empty() && download_urls.with_watermark.is_empty() {
        return Err(AppError::NoDownloadUrls);
    }

    Ok(VideoInfo {
        title: first_text(payload, TITLE).unwrap_or_else(|| "TikTok Video".to_string()),
        id: first_text(payload, ID).unwrap_or_else(|| "Unknown".to_string()),
        uploader: Uploader {
            username: at_username(&first_text(payload, USERNAME).unwrap_or_else(|| "unknown".to_string())),
            profile_picture: first_text(payload, AVATAR)
                .unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string()),
        },
        music: Music {
            song_name: first_text(payload, SONG).unwrap_or_else(|| "Original Sound".to_string()),
            artist: first_text(payload, ARTIST).unwrap_or_else(|| "TikTok".to_string()),
        },
        duration: format_duration(first_seconds(payload, DURATION)),
        download_urls,
    })
}

/// `65` -> `1:05`, missing -> `0:00`
pub fn format_duration(seconds: Option<u64>) -> String {
    let secs = seconds.unwrap_or(0);
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn at_username(raw: &str) -> String {
    if raw.starts_with('@') {
        raw.to_string()
    } else {
        format!("@{raw}")
    }
}

fn first_text(payload: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|p| match payload.pointer(p)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        // ids regularly arrive as bare numbers; zero counts as missing
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    })
}

// Zero counts as missing, same as an absent field.
fn first_seconds(payload: &Value, pointers: &[&str]) -> Option<u64> {
    pointers.iter().find_map(|p| {
        let secs = match payload.pointer(p)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        (secs >= 1.0).then(|| secs.floor() as u64)
    })
}
