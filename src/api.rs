use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};
use crate::model::VideoInfo;
use crate::normalize::normalize;

/// Asks the extraction API about `video_url` and normalizes the answer.
///
/// One request, no retry and no timeout. `video_url` should already have
/// passed [`crate::validate::validate_tiktok_url`].
pub async fn fetch_video_info(client: &Client, api: &ApiConfig, video_url: &str) -> AppResult<VideoInfo> {
    if api.key.is_empty() {
        return Err(AppError::MissingApiKey);
    }
    let request_url = Url::parse_with_params(&api.endpoint, &[("url", video_url)])?;
    info!(%video_url, "fetching video info");

    let response = client
        .get(request_url)
        .header("X-RapidAPI-Key", &api.key)
        .header("X-RapidAPI-Host", &api.host)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        warn!(status = status.as_u16(), "extraction API refused the request");
        return Err(AppError::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        });
    }

    let body = response.text().await?;
    let payload: Value = serde_json::from_str(&body)?;
    check_code(&payload)?;
    let video = normalize(&payload)?;
    debug!(id = %video.id, title = %video.title, "video info normalized");
    Ok(video)
}

/// The payload carries its own status: `code` 0 or 200 means success.
pub fn check_code(payload: &Value) -> AppResult<()> {
    match payload.get("code").and_then(Value::as_i64) {
        Some(0 | 200) => Ok(()),
        _ => {
            let msg = payload
                .get("msg")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .unwrap_or("Failed to fetch video information");
            Err(AppError::Upstream(msg.to_string()))
        }
    }
}
