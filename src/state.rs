//! Form state: `Idle -> Fetching -> InfoDisplayed | ErrorDisplayed`,
//! back to `Idle` whenever the input is edited.

use tracing::debug;

use crate::error::AppResult;
use crate::model::{DownloadKind, VideoInfo};
use crate::validate::validate_tiktok_url;

pub const TITLE_PREVIEW_CHARS: usize = 75;

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Fetching,
    InfoDisplayed(VideoInfo),
    ErrorDisplayed(String),
}

#[derive(Debug)]
pub struct FormState {
    pub url_input: String,
    pub show_full_title: bool,
    phase: Phase,
    /// Download problems shown next to the video panel without leaving it.
    notice: Option<String>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            url_input: String::new(),
            show_full_title: false,
            phase: Phase::Idle,
            notice: None,
        }
    }
}

impl FormState {
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Fetching)
    }

    pub fn video(&self) -> Option<&VideoInfo> {
        match &self.phase {
            Phase::InfoDisplayed(video) => Some(video),
            _ => None,
        }
    }

    /// Message for the error banner, if any.
    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::ErrorDisplayed(msg) => Some(msg),
            _ => self.notice.as_deref(),
        }
    }

    pub fn set_notice(&mut self, msg: impl Into<String>) {
        self.notice = Some(msg.into());
    }

    pub fn input_edited(&mut self) {
        self.notice = None;
        if matches!(self.phase, Phase::InfoDisplayed(_) | Phase::ErrorDisplayed(_)) {
            self.phase = Phase::Idle;
            self.show_full_title = false;
        }
    }

    /// Validates the input and enters `Fetching`. Returns the URL to fetch,
    /// or `None` if a fetch is already running or the input was rejected.
    pub fn begin_fetch(&mut self) -> Option<String> {
        if self.is_loading() {
            return None;
        }
        self.notice = None;
        self.show_full_title = false;
        match validate_tiktok_url(&self.url_input) {
            Ok(url) => {
                self.phase = Phase::Fetching;
                Some(url)
            }
            Err(e) => {
                debug!(error = %e, "rejected input");
                self.phase = Phase::ErrorDisplayed(e.to_string());
                None
            }
        }
    }

    /// Results that arrive after the user moved on are dropped.
    pub fn finish_fetch(&mut self, result: AppResult<VideoInfo>) {
        if !self.is_loading() {
            return;
        }
        self.phase = match result {
            Ok(video) => Phase::InfoDisplayed(video),
            Err(e) => Phase::ErrorDisplayed(format!("Failed to fetch video: {e}")),
        };
    }

    pub fn is_download_enabled(&self, kind: DownloadKind) -> bool {
        kind.is_supported()
            && self
                .video()
                .is_some_and(|v| !v.download_urls.get(kind).is_empty())
    }

    /// URL to download for `kind`, or `None` after posting a notice.
    pub fn download_url(&mut self, kind: DownloadKind) -> Option<String> {
        let Some(video) = self.video() else {
            self.set_notice("Please fetch video information first");
            return None;
        };
        let url = video.download_urls.get(kind).to_string();
        if url.is_empty() {
            self.set_notice(format!(
                "Download URL not available for {kind}. This might be due to API limitations or the video doesn't have this format available."
            ));
            return None;
        }
        Some(url)
    }
}

/// Cuts long titles to a preview unless the user expanded them.
pub fn truncate_title(title: &str, show_full: bool) -> String {
    if show_full || title.chars().count() <= TITLE_PREVIEW_CHARS {
        return title.to_string();
    }
    let preview: String = title.chars().take(TITLE_PREVIEW_CHARS).collect();
    format!("{preview}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::normalize::normalize;
    use serde_json::json;

    fn fetched(payload: serde_json::Value) -> FormState {
        let mut form = FormState {
            url_input: "https://www.tiktok.com/@cat/video/1".to_string(),
            ..Default::default()
        };
        form.begin_fetch().unwrap();
        form.finish_fetch(normalize(&payload));
        form
    }

    #[test]
    fn invalid_input_never_starts_fetching() {
        for input in ["", "  ", "https://youtube.com/watch?v=1", "tiktok"] {
            let mut form = FormState {
                url_input: input.to_string(),
                ..Default::default()
            };
            assert_eq!(form.begin_fetch(), None);
            assert!(matches!(form.phase(), Phase::ErrorDisplayed(_)));
        }
    }

    #[test]
    fn empty_and_invalid_have_distinct_messages() {
        let mut form = FormState::default();
        form.begin_fetch();
        assert_eq!(form.error(), Some("Please enter a TikTok URL"));
        form.url_input = "https://example.com".to_string();
        form.begin_fetch();
        assert_eq!(form.error(), Some("Please enter a valid TikTok URL"));
    }

    #[test]
    fn successful_fetch_enables_no_watermark() {
        let mut form = FormState {
            url_input: "https://vm.tiktok.com/ZMabc/".to_string(),
            ..Default::default()
        };
        assert_eq!(form.phase(), &Phase::Idle);

        let url = form.begin_fetch().unwrap();
        assert_eq!(url, "https://vm.tiktok.com/ZMabc/");
        assert!(form.is_loading());
        assert!(!form.is_download_enabled(DownloadKind::NoWatermark));

        let payload = json!({ "code": 0, "data": { "id": "9", "hdplay": "https://cdn.example/hd.mp4" } });
        form.finish_fetch(normalize(&payload));

        assert!(matches!(form.phase(), Phase::InfoDisplayed(_)));
        assert!(form.is_download_enabled(DownloadKind::NoWatermark));
        assert!(!form.is_download_enabled(DownloadKind::WithWatermark));
        assert!(!form.is_download_enabled(DownloadKind::AudioOnly));
        assert_eq!(form.error(), None);
    }

    #[test]
    fn duplicate_submit_is_ignored_while_fetching() {
        let mut form = FormState {
            url_input: "https://tiktok.com/@a/video/1".to_string(),
            ..Default::default()
        };
        assert!(form.begin_fetch().is_some());
        assert!(form.begin_fetch().is_none());
        assert!(form.is_loading());
    }

    #[test]
    fn missing_download_urls_show_no_panel() {
        let form = fetched(json!({ "code": 0, "data": { "title": "x" } }));
        assert!(form.video().is_none());
        assert_eq!(
            form.error(),
            Some("Failed to fetch video: No download URLs available for this video")
        );
    }

    #[test]
    fn upstream_error_is_prefixed() {
        let mut form = FormState {
            url_input: "https://tiktok.com/@a/video/1".to_string(),
            ..Default::default()
        };
        form.begin_fetch();
        form.finish_fetch(Err(AppError::Http { status: 429, reason: "Too Many Requests".into() }));
        assert_eq!(
            form.error(),
            Some("Failed to fetch video: API Error: 429 - Too Many Requests")
        );
    }

    #[test]
    fn editing_resets_terminal_states() {
        let mut form = fetched(json!({ "code": 0, "data": { "play": "p" } }));
        assert!(form.video().is_some());
        form.input_edited();
        assert_eq!(form.phase(), &Phase::Idle);

        let mut form = fetched(json!({ "code": 0 }));
        assert!(form.error().is_some());
        form.input_edited();
        assert_eq!(form.phase(), &Phase::Idle);
        assert_eq!(form.error(), None);
    }

    #[test]
    fn editing_during_fetch_keeps_fetching() {
        let mut form = FormState {
            url_input: "https://tiktok.com/@a/video/1".to_string(),
            ..Default::default()
        };
        form.begin_fetch();
        form.input_edited();
        assert!(form.is_loading());
    }

    #[test]
    fn late_result_after_reset_is_dropped() {
        let mut form = FormState::default();
        form.finish_fetch(Err(AppError::NoDownloadUrls));
        assert_eq!(form.phase(), &Phase::Idle);
    }

    #[test]
    fn download_url_notices() {
        let mut form = FormState::default();
        assert_eq!(form.download_url(DownloadKind::NoWatermark), None);
        assert_eq!(form.error(), Some("Please fetch video information first"));

        let mut form = fetched(json!({ "code": 0, "data": { "hdplay": "https://cdn.example/hd.mp4" } }));
        assert_eq!(
            form.download_url(DownloadKind::NoWatermark).as_deref(),
            Some("https://cdn.example/hd.mp4")
        );
        assert_eq!(form.download_url(DownloadKind::WithWatermark), None);
        assert!(form.error().unwrap().starts_with("Download URL not available for with-watermark."));
        assert!(form.video().is_some());
    }

    #[test]
    fn titles_are_previewed() {
        let short = "a".repeat(TITLE_PREVIEW_CHARS);
        assert_eq!(truncate_title(&short, false), short);

        let long = "é".repeat(TITLE_PREVIEW_CHARS + 5);
        let preview = truncate_title(&long, false);
        assert_eq!(preview.chars().count(), TITLE_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
        assert_eq!(truncate_title(&long, true), long);
    }
}
