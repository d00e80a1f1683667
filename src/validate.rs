use url::Url;

use crate::error::{AppError, AppResult};

const TIKTOK_HOSTS: &[&str] = &["tiktok.com", "vm.tiktok.com", "m.tiktok.com"];

/// Checks raw form input and returns the trimmed URL to send upstream.
pub fn validate_tiktok_url(input: &str) -> AppResult<String> {
    let url = input.trim();
    if url.is_empty() {
        return Err(AppError::EmptyUrl);
    }
    if !is_tiktok_url(url) {
        return Err(AppError::InvalidUrl);
    }
    Ok(url.to_string())
}

// Scheme and host come back lowercased from the parser. Userinfo is refused
// since `https://tiktok.com:x@other.host/` really points at `other.host`.
fn is_tiktok_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") || !url.username().is_empty() || url.password().is_some() {
        return false;
    }
    url.host_str().is_some_and(|host| {
        let host = host.strip_prefix("www.").unwrap_or(host);
        TIKTOK_HOSTS.contains(&host)
    })
}
