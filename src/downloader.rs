use std::path::{Path, PathBuf};

use reqwest::Client;
use tokio::{fs, io::AsyncWriteExt, sync::mpsc::UnboundedSender};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::progress::progress_fraction;

pub const BROWSER_FALLBACK_MSG: &str = "Failed to download. Opening URL in new tab...";

/// Updates sent from a running download back to the UI
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    Progress(f32),
    Done(PathBuf),
    Failed(String),
}

/// Downloads `url` into `folder/file_name`; if that fails for any reason
/// the URL is handed to `open_fallback` (normally [`open_external`]).
pub async fn spawn_download(
    client: Client,
    url: String,
    folder: String,
    file_name: String,
    events: UnboundedSender<DownloadEvent>,
    open_fallback: fn(&str),
) {
    let dest = Path::new(&folder).join(&file_name);
    let event = match download_to_file(&client, &url, &dest, &events).await {
        Ok(()) => {
            info!(path = %dest.display(), "download finished");
            DownloadEvent::Done(dest)
        }
        Err(e) => {
            warn!(%file_name, error = %e, "download failed, opening in browser");
            open_fallback(&url);
            DownloadEvent::Failed(BROWSER_FALLBACK_MSG.to_string())
        }
    };
    // The window may already be gone.
    let _ = events.send(event);
}

/// Streams the body to a `.part` file and renames it into place when complete.
pub async fn download_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
    events: &UnboundedSender<DownloadEvent>,
) -> AppResult<()> {
    if let Some(dir) = dest.parent() {
        fs::create_dir_all(dir).await?;
    }

    let mut response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        });
    }
    let total = response.content_length();
    debug!(path = %dest.display(), ?total, "download started");

    let partial = dest.with_extension("part");
    let result = async {
        let mut file = fs::File::create(&partial).await?;
        let mut downloaded = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            if let Some(pct) = progress_fraction(downloaded, total) {
                let _ = events.send(DownloadEvent::Progress(pct));
            }
        }
        file.flush().await?;
        Ok::<_, AppError>(())
    }
    .await;

    match result {
        Ok(()) => {
            fs::rename(&partial, dest).await?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&partial).await;
            Err(e)
        }
    }
}

/// Opens a URL or folder with whatever the desktop has registered for it.
pub fn open_external(target: &str) {
    let target = target.to_string();
    std::thread::spawn(move || {
        #[cfg(target_os = "windows")]
        let result = std::process::Command::new("explorer").arg(&target).spawn();
        #[cfg(target_os = "macos")]
        let result = std::process::Command::new("open").arg(&target).spawn();
        #[cfg(all(unix, not(target_os = "macos")))]
        let result = std::process::Command::new("xdg-open").arg(&target).spawn();
        if let Err(e) = result {
            warn!(%target, error = %e, "could not open externally");
        }
    });
}
