use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rust_embed::RustEmbed;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

/// Environment variable that overrides `api.key`.
pub const API_KEY_ENV: &str = "RAPIDAPI_KEY";

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub host: String,
    /// Never logged.
    pub key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://tiktok-video-no-watermark2.p.rapidapi.com/".to_string(),
            host: "tiktok-video-no-watermark2.p.rapidapi.com".to_string(),
            key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadConfig {
    pub folder: String,
    pub filename_prefix: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            folder: "./downloads".to_string(),
            filename_prefix: "tsun".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

impl Config {
    /// Loads `config.toml` from the platform config dir, writing the default
    /// template there first if it does not exist. Any failure falls back to
    /// defaults so the window still opens.
    pub fn new() -> Self {
        let mut config = match config_path() {
            Some(path) => {
                if let Err(e) = write_template_if_missing(&path) {
                    warn!(path = %path.display(), error = %e, "could not write default config");
                }
                Self::load_from(&path).unwrap_or_else(|e| {
                    warn!(path = %path.display(), error = %e, "using default config");
                    Self::default()
                })
            }
            None => {
                warn!("no config directory on this platform, using default config");
                Self::default()
            }
        };
        config.override_api_key(std::env::var(API_KEY_ENV).ok());
        info!(
            endpoint = %config.api.endpoint,
            download_folder = %config.download.folder,
            api_key_set = !config.api.key.is_empty(),
            "config loaded"
        );
        config
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "read config");
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> AppResult<Self> {
        toml::from_str(text).map_err(|e| AppError::Config(e.to_string()))
    }

    /// A non-blank override replaces whatever the file said.
    pub fn override_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
            self.api.key = key;
        }
    }
}

fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "tsun", "tiktok-downloader")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn write_template_if_missing(path: &Path) -> AppResult<()> {
    if path.exists() {
        return Ok(());
    }
    let template = Asset::get("config.toml")
        .ok_or_else(|| AppError::Config("missing embedded config template".to_string()))?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, &template.data)?;
    info!(path = %path.display(), "wrote default config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_template_matches_defaults() {
        let template = Asset::get("config.toml").unwrap();
        let text = std::str::from_utf8(&template.data).unwrap();
        assert_eq!(Config::from_toml(text).unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml("[download]\nfolder = \"/tmp/videos\"\n").unwrap();
        assert_eq!(config.download.folder, "/tmp/videos");
        assert_eq!(config.download.filename_prefix, "tsun");
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        assert!(matches!(
            Config::from_toml("[api\nkey = 1"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn env_key_overrides_file_key() {
        let mut config = Config::from_toml("[api]\nkey = \"from-file\"\n").unwrap();
        config.override_api_key(Some("  ".to_string()));
        assert_eq!(config.api.key, "from-file");
        config.override_api_key(None);
        assert_eq!(config.api.key, "from-file");
        config.override_api_key(Some("from-env".to_string()));
        assert_eq!(config.api.key, "from-env");
    }

    #[test]
    fn template_is_written_once() {
        let dir = std::env::temp_dir().join(format!("tiktok-dl-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");
        write_template_if_missing(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        std::fs::write(&path, "[download]\nfilename_prefix = \"mine\"\n").unwrap();
        write_template_if_missing(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().download.filename_prefix, "mine");
        let _ = std::fs::remove_dir_all(dir);
    }
}
