/// Everything that can end a fetch or download attempt.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Please enter a TikTok URL")]
    EmptyUrl,

    #[error("Please enter a valid TikTok URL")]
    InvalidUrl,

    #[error("RapidAPI key is not configured (set api.key in config.toml or RAPIDAPI_KEY)")]
    MissingApiKey,

    #[error("API Error: {status} - {reason}")]
    Http { status: u16, reason: String },

    #[error("{0}")]
    Upstream(String),

    #[error("No download URLs available for this video")]
    NoDownloadUrls,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Response data parsing error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type AppResult<T> = Result<T, AppError>;
