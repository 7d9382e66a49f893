use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Config file not found: {0}")]
    ConfigMissing(String),

    #[error("Config file is not valid JSON: {0}")]
    ConfigInvalid(String),

    #[error("Config contains no URLs to crawl")]
    NoUrls,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
