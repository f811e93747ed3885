//! Push error types / 推送错误类型

use thiserror::Error;

use crate::stream::StreamError;

/// Error raised by agents, drivers and item loading / 推送相关错误
#[derive(Debug, Error)]
pub enum PushError {
    #[error("invalid service: {0}")]
    InvalidService(String),

    /// Item source could not be resolved / 无法解析文件来源
    #[error("missing item content: {0}")]
    MissingContent(String),

    /// Remote API rejected the request / 远端API返回错误
    #[error("remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T, E = PushError> = std::result::Result<T, E>;
