use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T, E = PlayerErr> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PlayerErr {
    #[error("network error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("failed to decode model response: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("game process exited (code {exit_code:?})")]
    GameExited { exit_code: Option<i32> },

    #[error("pty error: {0}")]
    Pty(#[from] anyhow::Error),

    #[error("{0}")]
    Config(String),
}
