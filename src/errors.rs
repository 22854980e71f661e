// src/errors.rs

use thiserror::Error;

/// Every failure the client can run into.
///
/// The controller never shows these to the user directly: any of them ends a
/// submission with the same apology message, and the detail goes to the log.
#[derive(Debug, Error)]
pub enum AskchatError {
    /// Network failure, or the request could not be sent or read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The answer service responded, but not with a success status.
    #[error("answer service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response stream failed after it was opened.
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type AskchatResult<T> = Result<T, AskchatError>;

impl AskchatError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn transport_error(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn stream_error(msg: impl Into<String>) -> Self {
        Self::StreamInterrupted(msg.into())
    }

    /// True when the failure means the service could not be reached at all,
    /// as opposed to a service that answered badly.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::StreamInterrupted(_))
    }
}
