//! Error types for the receiver core.
//!
//! Library code (everything under `receiver::`) returns [`ReceiverError`] via
//! `thiserror` so callers can match on failure kind; the binary (`main.rs`)
//! wraps those in `anyhow::Result` at the top level, same split the teacher
//! repo uses between its library modules and `main.rs`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("IF source {path}: {source}")]
    Source {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tag file {path} malformed: {reason}")]
    BadTag { path: String, reason: String },

    #[error("unknown signal id {0:?}")]
    UnknownSignal(String),

    #[error("unknown receiver option {0:?}")]
    UnknownOption(String),

    #[error("invalid option value for {key}: {value:?}")]
    BadOptionValue { key: String, value: String },

    #[error("nav database {path}: {reason}")]
    NavDb { path: String, reason: String },

    #[error("channel pool exhausted ({0} channels already allocated)")]
    ChannelPoolExhausted(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReceiverError>;
