#![forbid(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid request field `{field}`: {reason}")]
    InvalidRequest { field: &'static str, reason: String },

    #[error("invalid path: {0}")]
    InvalidPath(PathBuf),
}
