use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No history location available; pass --history or set history.path")]
    NoHistoryPath,

    #[error("Failed to read request {path:?}: {source}")]
    ReadRequest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed request: {0}")]
    ParseRequest(#[source] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Output(#[source] io::Error),

    #[error(transparent)]
    Analytics(#[from] analytics::Error),

    #[error(transparent)]
    Config(#[from] config::Error),
}
