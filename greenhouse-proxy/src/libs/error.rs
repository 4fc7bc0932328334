//! Error kinds reported by the relay components.

use std::io::Error as IoError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No candidate serial device could be opened.
    #[error("no serial device found after trying {tried} path(s)")]
    DeviceNotFound { tried: usize },
    #[error("read serial line error: {0}")]
    ReadFailure(#[from] IoError),
    #[error("empty line")]
    EmptyRecord,
    #[error("decode JSON '{raw}' error: {source}")]
    MalformedRecord {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("send request error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("expected success status code, got {0}")]
    HttpStatus(u16),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
