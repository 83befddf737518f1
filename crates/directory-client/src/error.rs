//! Directory client errors.

use thiserror::Error;

/// Directory failures.
///
/// Transport errors, non-2xx responses and undecodable bodies all land in
/// `Unavailable`; callers cannot act on the difference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for DirectoryError {
    fn from(e: reqwest::Error) -> Self {
        DirectoryError::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for DirectoryError {
    fn from(e: serde_json::Error) -> Self {
        DirectoryError::Unavailable(format!("Invalid directory response: {}", e))
    }
}
