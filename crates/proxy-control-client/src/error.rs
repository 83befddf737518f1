//! Local proxy control errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// Transport failure or non-2xx answer from the local controller.
    #[error("Proxy controller unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for ControlError {
    fn from(e: reqwest::Error) -> Self {
        ControlError::Unavailable(e.to_string())
    }
}
