use crate::hex::MalformedHexError;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Every failure a scan can hit. None of them are recovered: the first one ends the scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    MalformedHex(#[from] MalformedHexError),

    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("{method} request failed with HTTP status {status}")]
    Protocol { method: &'static str, status: u16 },

    #[error("failed to decode {method} response: {reason}")]
    Decode { method: &'static str, reason: String },

    #[error("fetch task for block {block} did not complete: {reason}")]
    TaskFailed { block: u64, reason: String },
}

impl ScanError {
    pub fn decode(method: &'static str, reason: impl ToString) -> Self {
        ScanError::Decode {
            method,
            reason: reason.to_string(),
        }
    }

    pub fn transport(err: impl Into<BoxError>) -> Self {
        ScanError::Transport(err.into())
    }
}
