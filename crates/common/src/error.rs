use std::path::PathBuf;

use thiserror::Error;

/// Common error types used across the relay.
///
/// `Fetch` and `Delivery` are transient: the poll loop logs them and retries on
/// the next cycle. Everything else is structural and terminates the process.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("State file {} is corrupted: {reason}", path.display())]
    StorageCorruption { path: PathBuf, reason: String },

    #[error("Failed to read state file {}: {source}", path.display())]
    StorageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write state file {}: {source}", path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RelayError {
    /// Whether the poll loop may carry on after this error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RelayError::Fetch(_) | RelayError::Delivery(_) | RelayError::Http(_)
        )
    }
}
