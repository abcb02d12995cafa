//! Store error types.

use std::path::PathBuf;

/// Errors from the network store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing a snapshot file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot contents could not be encoded or decoded
    #[error("snapshot error in {path}: {message}")]
    Snapshot { path: PathBuf, message: String },
}
