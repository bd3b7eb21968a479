//! Record engine error types.

use std::path::{Path, PathBuf};
use thiserror::Error;
use wodata_crypto::CryptoError;

/// Result type for record operations.
pub type RecordResult<T> = Result<T, RecordError>;

/// Errors that abort processing of the current file.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to access file {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("no symmetric encryption key found for type '{0}'")]
    MissingKey(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RecordError {
    pub(crate) fn file_access(path: &Path, source: std::io::Error) -> Self {
        RecordError::FileAccess {
            path: path.to_path_buf(),
            source,
        }
    }
}
