//! Error types for the cipher suite.

use thiserror::Error;

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by the primitives in this crate.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid encoding: {0}")]
    Encoding(String),

    #[error("invalid key file: {0}")]
    InvalidKeyFile(String),

    #[error("secret key is passphrase protected, but no passphrase was given")]
    PassphraseRequired,
}

impl From<base64::DecodeError> for CryptoError {
    fn from(err: base64::DecodeError) -> Self {
        CryptoError::Encoding(err.to_string())
    }
}
