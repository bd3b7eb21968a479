//! Run configuration.

use crate::error::{RecordError, RecordResult};
use std::fmt;
use std::path::{Path, PathBuf};

/// Direction of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Encrypt,
    Decrypt,
}

impl Mode {
    /// Envelope field holding `Data` by default: requests carry `params`,
    /// responses carry `result`.
    pub fn default_object_name(self) -> &'static str {
        match self {
            Mode::Encrypt => "params",
            Mode::Decrypt => "result",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Encrypt => f.write_str("encrypt"),
            Mode::Decrypt => f.write_str("decrypt"),
        }
    }
}

/// Everything one run needs, passed down the call chain.
///
/// `key_file` is the recipient public key for encryption and the optional
/// recipient secret key for decryption. `input`/`output` are file names, or
/// name bases when `indexed` is set.
#[derive(Clone)]
pub struct RunConfig {
    pub mode: Mode,
    pub key_file: Option<PathBuf>,
    pub keystore_file: Option<PathBuf>,
    pub input: PathBuf,
    pub output: PathBuf,
    pub object_name: Option<String>,
    pub indexed: bool,
    /// Unlocks a passphrase-protected secret key file.
    pub passphrase: Option<String>,
}

impl RunConfig {
    pub fn new(mode: Mode, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            key_file: None,
            keystore_file: None,
            input: input.into(),
            output: output.into(),
            object_name: None,
            indexed: false,
            passphrase: None,
        }
    }

    pub fn with_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_file = Some(path.into());
        self
    }

    pub fn with_keystore(mut self, path: impl Into<PathBuf>) -> Self {
        self.keystore_file = Some(path.into());
        self
    }

    pub fn with_object_name(mut self, name: impl Into<String>) -> Self {
        self.object_name = Some(name.into());
        self
    }

    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    pub fn indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    /// Checks that every parameter the mode requires is present.
    pub fn validate(&self) -> RecordResult<()> {
        if self.mode == Mode::Encrypt {
            require_path("public key file", self.key_file.as_deref())?;
            require_path("key store file", self.keystore_file.as_deref())?;
        }
        require_path("input file", Some(&self.input))?;
        require_path("output file", Some(&self.output))?;
        if let Some(name) = &self.object_name {
            if name.is_empty() {
                return Err(RecordError::Config("object name must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

fn require_path(name: &str, path: Option<&Path>) -> RecordResult<()> {
    match path {
        Some(path) if !path.as_os_str().is_empty() => Ok(()),
        _ => Err(RecordError::Config(format!("parameter '{name}' is required"))),
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("mode", &self.mode)
            .field("key_file", &self.key_file)
            .field("keystore_file", &self.keystore_file)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("object_name", &self.object_name)
            .field("indexed", &self.indexed)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
