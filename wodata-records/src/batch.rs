//! File-level driver: single files and numbered file sequences.
//!
//! In indexed mode the names `<base>001`, `<base>002`, ... are visited in
//! order until the first one that does not exist. A gap ends the batch.

use crate::config::{Mode, RunConfig};
use crate::error::{RecordError, RecordResult};
use crate::files;
use crate::hybrid::{KeyUnwrap, KeyWrap};
use crate::keystore::KeyStore;
use crate::processor::{process, KeyMaterial};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use wodata_crypto::keyfile::{parse_public_key, parse_secret_key};
use wodata_crypto::{PublicKey, SecretKey};

/// Highest index a three-digit suffix can express.
pub const MAX_INDEX: u32 = 999;

/// One input/output pair that was written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedFile {
    pub input: PathBuf,
    pub output: PathBuf,
    pub records: usize,
}

/// Outcome of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: Vec<ProcessedFile>,
}

impl BatchSummary {
    pub fn len(&self) -> usize {
        self.processed.len()
    }

    /// True when an indexed run found no input at index 1.
    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }

    pub fn total_records(&self) -> usize {
        self.processed.iter().map(|file| file.records).sum()
    }
}

/// Key material loaded from the configured key file.
enum LoadedKeys {
    Public(PublicKey),
    Secret(Option<SecretKey>),
}

impl LoadedKeys {
    fn load(config: &RunConfig) -> RecordResult<Self> {
        let passphrase = config.passphrase.as_deref();
        match (config.mode, config.key_file.as_deref()) {
            (Mode::Encrypt, Some(path)) => {
                let text = files::read_text(path)?;
                Ok(LoadedKeys::Public(parse_public_key(&text, passphrase)?))
            }
            (Mode::Decrypt, Some(path)) => {
                let text = files::read_text(path)?;
                Ok(LoadedKeys::Secret(Some(parse_secret_key(&text, passphrase)?)))
            }
            (Mode::Decrypt, None) => Ok(LoadedKeys::Secret(None)),
            // validate() rejects encryption without a key file
            (Mode::Encrypt, None) => Err(RecordError::Config(
                "parameter 'public key file' is required".to_string(),
            )),
        }
    }

    fn material(&self) -> KeyMaterial<'_> {
        match self {
            LoadedKeys::Public(public) => KeyMaterial::Encrypt(public as &dyn KeyWrap),
            LoadedKeys::Secret(secret) => {
                KeyMaterial::Decrypt(secret.as_ref().map(|s| s as &dyn KeyUnwrap))
            }
        }
    }
}

/// Appends the zero-padded index to a file name base.
pub fn indexed_path(base: &Path, index: u32) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!("{index:03}"));
    PathBuf::from(name)
}

/// Runs the configured operation.
///
/// The key store is loaded once and, when encrypting, saved after every
/// file. An error stops the run; outputs already written stay in place.
pub fn run(config: &RunConfig) -> RecordResult<BatchSummary> {
    config.validate()?;

    let keys = LoadedKeys::load(config)?;
    let mut keystore = match &config.keystore_file {
        Some(path) => KeyStore::load(path)?,
        None => KeyStore::new(),
    };
    info!(mode = %config.mode, types = keystore.len(), "key store loaded");

    let mut summary = BatchSummary::default();

    if !config.indexed {
        let file = process_file(&config.input, &config.output, &keys, &mut keystore, config)?;
        summary.processed.push(file);
        return Ok(summary);
    }

    for index in 1..=MAX_INDEX {
        let input = indexed_path(&config.input, index);
        if !input.is_file() {
            break;
        }
        let output = indexed_path(&config.output, index);
        let file = process_file(&input, &output, &keys, &mut keystore, config)?;
        summary.processed.push(file);
    }

    if summary.is_empty() {
        info!(
            input = %indexed_path(&config.input, 1).display(),
            "nothing to process"
        );
    } else if summary.len() == MAX_INDEX as usize {
        warn!("stopped after index {MAX_INDEX}; later files were not processed");
    }

    Ok(summary)
}

fn process_file(
    input: &Path,
    output: &Path,
    keys: &LoadedKeys,
    keystore: &mut KeyStore,
    config: &RunConfig,
) -> RecordResult<ProcessedFile> {
    info!(input = %input.display(), "processing file");

    let mut envelope = files::load_json(input)?;
    let records = process(
        &mut envelope,
        keys.material(),
        keystore,
        config.object_name.as_deref(),
    )?;
    files::save_json(output, &envelope)?;

    if config.mode == Mode::Encrypt {
        if let Some(path) = &config.keystore_file {
            let added = keystore.is_modified();
            keystore.save(path)?;
            info!(path = %path.display(), new_keys = added, "key store saved");
        }
    }

    info!(output = %output.display(), records, "wrote output");
    Ok(ProcessedFile {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        records,
    })
}
