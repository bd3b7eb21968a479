//! Persisted registry of per-type data encryption keys.
//!
//! The backing file is a flat JSON object mapping each data type name to its
//! base64 encoded key. A key is created once, the first time its type is
//! encrypted, and is never replaced afterwards.

use crate::error::{RecordError, RecordResult};
use crate::files;
use std::collections::btree_map::{BTreeMap, Entry};
use std::path::Path;
use tracing::debug;
use wodata_crypto::{generate_data_key, DataKey};

/// Data type name → data key.
#[derive(Debug, Default)]
pub struct KeyStore {
    keys: BTreeMap<String, DataKey>,
    modified: bool,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a key store file. A missing or blank file gives an empty store.
    pub fn load(path: &Path) -> RecordResult<Self> {
        match files::read_optional_text(path)? {
            Some(text) => Self::parse(&text)
                .map_err(|msg| RecordError::Parse(format!("{}: {msg}", path.display()))),
            None => {
                debug!(path = %path.display(), "key store file not found, starting empty");
                Ok(Self::new())
            }
        }
    }

    /// Parses the flat `{ "type": "base64 key" }` form.
    pub fn from_json(text: &str) -> RecordResult<Self> {
        Self::parse(text).map_err(RecordError::Parse)
    }

    fn parse(text: &str) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        let encoded: BTreeMap<String, String> =
            serde_json::from_str(text).map_err(|e| format!("malformed key store: {e}"))?;

        let mut keys = BTreeMap::new();
        for (data_type, value) in encoded {
            let key = DataKey::from_base64(&value)
                .map_err(|e| format!("bad key for type '{data_type}': {e}"))?;
            keys.insert(data_type, key);
        }
        Ok(Self {
            keys,
            modified: false,
        })
    }

    pub fn to_json(&self) -> RecordResult<String> {
        let encoded: BTreeMap<&str, String> = self
            .keys
            .iter()
            .map(|(data_type, key)| (data_type.as_str(), key.to_base64()))
            .collect();
        files::to_pretty_json(&encoded)
    }

    /// Writes the store and clears the modified flag.
    pub fn save(&mut self, path: &Path) -> RecordResult<()> {
        files::write_secret_text(path, &self.to_json()?)?;
        debug!(path = %path.display(), keys = self.keys.len(), "saved key store");
        self.modified = false;
        Ok(())
    }

    /// Returns the key for `data_type`, or `MissingKey`.
    pub fn get(&self, data_type: &str) -> RecordResult<&DataKey> {
        self.keys
            .get(data_type)
            .ok_or_else(|| RecordError::MissingKey(data_type.to_string()))
    }

    /// Returns the key for `data_type`, generating one when it is absent and
    /// `allow_create` is set.
    pub fn get_or_create(&mut self, data_type: &str, allow_create: bool) -> RecordResult<&DataKey> {
        match self.keys.entry(data_type.to_string()) {
            Entry::Occupied(entry) => {
                let key: &DataKey = entry.into_mut();
                Ok(key)
            }
            Entry::Vacant(_) if !allow_create => {
                Err(RecordError::MissingKey(data_type.to_string()))
            }
            Entry::Vacant(entry) => {
                debug!(data_type, "generated new data key");
                self.modified = true;
                let key: &DataKey = entry.insert(generate_data_key());
                Ok(key)
            }
        }
    }

    pub fn contains(&self, data_type: &str) -> bool {
        self.keys.contains_key(data_type)
    }

    /// Data type names in sorted order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether keys were added since the store was loaded or last saved.
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}
