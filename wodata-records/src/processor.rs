//! Applies the hybrid cipher to every record of an envelope.

use crate::config::Mode;
use crate::error::{RecordError, RecordResult};
use crate::hybrid::{decrypt_item, encrypt_item, KeyUnwrap, KeyWrap};
use crate::keystore::KeyStore;
use crate::record::{resolve_container, DataItem, DATA_FIELD};
use serde_json::Value;
use tracing::debug;

/// Asymmetric key material for one direction.
#[derive(Clone, Copy)]
pub enum KeyMaterial<'a> {
    /// Wrap data keys for the recipient.
    Encrypt(&'a dyn KeyWrap),
    /// Unwrap data keys from the records, or fall back to the key store.
    Decrypt(Option<&'a dyn KeyUnwrap>),
}

impl KeyMaterial<'_> {
    pub fn mode(&self) -> Mode {
        match self {
            KeyMaterial::Encrypt(_) => Mode::Encrypt,
            KeyMaterial::Decrypt(_) => Mode::Decrypt,
        }
    }
}

/// Encrypts or decrypts every record in the envelope's `Data` array.
///
/// Records are handled in order. The array is replaced only once every
/// record has succeeded, so an error leaves the envelope untouched (new keys
/// may still have been added to `keystore`). Returns the number of records.
pub fn process(
    envelope: &mut Value,
    material: KeyMaterial<'_>,
    keystore: &mut KeyStore,
    object_name: Option<&str>,
) -> RecordResult<usize> {
    let root = envelope
        .as_object_mut()
        .ok_or_else(|| RecordError::Parse("envelope is not a JSON object".to_string()))?;
    let container = resolve_container(root, object_name)?;
    let records = container
        .get_mut(DATA_FIELD)
        .ok_or_else(|| RecordError::MissingField(DATA_FIELD.to_string()))?
        .as_array_mut()
        .ok_or_else(|| RecordError::Parse(format!("'{DATA_FIELD}' is not an array")))?;

    let mut transformed = Vec::with_capacity(records.len());
    for (index, value) in records.iter().enumerate() {
        let original = value
            .as_object()
            .ok_or_else(|| RecordError::Parse("record is not a JSON object".to_string()))?;
        let mut item = DataItem::from_value(value)?;
        match material {
            KeyMaterial::Encrypt(wrapper) => encrypt_item(&mut item, keystore, wrapper)?,
            KeyMaterial::Decrypt(unwrapper) => decrypt_item(&mut item, keystore, unwrapper)?,
        }
        debug!(index, data_type = %item.data_type, mode = %material.mode(), "processed record");
        transformed.push(item.to_value_ordered_like(original)?);
    }

    let count = transformed.len();
    *records = transformed;
    Ok(count)
}
