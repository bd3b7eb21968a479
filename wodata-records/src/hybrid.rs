//! Per-record hybrid encryption.
//!
//! The BLOB is encrypted with the data key of its type; the data key itself
//! travels in `EncryptedDataEncryptionKey`, wrapped for the recipient.

use crate::error::{RecordError, RecordResult};
use crate::keystore::KeyStore;
use crate::record::{DataItem, WRAPPED_KEY_FIELD};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;
use wodata_crypto::{
    decrypt_string, encrypt_string, unwrap_data_key, wrap_data_key, CryptoError, CryptoResult,
    DataKey, PublicKey, SecretKey, WrappedKey,
};

/// Wraps a data key for transport.
pub trait KeyWrap {
    fn wrap_key(&self, key: &DataKey) -> CryptoResult<Vec<u8>>;
}

/// Recovers a data key wrapped by the matching [`KeyWrap`].
pub trait KeyUnwrap {
    fn unwrap_key(&self, wrapped: &[u8]) -> CryptoResult<DataKey>;
}

impl KeyWrap for PublicKey {
    fn wrap_key(&self, key: &DataKey) -> CryptoResult<Vec<u8>> {
        Ok(wrap_data_key(key, self)?.to_bytes())
    }
}

impl KeyUnwrap for SecretKey {
    fn unwrap_key(&self, wrapped: &[u8]) -> CryptoResult<DataKey> {
        unwrap_data_key(&WrappedKey::from_bytes(wrapped)?, self)
    }
}

/// Encrypts the BLOB of `item` and attaches its wrapped data key.
///
/// The data key for the item's type is created on first use.
pub fn encrypt_item(
    item: &mut DataItem,
    keystore: &mut KeyStore,
    wrapper: &dyn KeyWrap,
) -> RecordResult<()> {
    let key = keystore.get_or_create(&item.data_type, true)?;

    if !item.blob().is_empty() {
        let ciphertext = encrypt_string(key, item.blob())?;
        item.blob = Some(ciphertext);
    }

    let wrapped = wrapper.wrap_key(key)?;
    item.wrapped_key = Some(STANDARD.encode(wrapped));

    debug!(data_type = %item.data_type, "encrypted record");
    Ok(())
}

/// Decrypts the BLOB of `item` in place and clears its wrapped key.
///
/// With an unwrapper the data key comes from the record itself; otherwise it
/// is looked up in `keystore` and must already exist there.
pub fn decrypt_item(
    item: &mut DataItem,
    keystore: &KeyStore,
    unwrapper: Option<&dyn KeyUnwrap>,
) -> RecordResult<()> {
    let unwrapped;
    let key = match unwrapper {
        Some(unwrapper) => {
            let encoded = item
                .wrapped_key
                .as_deref()
                .ok_or_else(|| RecordError::MissingField(WRAPPED_KEY_FIELD.to_string()))?;
            let wrapped = STANDARD.decode(encoded).map_err(|e| {
                CryptoError::Decryption(format!("wrapped key is not base64: {e}"))
            })?;
            unwrapped = unwrapper.unwrap_key(&wrapped)?;
            debug!(data_type = %item.data_type, "unwrapped data key from record");
            &unwrapped
        }
        None => keystore.get(&item.data_type)?,
    };

    if !item.blob().is_empty() {
        let plaintext = decrypt_string(key, item.blob())?;
        item.blob = Some(plaintext);
    }

    item.wrapped_key = Some(String::new());

    debug!(data_type = %item.data_type, "decrypted record");
    Ok(())
}
