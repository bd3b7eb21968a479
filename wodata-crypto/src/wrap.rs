//! Wrapping of data keys for a recipient.
//!
//! A data key is sealed to the recipient's X25519 public key with a fresh
//! ephemeral keypair (X25519 + XSalsa20-Poly1305), so wrapping the same key
//! twice gives two unrelated results. Only the recipient secret key opens it.
//!
//! Wire form: `ephemeral_public || nonce || sealed key || tag`.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{DataKey, KEY_SIZE};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use crypto_box::aead::{Aead, OsRng};
use crypto_box::{Nonce, PublicKey, SalsaBox, SecretKey};
use rand::RngCore;
use zeroize::Zeroizing;

/// X25519 public key size.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// XSalsa20 nonce size.
pub const WRAP_NONCE_SIZE: usize = 24;

const WRAP_TAG_SIZE: usize = 16;

/// Exact length of a wrapped 32-byte data key.
pub const WRAPPED_KEY_LEN: usize = PUBLIC_KEY_SIZE + WRAP_NONCE_SIZE + KEY_SIZE + WRAP_TAG_SIZE;

/// Recipient X25519 keypair. The secret half zeroizes on drop.
pub struct RecipientKeyPair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

/// A data key sealed for one recipient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrappedKey {
    pub ephemeral_public: [u8; PUBLIC_KEY_SIZE],
    pub nonce: [u8; WRAP_NONCE_SIZE],
    /// Sealed key bytes with the Poly1305 tag appended.
    pub sealed: Vec<u8>,
}

impl WrappedKey {
    pub fn to_bytes(&self) -> Vec<u8> {
        [&self.ephemeral_public[..], &self.nonce[..], &self.sealed].concat()
    }

    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < PUBLIC_KEY_SIZE + WRAP_NONCE_SIZE + WRAP_TAG_SIZE {
            return Err(CryptoError::Decryption(format!(
                "wrapped key too short: {} bytes",
                bytes.len()
            )));
        }
        let (ephemeral, rest) = bytes.split_at(PUBLIC_KEY_SIZE);
        let (nonce, sealed) = rest.split_at(WRAP_NONCE_SIZE);

        let mut wrapped = Self {
            ephemeral_public: [0u8; PUBLIC_KEY_SIZE],
            nonce: [0u8; WRAP_NONCE_SIZE],
            sealed: sealed.to_vec(),
        };
        wrapped.ephemeral_public.copy_from_slice(ephemeral);
        wrapped.nonce.copy_from_slice(nonce);
        Ok(wrapped)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::Decryption(format!("wrapped key is not base64: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

/// Generates a new recipient keypair.
pub fn generate_recipient_keypair() -> RecipientKeyPair {
    let secret = SecretKey::generate(&mut OsRng);
    RecipientKeyPair {
        public: secret.public_key(),
        secret,
    }
}

/// Seals `key` for `recipient`.
pub fn wrap_data_key(key: &DataKey, recipient: &PublicKey) -> CryptoResult<WrappedKey> {
    let ephemeral = SecretKey::generate(&mut OsRng);
    let mut nonce = [0u8; WRAP_NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce);

    let sealed = SalsaBox::new(recipient, &ephemeral)
        .encrypt(Nonce::from_slice(&nonce), key.as_bytes().as_slice())
        .map_err(|e| CryptoError::Encryption(format!("key wrap failed: {e}")))?;

    Ok(WrappedKey {
        ephemeral_public: *ephemeral.public_key().as_bytes(),
        nonce,
        sealed,
    })
}

/// Opens a wrapped data key with the recipient secret key.
///
/// Fails for a foreign secret key, tampered bytes, or contents that are not
/// a 32-byte key.
pub fn unwrap_data_key(wrapped: &WrappedKey, recipient: &SecretKey) -> CryptoResult<DataKey> {
    let ephemeral = PublicKey::from(wrapped.ephemeral_public);
    let opened = SalsaBox::new(&ephemeral, recipient)
        .decrypt(Nonce::from_slice(&wrapped.nonce), wrapped.sealed.as_slice())
        .map_err(|_| {
            CryptoError::Decryption("key unwrap failed (wrong key or tampered data)".to_string())
        })?;
    DataKey::from_slice(&Zeroizing::new(opened))
}
