//! ChaCha20-Poly1305 authenticated encryption of payloads.
//!
//! Every call draws a fresh 12-byte nonce, so encrypting the same plaintext
//! twice never yields the same ciphertext. The compact wire form is
//! `nonce || ciphertext || tag`, base64 encoded when carried as text.

use crate::error::{CryptoError, CryptoResult};
use crate::key::DataKey;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;

/// Nonce size for ChaCha20-Poly1305.
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size.
pub const TAG_SIZE: usize = 16;

/// Ciphertext together with the nonce it was produced under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedData {
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext with the Poly1305 tag appended.
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Concatenates nonce and ciphertext.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Splits a `nonce || ciphertext || tag` buffer.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::Decryption(format!(
                "ciphertext too short: {} bytes (minimum {})",
                bytes.len(),
                NONCE_SIZE + TAG_SIZE
            )));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_SIZE);
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        nonce_bytes.copy_from_slice(nonce);
        Ok(Self {
            nonce: nonce_bytes,
            ciphertext: ciphertext.to_vec(),
        })
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::Decryption(format!("ciphertext is not base64: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

/// Encrypts `plaintext` under `key` with a random nonce.
pub fn encrypt(key: &DataKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    let mut nonce = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(EncryptedData { nonce, ciphertext })
}

/// Decrypts and authenticates `data` under `key`.
pub fn decrypt(key: &DataKey, data: &EncryptedData) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    cipher
        .decrypt(Nonce::from_slice(&data.nonce), data.ciphertext.as_ref())
        .map_err(|_| {
            CryptoError::Decryption("authentication failed (wrong key or tampered data)".to_string())
        })
}

/// Encrypts a UTF-8 payload into its base64 wire form.
pub fn encrypt_string(key: &DataKey, plaintext: &str) -> CryptoResult<String> {
    Ok(encrypt(key, plaintext.as_bytes())?.to_base64())
}

/// Reverses [`encrypt_string`]. Fails if the text is not base64, fails
/// authentication, or does not decrypt to UTF-8.
pub fn decrypt_string(key: &DataKey, encoded: &str) -> CryptoResult<String> {
    let data = EncryptedData::from_base64(encoded)?;
    let plaintext = decrypt(key, &data)?;
    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::Decryption("plaintext is not valid UTF-8".to_string()))
}
