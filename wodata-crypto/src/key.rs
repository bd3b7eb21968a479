//! Data encryption keys and passphrase key derivation.

use crate::error::{CryptoError, CryptoResult};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a data encryption key in bytes (ChaCha20-Poly1305 key).
pub const KEY_SIZE: usize = 32;

/// Size of an Argon2id salt in bytes.
pub const SALT_SIZE: usize = 16;

/// A symmetric data encryption key (DEK).
///
/// One key exists per data type. The bytes are wiped when the value drops.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DataKey {
    bytes: [u8; KEY_SIZE],
}

impl DataKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Builds a key from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Standard base64 form used by the key store file.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.bytes)
    }

    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let mut decoded = STANDARD.decode(encoded.trim())?;
        let key = Self::from_slice(&decoded);
        decoded.zeroize();
        key
    }
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DataKey([REDACTED])")
    }
}

impl PartialEq for DataKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for DataKey {}

/// Generates a fresh random data key.
pub fn generate_data_key() -> DataKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::rng().fill_bytes(&mut bytes);
    DataKey { bytes }
}

/// Random salt for passphrase key derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// Argon2id cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Derives a data key from a passphrase with Argon2id.
pub fn derive_key(passphrase: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<DataKey> {
    let argon_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);
    let mut bytes = [0u8; KEY_SIZE];
    argon
        .hash_password_into(passphrase.as_bytes(), salt.as_bytes(), &mut bytes)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(DataKey { bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_differ() {
        let a = generate_data_key();
        let b = generate_data_key();
        assert_ne!(a, b);
    }

    #[test]
    fn base64_round_trip() {
        let key = generate_data_key();
        let encoded = key.to_base64();
        assert_eq!(DataKey::from_base64(&encoded).unwrap(), key);
    }

    #[test]
    fn short_key_rejected() {
        let err = DataKey::from_slice(&[0u8; 16]).unwrap_err();
        assert!(matches!(
            err,
            CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 16
            }
        ));
    }

    #[test]
    fn garbage_base64_rejected() {
        assert!(matches!(
            DataKey::from_base64("not base64!!"),
            Err(CryptoError::Encoding(_))
        ));
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = generate_data_key();
        let rendered = format!("{key:?}");
        assert_eq!(rendered, "DataKey([REDACTED])");
        assert!(!rendered.contains(&key.to_base64()));
    }

    #[test]
    fn derive_key_is_deterministic_per_salt() {
        let salt = Salt::random();
        let params = KdfParams::default();
        let k1 = derive_key("passphrase", &salt, &params).unwrap();
        let k2 = derive_key("passphrase", &salt, &params).unwrap();
        let k3 = derive_key("passphrase", &Salt::random(), &params).unwrap();
        assert_eq!(k1, k2);
        assert_ne!(k1, k3);
    }
}
