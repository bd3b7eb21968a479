//! JSON key file format for recipient keypairs.
//!
//! A public key file carries `public_key`; a secret key file carries either
//! `secret_key` or, when written with a passphrase, `protected_secret_key`.
//! Keys are standard base64. File I/O is left to the caller.

use crate::cipher::{decrypt, encrypt, EncryptedData};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, KdfParams, Salt, SALT_SIZE};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use crypto_box::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// The only algorithm this format carries.
pub const KEY_ALGORITHM: &str = "x25519";

/// Upper bounds on KDF costs read from a key file (2 GiB, 64 passes, 16 lanes).
const MAX_KDF_MEMORY_KIB: u32 = 1 << 21;
const MAX_KDF_ITERATIONS: u32 = 64;
const MAX_KDF_PARALLELISM: u32 = 16;

#[derive(Debug, Serialize, Deserialize)]
struct KeyFileDocument {
    algorithm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    protected_secret_key: Option<ProtectedSecret>,
    #[serde(default)]
    created_at: i64,
}

/// Secret key sealed under a passphrase (Argon2id -> ChaCha20-Poly1305).
///
/// The KDF parameters travel with the file, so the passphrase is the only
/// other input needed to open it.
#[derive(Debug, Serialize, Deserialize)]
struct ProtectedSecret {
    kdf: KdfParams,
    salt: String,
    sealed: String,
}

impl ProtectedSecret {
    fn seal(secret: &SecretKey, passphrase: &str) -> CryptoResult<Self> {
        let salt = Salt::random();
        let kdf = KdfParams::default();
        let kek = derive_key(passphrase, &salt, &kdf)?;
        let secret_bytes = Zeroizing::new(secret.to_bytes());
        let sealed = encrypt(&kek, secret_bytes.as_slice())?;
        Ok(Self {
            kdf,
            salt: STANDARD.encode(salt.as_bytes()),
            sealed: sealed.to_base64(),
        })
    }

    fn check_kdf(&self) -> CryptoResult<()> {
        let KdfParams {
            memory_kib,
            iterations,
            parallelism,
        } = self.kdf;
        if memory_kib > MAX_KDF_MEMORY_KIB
            || iterations == 0
            || iterations > MAX_KDF_ITERATIONS
            || parallelism == 0
            || parallelism > MAX_KDF_PARALLELISM
        {
            return Err(CryptoError::InvalidKeyFile(format!(
                "kdf parameters out of range (memory_kib={memory_kib}, \
                 iterations={iterations}, parallelism={parallelism})"
            )));
        }
        Ok(())
    }

    fn open(&self, passphrase: &str) -> CryptoResult<SecretKey> {
        self.check_kdf()?;
        let salt: [u8; SALT_SIZE] = STANDARD
            .decode(&self.salt)
            .map_err(|e| CryptoError::InvalidKeyFile(format!("salt is not base64: {e}")))?
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyFile(format!("salt must be {SALT_SIZE} bytes")))?;
        let kek = derive_key(passphrase, &Salt::from_bytes(salt), &self.kdf)?;
        let sealed = EncryptedData::from_base64(&self.sealed)?;
        let plaintext = Zeroizing::new(decrypt(&kek, &sealed).map_err(|_| {
            CryptoError::Decryption("wrong passphrase or corrupted key file".to_string())
        })?);

        let mut bytes = Zeroizing::new([0u8; 32]);
        if plaintext.len() != bytes.len() {
            return Err(CryptoError::InvalidKeyLength {
                expected: bytes.len(),
                actual: plaintext.len(),
            });
        }
        bytes.copy_from_slice(&plaintext);
        Ok(SecretKey::from(*bytes))
    }
}

impl KeyFileDocument {
    fn parse(text: &str) -> CryptoResult<Self> {
        let doc: Self = serde_json::from_str(text)
            .map_err(|e| CryptoError::InvalidKeyFile(format!("not a key file: {e}")))?;
        if doc.algorithm != KEY_ALGORITHM {
            return Err(CryptoError::InvalidKeyFile(format!(
                "unsupported algorithm '{}'",
                doc.algorithm
            )));
        }
        Ok(doc)
    }

    fn render(&self) -> CryptoResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CryptoError::InvalidKeyFile(format!("serialization failed: {e}")))
    }

    fn secret(&self, passphrase: Option<&str>) -> CryptoResult<Option<SecretKey>> {
        if let Some(encoded) = &self.secret_key {
            let bytes = decode_key_bytes(encoded, "secret_key")?;
            return Ok(Some(SecretKey::from(*bytes)));
        }
        if let Some(protected) = &self.protected_secret_key {
            let passphrase = passphrase.ok_or(CryptoError::PassphraseRequired)?;
            return protected.open(passphrase).map(Some);
        }
        Ok(None)
    }
}

fn decode_key_bytes(encoded: &str, field: &str) -> CryptoResult<Zeroizing<[u8; 32]>> {
    let decoded = Zeroizing::new(
        STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKeyFile(format!("{field} is not base64: {e}")))?,
    );
    let mut bytes = Zeroizing::new([0u8; 32]);
    if decoded.len() != bytes.len() {
        return Err(CryptoError::InvalidKeyFile(format!(
            "{field} must be 32 bytes, got {}",
            decoded.len()
        )));
    }
    bytes.copy_from_slice(&decoded);
    Ok(bytes)
}

/// Renders a public key file.
pub fn encode_public_key_file(public: &PublicKey) -> CryptoResult<String> {
    KeyFileDocument {
        algorithm: KEY_ALGORITHM.to_string(),
        public_key: Some(STANDARD.encode(public.as_bytes())),
        secret_key: None,
        protected_secret_key: None,
        created_at: chrono::Utc::now().timestamp(),
    }
    .render()
}

/// Renders a secret key file, sealing the key when a passphrase is given.
pub fn encode_secret_key_file(secret: &SecretKey, passphrase: Option<&str>) -> CryptoResult<String> {
    let (secret_key, protected_secret_key) = match passphrase {
        Some(passphrase) => (None, Some(ProtectedSecret::seal(secret, passphrase)?)),
        None => (Some(STANDARD.encode(secret.to_bytes())), None),
    };
    KeyFileDocument {
        algorithm: KEY_ALGORITHM.to_string(),
        public_key: None,
        secret_key,
        protected_secret_key,
        created_at: chrono::Utc::now().timestamp(),
    }
    .render()
}

/// Reads the public key from a key file.
///
/// A secret key file is accepted as well; its public key is derived.
pub fn parse_public_key(text: &str, passphrase: Option<&str>) -> CryptoResult<PublicKey> {
    let doc = KeyFileDocument::parse(text)?;
    if let Some(encoded) = &doc.public_key {
        let bytes = decode_key_bytes(encoded, "public_key")?;
        return Ok(PublicKey::from(*bytes));
    }
    match doc.secret(passphrase)? {
        Some(secret) => Ok(secret.public_key()),
        None => Err(CryptoError::InvalidKeyFile(
            "no public or secret key present".to_string(),
        )),
    }
}

/// Reads the secret key from a secret key file.
pub fn parse_secret_key(text: &str, passphrase: Option<&str>) -> CryptoResult<SecretKey> {
    let doc = KeyFileDocument::parse(text)?;
    doc.secret(passphrase)?.ok_or_else(|| {
        CryptoError::InvalidKeyFile("file holds no secret key (is this a public key file?)".to_string())
    })
}
