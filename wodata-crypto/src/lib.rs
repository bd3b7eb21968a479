//! Cipher suite for work-order data encryption.
//!
//! Provides the fixed set of primitives the record engine is built on:
//! - ChaCha20-Poly1305 for authenticated encryption of payloads
//! - X25519 + XSalsa20-Poly1305 for wrapping data keys to a recipient
//! - Argon2id for protecting secret key files with a passphrase
//!
//! # Architecture
//!
//! Payloads are encrypted with a **data key** (DEK), one per data type. The
//! data key travels next to the payload, sealed for the recipient's X25519
//! public key, so only the holder of the matching secret key can recover it.

mod cipher;
mod error;
mod key;
pub mod keyfile;
pub mod wrap;

pub use cipher::{
    decrypt, decrypt_string, encrypt, encrypt_string, EncryptedData, NONCE_SIZE, TAG_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_key, generate_data_key, DataKey, KdfParams, Salt, KEY_SIZE, SALT_SIZE};
pub use wrap::{
    generate_recipient_keypair, unwrap_data_key, wrap_data_key, RecipientKeyPair, WrappedKey,
    WRAPPED_KEY_LEN,
};

pub use crypto_box::{PublicKey, SecretKey};
