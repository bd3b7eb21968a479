//! Shared fixtures for record engine integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use wodata_crypto::keyfile::{encode_public_key_file, encode_secret_key_file};
use wodata_crypto::{generate_recipient_keypair, RecipientKeyPair};

/// Keypair plus its key files written under `dir`.
pub struct KeyFiles {
    pub pair: RecipientKeyPair,
    pub public: PathBuf,
    pub secret: PathBuf,
}

pub fn write_key_files(dir: &Path) -> KeyFiles {
    let pair = generate_recipient_keypair();
    let public = dir.join("recipient.pub.json");
    let secret = dir.join("recipient.key.json");
    std::fs::write(&public, encode_public_key_file(&pair.public).unwrap()).unwrap();
    std::fs::write(&secret, encode_secret_key_file(&pair.secret, None).unwrap()).unwrap();
    KeyFiles {
        pair,
        public,
        secret,
    }
}

pub fn request(records: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "WorkOrderSubmit",
        "id": 11,
        "params": { "workOrderId": "0x1234", "Data": records }
    })
}

pub fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}
