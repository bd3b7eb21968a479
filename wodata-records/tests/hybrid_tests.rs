//! Record-level hybrid encryption.
//!
//! Covers the round trip, key reuse across records of one type, and the
//! failure modes of decrypting twice or without a known key.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use wodata_crypto::{
    generate_recipient_keypair, unwrap_data_key, CryptoResult, DataKey, WrappedKey,
    WRAPPED_KEY_LEN,
};
use wodata_records::{
    decrypt_item, encrypt_item, DataItem, KeyStore, KeyUnwrap, KeyWrap, RecordError,
};

#[test]
fn round_trip_with_secret_key() {
    let kp = generate_recipient_keypair();
    let mut store = KeyStore::new();
    let mut item = DataItem::new("t1", "hello");

    encrypt_item(&mut item, &mut store, &kp.public).unwrap();
    assert_ne!(item.blob(), "hello");
    assert!(!item.wrapped_key().is_empty());

    decrypt_item(&mut item, &KeyStore::new(), Some(&kp.secret)).unwrap();
    assert_eq!(item.blob(), "hello");
    assert_eq!(item.wrapped_key.as_deref(), Some(""));
}

#[test]
fn round_trip_with_keystore_only() {
    let kp = generate_recipient_keypair();
    let mut store = KeyStore::new();
    let mut item = DataItem::new("t1", "hello");

    encrypt_item(&mut item, &mut store, &kp.public).unwrap();
    decrypt_item(&mut item, &store, None).unwrap();

    assert_eq!(item.blob(), "hello");
    assert_eq!(item.wrapped_key(), "");
}

#[test]
fn ciphertext_is_not_deterministic() {
    let kp = generate_recipient_keypair();
    let mut store = KeyStore::new();
    let mut a = DataItem::new("t1", "hello");
    let mut b = DataItem::new("t1", "hello");

    encrypt_item(&mut a, &mut store, &kp.public).unwrap();
    encrypt_item(&mut b, &mut store, &kp.public).unwrap();

    assert_ne!(a.blob(), b.blob());
}

#[test]
fn same_type_reuses_key_under_different_wrappings() {
    let kp = generate_recipient_keypair();
    let mut store = KeyStore::new();
    let mut a = DataItem::new("t1", "first");
    let mut b = DataItem::new("t1", "second");

    encrypt_item(&mut a, &mut store, &kp.public).unwrap();
    encrypt_item(&mut b, &mut store, &kp.public).unwrap();

    assert_eq!(store.len(), 1);
    assert_ne!(a.wrapped_key(), b.wrapped_key());

    let unwrap = |item: &DataItem| {
        let bytes = STANDARD.decode(item.wrapped_key()).unwrap();
        kp.secret.unwrap_key(&bytes).unwrap()
    };
    let key_a = unwrap(&a);
    let key_b = unwrap(&b);
    assert_eq!(key_a, key_b);
    assert_eq!(&key_a, store.get("t1").unwrap());
}

#[test]
fn decrypting_twice_with_secret_key_fails() {
    let kp = generate_recipient_keypair();
    let mut store = KeyStore::new();
    let mut item = DataItem::new("t1", "hello");

    encrypt_item(&mut item, &mut store, &kp.public).unwrap();
    decrypt_item(&mut item, &store, Some(&kp.secret)).unwrap();

    let err = decrypt_item(&mut item, &store, Some(&kp.secret)).unwrap_err();
    assert!(matches!(err, RecordError::Crypto(_) | RecordError::MissingField(_)));
    assert_eq!(item.blob(), "hello");
}

#[test]
fn decrypting_twice_with_keystore_fails() {
    let kp = generate_recipient_keypair();
    let mut store = KeyStore::new();
    let mut item = DataItem::new("t1", "hello");

    encrypt_item(&mut item, &mut store, &kp.public).unwrap();
    decrypt_item(&mut item, &store, None).unwrap();

    let err = decrypt_item(&mut item, &store, None).unwrap_err();
    assert!(matches!(err, RecordError::Crypto(_)));
    assert_eq!(item.blob(), "hello");
}

#[test]
fn unknown_type_without_secret_key_is_missing_key() {
    let store = KeyStore::new();
    let mut item = DataItem::new("unknown", "aGVsbG8=");
    item.wrapped_key = Some("irrelevant".to_string());

    let err = decrypt_item(&mut item, &store, None).unwrap_err();
    assert!(matches!(err, RecordError::MissingKey(ref t) if t == "unknown"));
}

#[test]
fn missing_wrapped_key_with_secret_key_is_missing_field() {
    let kp = generate_recipient_keypair();
    let store = KeyStore::new();
    let mut item = DataItem::new("t1", "aGVsbG8=");

    let err = decrypt_item(&mut item, &store, Some(&kp.secret)).unwrap_err();
    assert!(matches!(
        err,
        RecordError::MissingField(ref f) if f == "EncryptedDataEncryptionKey"
    ));
}

#[test]
fn wrong_secret_key_is_crypto_error() {
    let intended = generate_recipient_keypair();
    let other = generate_recipient_keypair();
    let mut store = KeyStore::new();
    let mut item = DataItem::new("t1", "hello");

    encrypt_item(&mut item, &mut store, &intended.public).unwrap();
    let err = decrypt_item(&mut item, &store, Some(&other.secret)).unwrap_err();
    assert!(matches!(err, RecordError::Crypto(_)));
}

#[test]
fn tampered_blob_is_crypto_error() {
    let kp = generate_recipient_keypair();
    let mut store = KeyStore::new();
    let mut item = DataItem::new("t1", "hello");
    encrypt_item(&mut item, &mut store, &kp.public).unwrap();

    let mut raw = STANDARD.decode(item.blob()).unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0x01;
    item.blob = Some(STANDARD.encode(raw));

    let err = decrypt_item(&mut item, &store, Some(&kp.secret)).unwrap_err();
    assert!(matches!(err, RecordError::Crypto(_)));
}

#[test]
fn encryption_of_new_type_marks_store_modified() {
    let kp = generate_recipient_keypair();
    let mut store = KeyStore::new();
    encrypt_item(&mut DataItem::new("t1", "x"), &mut store, &kp.public).unwrap();
    assert!(store.is_modified());
    assert!(store.contains("t1"));
}

/// Wrapper that leaves the key readable, to check the seam is honoured.
struct PlainWrap;

impl KeyWrap for PlainWrap {
    fn wrap_key(&self, key: &DataKey) -> CryptoResult<Vec<u8>> {
        Ok(key.as_bytes().to_vec())
    }
}

impl KeyUnwrap for PlainWrap {
    fn unwrap_key(&self, wrapped: &[u8]) -> CryptoResult<DataKey> {
        DataKey::from_slice(wrapped)
    }
}

#[test]
fn custom_wrapper_is_used() {
    let mut store = KeyStore::new();
    let mut item = DataItem::new("t1", "hello");

    encrypt_item(&mut item, &mut store, &PlainWrap).unwrap();
    assert_eq!(item.wrapped_key(), store.get("t1").unwrap().to_base64());

    decrypt_item(&mut item, &KeyStore::new(), Some(&PlainWrap)).unwrap();
    assert_eq!(item.blob(), "hello");
}

#[test]
fn wrapped_key_field_holds_a_wrapped_key() {
    let kp = generate_recipient_keypair();
    let mut store = KeyStore::new();
    let mut item = DataItem::new("t1", "");
    encrypt_item(&mut item, &mut store, &kp.public).unwrap();

    let wrapped = WrappedKey::from_base64(item.wrapped_key()).unwrap();
    assert_eq!(wrapped.to_bytes().len(), WRAPPED_KEY_LEN);
    assert_eq!(&unwrap_data_key(&wrapped, &kp.secret).unwrap(), store.get("t1").unwrap());
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn any_non_empty_blob_round_trips(blob in "\\PC{1,200}", data_type in "[a-z]{1,8}") {
            let kp = generate_recipient_keypair();
            let mut store = KeyStore::new();
            let mut item = DataItem::new(data_type, blob.clone());

            encrypt_item(&mut item, &mut store, &kp.public).unwrap();
            decrypt_item(&mut item, &store, Some(&kp.secret)).unwrap();

            prop_assert_eq!(item.blob(), blob.as_str());
            prop_assert_eq!(item.wrapped_key(), "");
        }
    }
}
