//! Hybrid encryption of BLOB fields in work-order JSON records.
//!
//! An envelope (`{"params": {"Data": [...]}}` for requests, `result` for
//! responses) carries records of the form
//! `{"Type": ..., "BLOB": ..., "EncryptedDataEncryptionKey": ...}`.
//!
//! - [`keystore`]: one data key per `Type`, persisted as a JSON file
//! - [`hybrid`]: encrypt/decrypt a single record
//! - [`processor`]: walk the `Data` array of an envelope
//! - [`batch`]: drive single files or numbered file sequences
//!
//! # Example
//!
//! ```no_run
//! use wodata_records::{run, Mode, RunConfig};
//!
//! let config = RunConfig::new(Mode::Encrypt, "request.json", "request.enc.json")
//!     .with_key_file("recipient.pub.json")
//!     .with_keystore("keys.json");
//! let summary = run(&config)?;
//! println!("{} records", summary.total_records());
//! # Ok::<(), wodata_records::RecordError>(())
//! ```

pub mod batch;
pub mod config;
mod error;
pub mod files;
pub mod hybrid;
pub mod keystore;
pub mod processor;
pub mod record;

pub use batch::{indexed_path, run, BatchSummary, ProcessedFile, MAX_INDEX};
pub use config::{Mode, RunConfig};
pub use error::{RecordError, RecordResult};
pub use hybrid::{decrypt_item, encrypt_item, KeyUnwrap, KeyWrap};
pub use keystore::KeyStore;
pub use processor::{process, KeyMaterial};
pub use record::DataItem;
