//! Text and JSON file helpers.

use crate::error::{RecordError, RecordResult};
use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::Path;

const JSON_INDENT: &[u8] = b"    ";

pub fn read_text(path: &Path) -> RecordResult<String> {
    std::fs::read_to_string(path).map_err(|e| RecordError::file_access(path, e))
}

/// Like [`read_text`], but a missing file yields `None`.
pub fn read_optional_text(path: &Path) -> RecordResult<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RecordError::file_access(path, e)),
    }
}

pub fn write_text(path: &Path, contents: &str) -> RecordResult<()> {
    std::fs::write(path, contents).map_err(|e| RecordError::file_access(path, e))
}

/// Like [`write_text`], but the file is readable by its owner only (0600 on
/// Unix). An existing file is narrowed to 0600 as well.
pub fn write_secret_text(path: &Path, contents: &str) -> RecordResult<()> {
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| RecordError::file_access(path, e))?;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .map_err(|e| RecordError::file_access(path, e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| RecordError::file_access(path, e))
    }

    #[cfg(not(unix))]
    {
        write_text(path, contents)
    }
}

pub fn load_json(path: &Path) -> RecordResult<Value> {
    let text = read_text(path)?;
    serde_json::from_str(&text)
        .map_err(|e| RecordError::Parse(format!("{}: {e}", path.display())))
}

pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> RecordResult<()> {
    write_text(path, &to_pretty_json(value)?)
}

/// Serializes with four-space indentation.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> RecordResult<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| RecordError::Parse(format!("serialization failed: {e}")))?;
    String::from_utf8(buf).map_err(|e| RecordError::Parse(e.to_string()))
}
