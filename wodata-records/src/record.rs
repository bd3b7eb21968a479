//! Work-order data records and the envelope that carries them.

use crate::error::{RecordError, RecordResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TYPE_FIELD: &str = "Type";
pub const BLOB_FIELD: &str = "BLOB";
pub const WRAPPED_KEY_FIELD: &str = "EncryptedDataEncryptionKey";
pub const DATA_FIELD: &str = "Data";

/// Containers searched, in order, when no object name is given.
pub const DEFAULT_CONTAINERS: [&str; 2] = ["params", "result"];

/// One entry of a `Data` array.
///
/// Fields other than the three this crate manages (e.g. `OutputLink`,
/// `Sha256Hash`) are kept in `extra` and written back unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    #[serde(rename = "Type")]
    pub data_type: String,

    #[serde(rename = "BLOB", default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,

    #[serde(
        rename = "EncryptedDataEncryptionKey",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub wrapped_key: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataItem {
    pub fn new(data_type: impl Into<String>, blob: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
            blob: Some(blob.into()),
            wrapped_key: None,
            extra: Map::new(),
        }
    }

    /// BLOB text, empty when absent.
    pub fn blob(&self) -> &str {
        self.blob.as_deref().unwrap_or("")
    }

    /// Wrapped key text, empty when absent.
    pub fn wrapped_key(&self) -> &str {
        self.wrapped_key.as_deref().unwrap_or("")
    }

    pub fn from_value(value: &Value) -> RecordResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| RecordError::Parse("record is not a JSON object".to_string()))?;
        if !object.contains_key(TYPE_FIELD) {
            return Err(RecordError::MissingField(TYPE_FIELD.to_string()));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| RecordError::Parse(format!("malformed record: {e}")))
    }

    pub fn to_value(&self) -> RecordResult<Value> {
        serde_json::to_value(self)
            .map_err(|e| RecordError::Parse(format!("record serialization failed: {e}")))
    }

    /// Serializes with the fields in the key order of `original`; fields it
    /// did not have are appended.
    pub fn to_value_ordered_like(&self, original: &Map<String, Value>) -> RecordResult<Value> {
        let mut fields = match self.to_value()? {
            Value::Object(fields) => fields,
            other => return Ok(other),
        };
        let mut ordered = Map::with_capacity(fields.len());
        for key in original.keys() {
            if let Some(value) = fields.shift_remove(key) {
                ordered.insert(key.clone(), value);
            }
        }
        ordered.extend(fields);
        Ok(Value::Object(ordered))
    }
}

/// Finds the object holding `Data`.
///
/// With an explicit name only that field is considered. Otherwise the
/// [`DEFAULT_CONTAINERS`] are tried in order and the first non-empty object
/// wins.
pub fn resolve_container<'a>(
    envelope: &'a mut Map<String, Value>,
    object_name: Option<&str>,
) -> RecordResult<&'a mut Map<String, Value>> {
    let name = match object_name {
        Some(name) => name,
        None => default_container(envelope).ok_or_else(|| {
            RecordError::MissingField(DEFAULT_CONTAINERS.join("' or '"))
        })?,
    };

    envelope
        .get_mut(name)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| RecordError::MissingField(name.to_string()))
}

fn default_container(envelope: &Map<String, Value>) -> Option<&'static str> {
    DEFAULT_CONTAINERS.into_iter().find(|name| {
        envelope
            .get(*name)
            .and_then(Value::as_object)
            .is_some_and(|object| !object.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_minimal_record() {
        let item = DataItem::from_value(&json!({"Type": "t1"})).unwrap();
        assert_eq!(item.data_type, "t1");
        assert_eq!(item.blob(), "");
        assert!(item.wrapped_key.is_none());
    }

    #[test]
    fn missing_type_is_missing_field() {
        let err = DataItem::from_value(&json!({"BLOB": "x"})).unwrap_err();
        assert!(matches!(err, RecordError::MissingField(ref f) if f == "Type"));
    }

    #[test]
    fn non_string_type_is_parse_error() {
        assert!(matches!(
            DataItem::from_value(&json!({"Type": 7})),
            Err(RecordError::Parse(_))
        ));
    }

    #[test]
    fn non_object_record_is_parse_error() {
        assert!(matches!(
            DataItem::from_value(&json!("t1")),
            Err(RecordError::Parse(_))
        ));
    }

    #[test]
    fn extra_fields_survive() {
        let value = json!({"Type": "t1", "OutputLink": "file://out", "Sha256Hash": "d111"});
        let item = DataItem::from_value(&value).unwrap();
        assert_eq!(item.extra["OutputLink"], "file://out");
        assert_eq!(item.to_value().unwrap(), value);
    }

    #[test]
    fn ordered_serialization_follows_original_keys() {
        let value = json!({"OutputLink": "x", "Type": "t1", "Sha256Hash": "h", "BLOB": "b"});
        let original = value.as_object().unwrap();
        let mut item = DataItem::from_value(&value).unwrap();
        item.wrapped_key = Some("k".to_string());

        let out = item.to_value_ordered_like(original).unwrap();
        let keys: Vec<&str> = out.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["OutputLink", "Type", "Sha256Hash", "BLOB", "EncryptedDataEncryptionKey"]
        );
    }

    #[test]
    fn params_takes_precedence_over_result() {
        let mut env = json!({"params": {"Data": [1]}, "result": {"Data": [2]}});
        let container = resolve_container(env.as_object_mut().unwrap(), None).unwrap();
        assert_eq!(container["Data"], json!([1]));
    }

    #[test]
    fn falls_back_to_result() {
        let mut env = json!({"result": {"Data": [2]}});
        let container = resolve_container(env.as_object_mut().unwrap(), None).unwrap();
        assert_eq!(container["Data"], json!([2]));
    }

    #[test]
    fn empty_params_falls_back_to_result() {
        let mut env = json!({"params": {}, "result": {"Data": [2]}});
        let container = resolve_container(env.as_object_mut().unwrap(), None).unwrap();
        assert_eq!(container["Data"], json!([2]));
    }

    #[test]
    fn neither_container_is_missing_field() {
        let mut env = json!({"id": 1});
        let err = resolve_container(env.as_object_mut().unwrap(), None).unwrap_err();
        assert!(matches!(err, RecordError::MissingField(ref f) if f.contains("params")));
    }

    #[test]
    fn explicit_name_is_used_exclusively() {
        let mut env = json!({"params": {"Data": []}, "custom": {"Data": [3]}});
        let container = resolve_container(env.as_object_mut().unwrap(), Some("custom")).unwrap();
        assert_eq!(container["Data"], json!([3]));

        let err = resolve_container(env.as_object_mut().unwrap(), Some("other")).unwrap_err();
        assert!(matches!(err, RecordError::MissingField(ref f) if f == "other"));
    }
}
