use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A generic JSON object, as stored by the host's record/collection backend.
pub type JsonObject = Map<String, Value>;

/// An arbitrary JSON record: at minimum `id` (string) and `last_modified`
/// (integer), optionally `deleted: true` marking a tombstone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub JsonObject);

impl Record {
    /// Build a record from an id, a `last_modified` timestamp, and extra fields.
    #[must_use]
    pub fn new(id: impl Into<String>, last_modified: i64, mut fields: JsonObject) -> Self {
        fields.insert("id".to_string(), Value::String(id.into()));
        fields.insert(
            "last_modified".to_string(),
            Value::Number(last_modified.into()),
        );
        Self(fields)
    }

    /// Build a tombstone (deleted record) with just id/last_modified/deleted.
    #[must_use]
    pub fn tombstone(id: impl Into<String>, last_modified: i64) -> Self {
        let mut obj = Map::new();
        obj.insert("id".to_string(), Value::String(id.into()));
        obj.insert(
            "last_modified".to_string(),
            Value::Number(last_modified.into()),
        );
        obj.insert("deleted".to_string(), Value::Bool(true));
        Self(obj)
    }

    /// The record's `id` field, as a string slice.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// The record's `last_modified` field, as an integer.
    #[must_use]
    pub fn last_modified(&self) -> Option<i64> {
        self.0.get("last_modified").and_then(Value::as_i64)
    }

    /// Whether this record is a tombstone (`deleted: true`).
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.0
            .get("deleted")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub fn as_object(&self) -> &JsonObject {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_carries_id_and_timestamp() {
        let r = Record::new("abc", 12345, Map::new());
        assert_eq!(r.id(), Some("abc"));
        assert_eq!(r.last_modified(), Some(12345));
        assert!(!r.is_deleted());
    }

    #[test]
    fn tombstone_is_deleted() {
        let r = Record::tombstone("abc", 99);
        assert!(r.is_deleted());
        assert_eq!(r.id(), Some("abc"));
    }

    #[test]
    fn missing_fields_return_none() {
        let r = Record(Map::new());
        assert_eq!(r.id(), None);
        assert_eq!(r.last_modified(), None);
        assert!(!r.is_deleted());
    }

    #[test]
    fn serializes_as_plain_json_object() {
        let r = Record::new("x", 1, Map::new());
        let v = serde_json::to_value(&r).unwrap();
        assert!(v.is_object());
        assert_eq!(v["id"], "x");
    }
}
