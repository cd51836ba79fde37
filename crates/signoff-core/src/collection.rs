use crate::status::{Status, UnknownStatus};
use crate::tracking::TrackingFields;
use crate::signature_bundle::SignatureBundle;
use serde_json::{Map, Value};

/// A typed view over a source collection's metadata object.
///
/// `status` is parsed into a closed [`Status`] at the edge rather than
/// carried as a free string. `extra` preserves every field this view
/// doesn't know about (id, last_modified, arbitrary UI config) so that
/// round-tripping through [`Self::to_object`] never drops caller data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMetadata {
    /// `None` means "absent" (the collection has never entered the workflow).
    pub status: Option<Status>,
    /// Tracking fields (author/review/signature identity and time).
    pub tracking: TrackingFields,
    /// `sort` UI hint, copied verbatim to the destination on signing.
    pub sort: Option<Value>,
    /// `displayFields` UI hint, copied verbatim to the destination.
    pub display_fields: Option<Value>,
    /// `attachment` UI hint, copied verbatim to the destination.
    pub attachment: Option<Value>,
    /// Every other field on the collection object (id, last_modified, ...).
    pub extra: Map<String, Value>,
}

const KNOWN_KEYS: &[&str] = &["sort", "displayFields", "attachment", "status"];

impl SourceMetadata {
    /// Parse a collection object into a typed view.
    ///
    /// # Errors
    /// Returns [`UnknownStatus`] if `status` is present but not one of the
    /// recognized strings.
    pub fn from_object(obj: &Map<String, Value>) -> Result<Self, UnknownStatus> {
        let status = match obj.get("status").and_then(Value::as_str) {
            Some(s) => Some(Status::parse(s)?),
            None => None,
        };
        let tracking = TrackingFields {
            last_edit_by: str_field(obj, "last_edit_by"),
            last_edit_date: str_field(obj, "last_edit_date"),
            last_review_request_by: str_field(obj, "last_review_request_by"),
            last_review_request_date: str_field(obj, "last_review_request_date"),
            last_review_by: str_field(obj, "last_review_by"),
            last_review_date: str_field(obj, "last_review_date"),
            last_signature_by: str_field(obj, "last_signature_by"),
            last_signature_date: str_field(obj, "last_signature_date"),
        };
        let mut extra = obj.clone();
        for key in KNOWN_KEYS {
            extra.remove(*key);
        }
        for key in TrackingFields::FIELD_NAMES {
            extra.remove(*key);
        }
        Ok(Self {
            status,
            tracking,
            sort: obj.get("sort").cloned(),
            display_fields: obj.get("displayFields").cloned(),
            attachment: obj.get("attachment").cloned(),
            extra,
        })
    }

    /// Rebuild a full collection object from this typed view, merging back
    /// over `extra` so unknown fields (id, last_modified, ...) survive.
    #[must_use]
    pub fn to_object(&self) -> Map<String, Value> {
        let mut obj = self.extra.clone();
        match self.status {
            Some(status) => {
                obj.insert("status".to_string(), Value::String(status.as_str().to_string()));
            }
            None => {
                obj.remove("status");
            }
        }
        insert_opt(&mut obj, "last_edit_by", &self.tracking.last_edit_by);
        insert_opt(&mut obj, "last_edit_date", &self.tracking.last_edit_date);
        insert_opt(
            &mut obj,
            "last_review_request_by",
            &self.tracking.last_review_request_by,
        );
        insert_opt(
            &mut obj,
            "last_review_request_date",
            &self.tracking.last_review_request_date,
        );
        insert_opt(&mut obj, "last_review_by", &self.tracking.last_review_by);
        insert_opt(&mut obj, "last_review_date", &self.tracking.last_review_date);
        insert_opt(
            &mut obj,
            "last_signature_by",
            &self.tracking.last_signature_by,
        );
        insert_opt(
            &mut obj,
            "last_signature_date",
            &self.tracking.last_signature_date,
        );
        if let Some(ref v) = self.sort {
            obj.insert("sort".to_string(), v.clone());
        }
        if let Some(ref v) = self.display_fields {
            obj.insert("displayFields".to_string(), v.clone());
        }
        if let Some(ref v) = self.attachment {
            obj.insert("attachment".to_string(), v.clone());
        }
        obj
    }
}

/// A typed view over a destination (or preview) collection's metadata object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DestinationMetadata {
    /// The signature bundle, once signed at least once.
    pub signature: Option<SignatureBundle>,
    /// Every other field on the collection object.
    pub extra: Map<String, Value>,
}

impl DestinationMetadata {
    /// Parse a collection object into a typed view.
    #[must_use]
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        let mut extra = obj.clone();
        extra.remove("signature");
        let signature = obj
            .get("signature")
            .and_then(Value::as_object)
            .cloned()
            .map(SignatureBundle::new);
        Self { signature, extra }
    }

    /// Rebuild a full collection object from this typed view.
    #[must_use]
    pub fn to_object(&self) -> Map<String, Value> {
        let mut obj = self.extra.clone();
        if let Some(ref bundle) = self.signature {
            obj.insert("signature".to_string(), Value::Object(bundle.0.clone()));
        }
        obj
    }
}

fn str_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn insert_opt(obj: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    match value {
        Some(v) => {
            obj.insert(key.to_string(), Value::String(v.clone()));
        }
        None => {
            obj.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_status_and_tracking() {
        let obj = json!({
            "id": "blocklist",
            "last_modified": 42,
            "status": "to-review",
            "last_review_request_by": "alice",
            "last_review_request_date": "2026-07-27T00:00:00+00:00",
        })
        .as_object()
        .unwrap()
        .clone();

        let meta = SourceMetadata::from_object(&obj).unwrap();
        assert_eq!(meta.status, Some(Status::ToReview));
        assert_eq!(meta.tracking.last_review_request_by.as_deref(), Some("alice"));
        assert_eq!(meta.extra.get("id").and_then(Value::as_str), Some("blocklist"));

        let rebuilt = meta.to_object();
        assert_eq!(rebuilt.get("status").and_then(Value::as_str), Some("to-review"));
        assert_eq!(rebuilt.get("id").and_then(Value::as_str), Some("blocklist"));
    }

    #[test]
    fn unknown_status_errors() {
        let obj = json!({"status": "bogus"}).as_object().unwrap().clone();
        assert!(SourceMetadata::from_object(&obj).is_err());
    }

    #[test]
    fn absent_status_round_trips_as_none() {
        let obj = json!({"id": "x", "last_modified": 1}).as_object().unwrap().clone();
        let meta = SourceMetadata::from_object(&obj).unwrap();
        assert_eq!(meta.status, None);
        let rebuilt = meta.to_object();
        assert!(!rebuilt.contains_key("status"));
    }

    #[test]
    fn ui_hints_survive_round_trip() {
        let obj = json!({
            "sort": "-age",
            "displayFields": ["name"],
            "attachment": {"enabled": true},
        })
        .as_object()
        .unwrap()
        .clone();
        let meta = SourceMetadata::from_object(&obj).unwrap();
        let rebuilt = meta.to_object();
        assert_eq!(rebuilt["sort"], "-age");
        assert_eq!(rebuilt["displayFields"], json!(["name"]));
    }

    #[test]
    fn destination_metadata_round_trips_signature() {
        let obj = json!({
            "id": "blocklist",
            "signature": {"signature": "abc", "hash_algorithm": "sha384", "signature_encoding": "rs_base64"},
        })
        .as_object()
        .unwrap()
        .clone();
        let meta = DestinationMetadata::from_object(&obj);
        assert!(meta.signature.is_some());
        let rebuilt = meta.to_object();
        assert_eq!(rebuilt["signature"]["signature"], "abc");
        assert_eq!(rebuilt["id"], "blocklist");
    }
}
