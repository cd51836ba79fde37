use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The opaque signature bundle stored on a destination collection's
/// metadata.
///
/// Local ECDSA bundles carry `signature`, `hash_algorithm`, `signature_encoding`,
/// `x5u`, `content-signature`. Remote (Autograph) bundles are returned
/// verbatim and may additionally carry `mode`. Verification only requires
/// `signature`, `hash_algorithm`, `signature_encoding` to be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureBundle(pub Map<String, Value>);

/// Keys a bundle must carry before [`Signer::verify`](../signoff_signer/trait.Signer.html)
/// can even be attempted.
pub const MANDATORY_VERIFY_FIELDS: &[&str] = &["signature", "hash_algorithm", "signature_encoding"];

impl SignatureBundle {
    /// Build a bundle from its fields.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Fetch a field's string value, if present.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// True if every field in [`MANDATORY_VERIFY_FIELDS`] is present and a string.
    #[must_use]
    pub fn has_mandatory_fields(&self) -> bool {
        MANDATORY_VERIFY_FIELDS
            .iter()
            .all(|k| self.get_str(k).is_some())
    }

    /// Merge UI hints (`sort`, `displayFields`, `attachment`) copied from the
    /// source collection, without overwriting fields already present on
    /// the destination.
    pub fn merge_ui_hints_from(&mut self, source_attrs: &Map<String, Value>) {
        for key in ["sort", "displayFields", "attachment"] {
            if let Some(value) = source_attrs.get(key)
                && !self.0.contains_key(key)
            {
                self.0.insert(key.to_string(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_bundle() -> SignatureBundle {
        let mut m = Map::new();
        m.insert("signature".into(), Value::String("sig".into()));
        m.insert("hash_algorithm".into(), Value::String("sha384".into()));
        m.insert("signature_encoding".into(), Value::String("rs_base64".into()));
        m.insert("x5u".into(), Value::String(String::new()));
        m.insert(
            "content-signature".into(),
            Value::String("x5u=;p384ecdsa=sig".into()),
        );
        SignatureBundle::new(m)
    }

    #[test]
    fn mandatory_fields_present() {
        assert!(local_bundle().has_mandatory_fields());
    }

    #[test]
    fn missing_mandatory_field_is_detected() {
        let mut bundle = local_bundle();
        bundle.0.remove("hash_algorithm");
        assert!(!bundle.has_mandatory_fields());
    }

    #[test]
    fn ui_hints_are_copied_but_not_overwritten() {
        let mut bundle = local_bundle();
        bundle.0.insert("sort".into(), Value::String("-priority".into()));

        let mut source_attrs = Map::new();
        source_attrs.insert("sort".into(), Value::String("-age".into()));
        source_attrs.insert("displayFields".into(), Value::String("name".into()));

        bundle.merge_ui_hints_from(&source_attrs);

        assert_eq!(bundle.get_str("sort"), Some("-priority"));
        assert_eq!(bundle.get_str("displayFields"), Some("name"));
    }
}
