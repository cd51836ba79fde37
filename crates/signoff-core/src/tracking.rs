use serde::{Deserialize, Serialize};

/// Collection-metadata fields the engine stamps to record authorship,
/// review, and signature identity and time.
///
/// These are immutable to end users: only the engine, acting under
/// [`crate::PLUGIN_PRINCIPAL`], may write them. Dates are ISO-8601 strings
/// to match the host's existing timestamp convention for metadata records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingFields {
    /// Principal that last edited the source collection's records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edit_by: Option<String>,
    /// When the last edit happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edit_date: Option<String>,
    /// Principal that last requested a review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review_request_by: Option<String>,
    /// When the last review request happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review_request_date: Option<String>,
    /// Principal that last approved a review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review_by: Option<String>,
    /// When the last review approval happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review_date: Option<String>,
    /// Principal that triggered the last signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_signature_by: Option<String>,
    /// When the last signature happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_signature_date: Option<String>,
}

impl TrackingFields {
    /// The field names, for tamper-detection over a raw JSON object.
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "last_edit_by",
        "last_edit_date",
        "last_review_request_by",
        "last_review_request_date",
        "last_review_by",
        "last_review_date",
        "last_signature_by",
        "last_signature_date",
    ];
}
