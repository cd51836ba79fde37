use signoff_core::{JsonObject, TrackingFields, is_plugin_principal};
use signoff_error::ErrorCode;

/// Reject a posted record/metadata payload that tries to set any tracking
/// field directly, unless it comes from the engine's own plugin principal.
///
/// Tracking fields are stamped exclusively by the engine
/// ([`signoff_core::PLUGIN_PRINCIPAL`]); an end user posting
/// `last_review_by` (or any of [`TrackingFields::FIELD_NAMES`]) themselves is
/// tampering, not a legitimate update.
///
/// # Errors
/// Returns `(`[`ErrorCode::WorkflowTrackingFieldTampered`]`, message)` naming
/// the offending field if a non-plugin caller posted one.
pub fn check_tracking_fields_not_tampered(
    caller_userid: &str,
    posted: &JsonObject,
) -> Result<(), (ErrorCode, String)> {
    if is_plugin_principal(caller_userid) {
        return Ok(());
    }
    for field in TrackingFields::FIELD_NAMES {
        if posted.contains_key(*field) {
            return Err((
                ErrorCode::WorkflowTrackingFieldTampered,
                format!("Cannot set tracking field '{field}' directly"),
            ));
        }
    }
    Ok(())
}

/// Guard against the engine's own mutations re-triggering policy checks: a
/// change made under [`signoff_core::PLUGIN_PRINCIPAL`] should never be
/// re-validated as if an end user posted it (record mutations under that
/// principal do not reset status to work-in-progress, for instance).
#[must_use]
pub fn is_engine_mutation(caller_userid: &str) -> bool {
    is_plugin_principal(caller_userid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: serde_json::Value) -> JsonObject {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn end_user_posting_tracking_field_is_tampering() {
        let posted = obj(json!({"last_review_by": "alice"}));
        let err = check_tracking_fields_not_tampered("basicauth:alice", &posted).unwrap_err();
        assert_eq!(err.0, ErrorCode::WorkflowTrackingFieldTampered);
    }

    #[test]
    fn plugin_principal_may_stamp_tracking_fields() {
        let posted = obj(json!({"last_review_by": "alice", "last_review_date": "2026-01-01"}));
        assert!(check_tracking_fields_not_tampered(signoff_core::PLUGIN_PRINCIPAL, &posted).is_ok());
    }

    #[test]
    fn ordinary_fields_are_unaffected() {
        let posted = obj(json!({"title": "hello"}));
        assert!(check_tracking_fields_not_tampered("basicauth:alice", &posted).is_ok());
    }

    #[test]
    fn engine_mutation_is_recognized() {
        assert!(is_engine_mutation(signoff_core::PLUGIN_PRINCIPAL));
        assert!(!is_engine_mutation("basicauth:alice"));
    }
}
