use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The host-supplied metadata describing the request/change that triggered
/// a review event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestInfo {
    /// Principal that made the request.
    pub user_id: String,
    /// Bucket id of the changed collection.
    pub bucket_id: String,
    /// Collection id of the changed collection.
    pub collection_id: String,
}

/// A review-milestone notification, queued on [`crate::EngineContext`] and
/// only ever emitted through [`crate::EngineContext::drain_on_commit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum ReviewEvent {
    /// An editor requested review (moved to `to-review`).
    Requested {
        /// Who requested review and where.
        request_info: RequestInfo,
        /// The collection metadata object as stored.
        payload: Value,
        /// Collection URIs affected.
        impacted_objects: Vec<String>,
        /// The resource's source URI.
        resource: String,
        /// The raw host notification that triggered this event.
        original_event: Value,
    },
    /// A reviewer sent the collection back to work-in-progress.
    Rejected {
        /// Who rejected and where.
        request_info: RequestInfo,
        /// The collection metadata object as stored.
        payload: Value,
        /// Collection URIs affected.
        impacted_objects: Vec<String>,
        /// The resource's source URI.
        resource: String,
        /// The raw host notification that triggered this event.
        original_event: Value,
    },
    /// A reviewer approved the collection (moved to `signed`).
    Approved {
        /// Who approved and where.
        request_info: RequestInfo,
        /// The collection metadata object as stored.
        payload: Value,
        /// Collection URIs affected.
        impacted_objects: Vec<String>,
        /// The resource's source URI.
        resource: String,
        /// The raw host notification that triggered this event.
        original_event: Value,
        /// Number of records mirrored to the destination.
        changes_count: u64,
    },
    /// Pending edits were discarded via rollback.
    Canceled {
        /// Who canceled and where.
        request_info: RequestInfo,
        /// The collection metadata object as stored.
        payload: Value,
        /// Collection URIs affected.
        impacted_objects: Vec<String>,
        /// The resource's source URI.
        resource: String,
        /// The raw host notification that triggered this event.
        original_event: Value,
        /// Number of records actually reverted.
        changes_count: u64,
    },
}

/// One configured resource, stripped of signer secrets, as published at the
/// capability endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityResource {
    /// Source resource URI.
    pub source: String,
    /// Preview resource URI, if configured.
    pub preview: Option<String>,
    /// Destination resource URI.
    pub destination: String,
    /// Effective `to_review_enabled` for this resource.
    pub to_review_enabled: bool,
    /// Effective `group_check_enabled` for this resource.
    pub group_check_enabled: bool,
    /// Effective editors group name.
    pub editors_group: Option<String>,
    /// Effective reviewers group name.
    pub reviewers_group: Option<String>,
}

/// The descriptor published at the host's root endpoint, advertising
/// configured resources and the flags in effect for each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Human-readable description of this deployment.
    pub description: String,
    /// URL of this deployment.
    pub url: String,
    /// Deployment version string.
    pub version: String,
    /// Configured resources, signer parameters stripped.
    pub resources: Vec<CapabilityResource>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn approved_carries_changes_count() {
        let event = ReviewEvent::Approved {
            request_info: RequestInfo {
                user_id: "bob".to_string(),
                bucket_id: "main".to_string(),
                collection_id: "blocklist".to_string(),
            },
            payload: json!({}),
            impacted_objects: vec!["/buckets/main/collections/blocklist".to_string()],
            resource: "/buckets/main/collections/blocklist".to_string(),
            original_event: json!({}),
            changes_count: 3,
        };
        match event {
            ReviewEvent::Approved { changes_count, .. } => assert_eq!(changes_count, 3),
            other => panic!("expected Approved, got {other:?}"),
        }
    }

    #[test]
    fn serializes_with_type_tag() {
        let event = ReviewEvent::Requested {
            request_info: RequestInfo::default(),
            payload: json!({}),
            impacted_objects: vec![],
            resource: "/buckets/main/collections/blocklist".to_string(),
            original_event: json!({}),
        };
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["type"], "Requested");
    }
}
