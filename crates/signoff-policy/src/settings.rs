/// Workflow authorization settings in effect for one resource, resolved by
/// the configuration layer's global → bucket → collection cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Enforce editors/reviewers group membership on `to-review`/`to-sign`.
    pub group_check_enabled: bool,
    /// Reject `to-sign` unless the collection actually went through `to-review`.
    pub to_review_enabled: bool,
    /// Principal URI of the editors group, e.g.
    /// `/buckets/main-workspace/groups/blocklist-editors`.
    pub editors_group: Option<String>,
    /// Principal URI of the reviewers group, e.g.
    /// `/buckets/main-workspace/groups/blocklist-reviewers`.
    pub reviewers_group: Option<String>,
}
