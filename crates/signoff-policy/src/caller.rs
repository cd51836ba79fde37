use std::collections::HashSet;

/// A request's authenticated principal and the set of principal URIs it
/// carries (its own userid plus any group URIs it belongs to).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// The caller's userid, e.g. `"basicauth:abc123"`.
    pub userid: String,
    /// All principal URIs the caller is recognized under, including its own
    /// userid and any group membership URIs (e.g.
    /// `/buckets/main-workspace/groups/blocklist-editors`).
    pub principals: HashSet<String>,
}

impl Caller {
    /// Build a caller from a userid and its group membership URIs. The
    /// userid itself is always included in `principals`.
    #[must_use]
    pub fn new(userid: impl Into<String>, groups: impl IntoIterator<Item = String>) -> Self {
        let userid = userid.into();
        let mut principals: HashSet<String> = groups.into_iter().collect();
        principals.insert(userid.clone());
        Self { userid, principals }
    }

    /// Whether this caller matches the given userid.
    #[must_use]
    pub fn is(&self, userid: &str) -> bool {
        self.userid == userid
    }

    /// Whether this caller carries the given principal URI (itself or a
    /// group it belongs to).
    #[must_use]
    pub fn has_principal(&self, uri: &str) -> bool {
        self.principals.contains(uri)
    }
}
