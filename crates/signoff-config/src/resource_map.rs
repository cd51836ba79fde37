use std::collections::HashSet;
use std::fmt;

use signoff_core::CollectionRef;

use crate::ConfigError;

/// One endpoint of a resource triple: either a whole bucket (every
/// collection in it) or one specific collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceEndpoint {
    /// Applies to every collection in the named bucket.
    Bucket(String),
    /// Applies to exactly this collection.
    Collection(CollectionRef),
}

impl ResourceEndpoint {
    /// The bucket id, regardless of endpoint kind.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::Bucket(b) => b,
            Self::Collection(r) => &r.bucket,
        }
    }

    /// The resource URI this endpoint denotes.
    #[must_use]
    pub fn uri(&self) -> String {
        match self {
            Self::Bucket(b) => format!("/buckets/{b}"),
            Self::Collection(r) => r.collection_uri(),
        }
    }

    /// Materialize a bucket-wide endpoint into a collection-specific one,
    /// for a resource match against a particular incoming collection id.
    #[must_use]
    pub fn with_collection(&self, collection: &str) -> CollectionRef {
        match self {
            Self::Bucket(b) => CollectionRef::new(b.clone(), collection),
            Self::Collection(r) => r.clone(),
        }
    }

    fn is_bucket_wide(&self) -> bool {
        matches!(self, Self::Bucket(_))
    }
}

impl fmt::Display for ResourceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

/// One configured resource: a source collection (or bucket) mirrored,
/// optionally through a preview, to a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    /// Source endpoint — where editors work.
    pub source: ResourceEndpoint,
    /// Optional preview endpoint — signed after `to-review`, before `to-sign`.
    pub preview: Option<ResourceEndpoint>,
    /// Destination endpoint — signed after `to-sign`.
    pub destination: ResourceEndpoint,
}

/// Parse the resource-map grammar: one triple per line, `;` or `->`
/// separated, each item `bucket/collection` (legacy) or
/// `/buckets/<bid>[/collections/<cid>]` (canonical).
///
/// # Errors
/// Returns [`ConfigError::InvalidResourceMap`] naming the offending line
/// on any grammar or uniqueness violation.
pub fn parse_resource_map(text: &str) -> Result<Vec<ResourceEntry>, ConfigError> {
    let mut entries = Vec::new();
    let mut seen_sources: HashSet<String> = HashSet::new();
    let mut seen_destinations: HashSet<String> = HashSet::new();
    let mut seen_previews: HashSet<String> = HashSet::new();
    let mut seen_any_role: HashSet<String> = HashSet::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let items = split_items(line);
        let endpoints: Vec<ResourceEndpoint> = items
            .iter()
            .map(|item| parse_endpoint(item, raw_line))
            .collect::<Result<_, _>>()?;

        let (source, preview, destination) = match endpoints.len() {
            2 => (endpoints[0].clone(), None, endpoints[1].clone()),
            3 => (
                endpoints[0].clone(),
                Some(endpoints[1].clone()),
                endpoints[2].clone(),
            ),
            n => {
                return Err(malformed(
                    raw_line,
                    format!("expected 2 or 3 items separated by ';' or '->', got {n}"),
                ));
            }
        };

        let all_bucket_wide = [Some(&source), preview.as_ref(), Some(&destination)]
            .into_iter()
            .flatten()
            .all(ResourceEndpoint::is_bucket_wide);
        let all_collection = [Some(&source), preview.as_ref(), Some(&destination)]
            .into_iter()
            .flatten()
            .all(|e| !e.is_bucket_wide());
        if !all_bucket_wide && !all_collection {
            return Err(malformed(
                raw_line,
                "cannot mix per-bucket and per-collection endpoints in one triple".to_string(),
            ));
        }

        if source.uri() == destination.uri() {
            return Err(malformed(
                raw_line,
                "source and destination must not be the same resource".to_string(),
            ));
        }
        if let Some(p) = &preview
            && (p.uri() == source.uri() || p.uri() == destination.uri())
        {
            return Err(malformed(
                raw_line,
                "preview must not equal source or destination".to_string(),
            ));
        }

        let source_uri = source.uri();
        let destination_uri = destination.uri();
        if !seen_sources.insert(source_uri.clone()) {
            return Err(malformed(raw_line, format!("repeated source URI '{source_uri}'")));
        }
        if !seen_destinations.insert(destination_uri.clone()) {
            return Err(malformed(
                raw_line,
                format!("repeated destination URI '{destination_uri}'"),
            ));
        }
        if let Some(p) = &preview {
            let preview_uri = p.uri();
            if !seen_previews.insert(preview_uri.clone()) {
                return Err(malformed(raw_line, format!("repeated preview URI '{preview_uri}'")));
            }
        }

        let mut role_uris = vec![source_uri.clone(), destination_uri.clone()];
        if let Some(p) = &preview {
            role_uris.push(p.uri());
        }
        for uri in role_uris {
            if !seen_any_role.insert(uri.clone()) {
                return Err(malformed(
                    raw_line,
                    format!("URI '{uri}' appears in more than one role across the resource map"),
                ));
            }
        }

        entries.push(ResourceEntry {
            source,
            preview,
            destination,
        });
    }

    Ok(entries)
}

fn split_items(line: &str) -> Vec<String> {
    line.replace("->", ";")
        .split(';')
        .map(|s| s.trim().to_string())
        .collect()
}

fn parse_endpoint(item: &str, raw_line: &str) -> Result<ResourceEndpoint, ConfigError> {
    if let Some(rest) = item.strip_prefix("/buckets/") {
        let mut parts = rest.splitn(2, "/collections/");
        let bucket = parts.next().unwrap_or("");
        validate_id(bucket, raw_line)?;
        return match parts.next() {
            Some(collection) => {
                validate_id(collection, raw_line)?;
                Ok(ResourceEndpoint::Collection(CollectionRef::new(bucket, collection)))
            }
            None => Ok(ResourceEndpoint::Bucket(bucket.to_string())),
        };
    }

    let mut parts = item.splitn(2, '/');
    let bucket = parts.next().unwrap_or("");
    let collection = parts.next();
    match collection {
        Some(collection) if !collection.is_empty() => {
            validate_id(bucket, raw_line)?;
            validate_id(collection, raw_line)?;
            Ok(ResourceEndpoint::Collection(CollectionRef::new(bucket, collection)))
        }
        _ => Err(malformed(
            raw_line,
            format!("invalid resource item '{item}': expected 'bucket/collection' or '/buckets/<id>[/collections/<id>]'"),
        )),
    }
}

fn validate_id(id: &str, raw_line: &str) -> Result<(), ConfigError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(malformed(raw_line, format!("invalid id '{id}'")))
    }
}

fn malformed(raw_line: &str, message: String) -> ConfigError {
    ConfigError::InvalidResourceMap {
        line: raw_line.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_item_legacy_line() {
        let entries = parse_resource_map("main-workspace/blocklist -> main/blocklist").unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].preview.is_none());
    }

    #[test]
    fn parses_three_item_canonical_line_with_semicolons() {
        let entries = parse_resource_map(
            "/buckets/main-workspace/collections/blocklist;/buckets/main-preview/collections/blocklist;/buckets/main/collections/blocklist",
        )
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].preview.is_some());
    }

    #[test]
    fn bucket_wide_endpoints_are_accepted_when_consistent() {
        let entries =
            parse_resource_map("/buckets/main-workspace -> /buckets/main").unwrap();
        assert_eq!(entries[0].source, ResourceEndpoint::Bucket("main-workspace".to_string()));
    }

    #[test]
    fn rejects_mixed_bucket_and_collection_endpoints() {
        let err = parse_resource_map("/buckets/main-workspace -> main/blocklist").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidResourceMap { .. }));
    }

    #[test]
    fn rejects_malformed_item_count() {
        let err = parse_resource_map("main-workspace/blocklist").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidResourceMap { .. }));
    }

    #[test]
    fn rejects_source_equal_to_destination() {
        let err = parse_resource_map("main/blocklist -> main/blocklist").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidResourceMap { .. }));
    }

    #[test]
    fn rejects_repeated_source_uri() {
        let text = "main-a/blocklist -> dest-a/blocklist\nmain-a/blocklist -> dest-b/blocklist";
        let err = parse_resource_map(text).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidResourceMap { .. }));
    }

    #[test]
    fn rejects_uri_reused_across_roles() {
        let text = "main-a/blocklist -> dest-a/blocklist\nmain-b/blocklist -> main-a/blocklist";
        let err = parse_resource_map(text).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidResourceMap { .. }));
    }

    #[test]
    fn rejects_invalid_ids() {
        let err = parse_resource_map("main workspace/blocklist -> main/blocklist").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidResourceMap { .. }));
    }

    #[test]
    fn blank_lines_and_comments_are_ignored() {
        let entries = parse_resource_map("\n# comment\nmain/blocklist -> dest/blocklist\n").unwrap();
        assert_eq!(entries.len(), 1);
    }
}
