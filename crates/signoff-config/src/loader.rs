use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::resource_map::parse_resource_map;
use crate::settings::{ScopeOverlays, ScopedSettings};
use crate::ConfigError;

/// Top-level configuration: the resource map plus global and per-scope
/// settings overlays.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct SignoffConfig {
    /// Raw resource-map text; one triple per line, validated lazily by
    /// [`SignoffConfig::resources`].
    #[serde(default)]
    pub resources: String,
    /// Settings applied to every bucket and collection unless overridden.
    #[serde(default)]
    pub global: ScopedSettings,
    /// Bucket- and collection-scoped overrides.
    #[serde(default)]
    pub overlays: ScopeOverlays,
}

impl SignoffConfig {
    /// Parse [`Self::resources`] into structured entries.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidResourceMap`] on any grammar or
    /// uniqueness violation.
    pub fn resource_entries(&self) -> Result<Vec<crate::ResourceEntry>, ConfigError> {
        parse_resource_map(&self.resources)
    }
}

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// No resource entries are configured; the engine will have nothing to do.
    EmptyResourceMap,
    /// A scoped override names a bucket or collection never mentioned in the
    /// resource map.
    UnreferencedOverlay {
        /// The overlay key (bucket id or collection URI).
        key: String,
    },
    /// `group_check_enabled` is on but no `editors_group`/`reviewers_group`
    /// is configured at any visible scope.
    GroupCheckWithoutGroups {
        /// The collection URI this applies to.
        collection_uri: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyResourceMap => write!(f, "resource map has no entries"),
            Self::UnreferencedOverlay { key } => {
                write!(f, "overlay '{key}' does not match any configured resource")
            }
            Self::GroupCheckWithoutGroups { collection_uri } => write!(
                f,
                "group_check_enabled is set for '{collection_uri}' but no editors/reviewers group is configured"
            ),
        }
    }
}

/// Load a [`SignoffConfig`] from a TOML file on disk.
///
/// # Errors
/// Returns [`ConfigError::FileNotFound`] if the file cannot be read, or
/// [`ConfigError::ParseError`]/[`ConfigError::InvalidResourceMap`] if its
/// contents are malformed.
pub fn load_config(path: &Path) -> Result<SignoffConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.display().to_string(),
    })?;
    parse_toml(&content)
}

/// Parse a TOML string into a [`SignoffConfig`], validating the resource map
/// eagerly so callers learn about grammar errors at load time.
pub fn parse_toml(content: &str) -> Result<SignoffConfig, ConfigError> {
    let config = toml::from_str::<SignoffConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })?;
    parse_resource_map(&config.resources)?;
    Ok(config)
}

/// Validate a parsed configuration, returning advisory warnings.
///
/// # Errors
/// Returns [`ConfigError::InvalidResourceMap`] if the resource map itself is
/// malformed.
pub fn validate_config(config: &SignoffConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let entries = config.resource_entries()?;
    let mut warnings = Vec::new();

    if entries.is_empty() {
        warnings.push(ConfigWarning::EmptyResourceMap);
    }

    let known_buckets: std::collections::HashSet<String> =
        entries.iter().map(|e| e.source.bucket().to_string()).collect();
    let known_collections: std::collections::HashSet<String> =
        entries.iter().map(|e| e.source.uri()).collect();

    for bucket in config.overlays.buckets.keys() {
        if !known_buckets.contains(bucket) {
            warnings.push(ConfigWarning::UnreferencedOverlay { key: bucket.clone() });
        }
    }
    for collection_uri in config.overlays.collections.keys() {
        if !known_collections.contains(collection_uri) {
            warnings.push(ConfigWarning::UnreferencedOverlay {
                key: collection_uri.clone(),
            });
        }
    }

    for entry in &entries {
        if let crate::ResourceEndpoint::Collection(collection_ref) = &entry.source {
            let collection_uri = collection_ref.collection_uri();
            let bucket_settings = config.overlays.buckets.get(&collection_ref.bucket);
            let collection_settings = config.overlays.collections.get(&collection_uri);
            let resolved = crate::settings::resolve(&config.global, bucket_settings, collection_settings);
            if resolved.group_check_enabled == Some(true)
                && resolved.editors_group.is_none()
                && resolved.reviewers_group.is_none()
            {
                warnings.push(ConfigWarning::GroupCheckWithoutGroups { collection_uri });
            }
        }
    }

    Ok(warnings)
}

/// Merge two configurations. Values in `overlay` take precedence over `base`.
///
/// Overlay maps are combined; on key collisions the overlay entry wins.
/// `resources` is taken from `overlay` when non-empty, otherwise from `base`.
pub fn merge_configs(base: SignoffConfig, overlay: SignoffConfig) -> SignoffConfig {
    let resources = if overlay.resources.trim().is_empty() {
        base.resources
    } else {
        overlay.resources
    };
    let global = crate::settings::resolve(&base.global, None, Some(&overlay.global));
    let mut buckets = base.overlays.buckets;
    buckets.extend(overlay.overlays.buckets);
    let mut collections = base.overlays.collections;
    collections.extend(overlay.overlays.collections);
    SignoffConfig {
        resources,
        global,
        overlays: ScopeOverlays { buckets, collections },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
resources = """
main-workspace/blocklist -> main/blocklist
"""

[global]
signer_backend = "local_ecdsa"
editors_group = "{collection_id}-editors"
reviewers_group = "{collection_id}-reviewers"
to_review_enabled = true
group_check_enabled = true

[global.ecdsa]
private_key = "/etc/signoff/ecdsa.private.pem"
public_key = "/etc/signoff/ecdsa.public.pem"

[overlays.buckets.main-workspace]
to_review_enabled = false
"#;

    #[test]
    fn parses_valid_toml_string() {
        let cfg = parse_toml(SAMPLE).unwrap();
        assert_eq!(cfg.global.signer_backend.as_deref(), Some("local_ecdsa"));
        assert_eq!(
            cfg.global.ecdsa.as_ref().unwrap().private_key.as_deref(),
            Some("/etc/signoff/ecdsa.private.pem")
        );
        assert!(cfg.overlays.buckets.contains_key("main-workspace"));
    }

    #[test]
    fn parse_invalid_toml_gives_parse_error() {
        let err = parse_toml("this is [not valid toml =").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn parse_rejects_malformed_resource_map() {
        let bad = r#"resources = "main-workspace/blocklist""#;
        let err = parse_toml(bad).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidResourceMap { .. }));
    }

    #[test]
    fn empty_config_warns_about_empty_resource_map() {
        let cfg = SignoffConfig::default();
        let warnings = validate_config(&cfg).unwrap();
        assert!(warnings.contains(&ConfigWarning::EmptyResourceMap));
    }

    #[test]
    fn validation_flags_unreferenced_overlay() {
        let mut cfg = parse_toml(SAMPLE).unwrap();
        cfg.overlays.buckets.insert("nonexistent".to_string(), ScopedSettings::default());
        let warnings = validate_config(&cfg).unwrap();
        assert!(warnings.iter().any(|w| matches!(w, ConfigWarning::UnreferencedOverlay { key } if key == "nonexistent")));
    }

    #[test]
    fn validation_flags_group_check_without_groups() {
        let toml = r#"
resources = """
main-workspace/blocklist -> main/blocklist
"""

[global]
group_check_enabled = true
"#;
        let cfg = parse_toml(toml).unwrap();
        let warnings = validate_config(&cfg).unwrap();
        assert!(warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::GroupCheckWithoutGroups { .. })));
    }

    #[test]
    fn merge_overlay_settings_override_base() {
        let base = SignoffConfig {
            global: ScopedSettings {
                to_review_enabled: Some(true),
                ..ScopedSettings::default()
            },
            ..SignoffConfig::default()
        };
        let overlay = SignoffConfig {
            global: ScopedSettings {
                to_review_enabled: Some(false),
                ..ScopedSettings::default()
            },
            ..SignoffConfig::default()
        };
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.global.to_review_enabled, Some(false));
    }

    #[test]
    fn merge_keeps_base_resources_when_overlay_empty() {
        let base = SignoffConfig {
            resources: "main/blocklist -> dest/blocklist".to_string(),
            ..SignoffConfig::default()
        };
        let merged = merge_configs(base.clone(), SignoffConfig::default());
        assert_eq!(merged.resources, base.resources);
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signoff.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "{SAMPLE}").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.global.signer_backend.as_deref(), Some("local_ecdsa"));
    }

    #[test]
    fn load_missing_file_gives_file_not_found() {
        let err = load_config(Path::new("/nonexistent/signoff.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
