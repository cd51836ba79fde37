use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use signoff_signer::{SignerBackendKind, SignerSettings};

/// Local ECDSA key locations, nested the way `ecdsa.private_key = "..."`
/// (or an `[ecdsa]` table) parses in TOML.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct EcdsaSettings {
    /// Filesystem path to the private key PEM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Filesystem path to the public key PEM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// Remote Autograph connection settings, nested under `[autograph]`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct AutographSettings {
    /// Base URL of the Autograph instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    /// HAWK credential id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hawk_id: Option<String>,
    /// HAWK credential secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hawk_secret: Option<String>,
}

/// Settings recognized at global, bucket, or collection scope. Any field
/// left `None` falls through to the next-broader scope when resolved with
/// [`resolve`].
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ScopedSettings {
    /// Which signer backend this resource uses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_backend: Option<String>,
    /// Local ECDSA key locations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecdsa: Option<EcdsaSettings>,
    /// Remote Autograph connection settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autograph: Option<AutographSettings>,
    /// Name of the group whose members may request review. May contain `{collection_id}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editors_group: Option<String>,
    /// Name of the group whose members may approve a review. May contain `{collection_id}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewers_group: Option<String>,
    /// Reject `to-sign` unless the collection has actually been reviewed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_review_enabled: Option<bool>,
    /// Enforce `editors_group`/`reviewers_group` membership on transitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_check_enabled: Option<bool>,
    /// CDN distribution id to invalidate after signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_id: Option<String>,
    /// Path patterns to invalidate after signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalidation_paths: Option<Vec<String>>,
}

impl ScopedSettings {
    fn merge_over(&self, narrower: &ScopedSettings) -> ScopedSettings {
        ScopedSettings {
            signer_backend: narrower.signer_backend.clone().or_else(|| self.signer_backend.clone()),
            ecdsa: narrower.ecdsa.clone().or_else(|| self.ecdsa.clone()),
            autograph: narrower.autograph.clone().or_else(|| self.autograph.clone()),
            editors_group: narrower.editors_group.clone().or_else(|| self.editors_group.clone()),
            reviewers_group: narrower
                .reviewers_group
                .clone()
                .or_else(|| self.reviewers_group.clone()),
            to_review_enabled: narrower.to_review_enabled.or(self.to_review_enabled),
            group_check_enabled: narrower.group_check_enabled.or(self.group_check_enabled),
            distribution_id: narrower
                .distribution_id
                .clone()
                .or_else(|| self.distribution_id.clone()),
            invalidation_paths: narrower
                .invalidation_paths
                .clone()
                .or_else(|| self.invalidation_paths.clone()),
        }
    }

    /// Substitute `{collection_id}` in `editors_group`/`reviewers_group`.
    #[must_use]
    pub fn with_collection_id(&self, collection_id: &str) -> ScopedSettings {
        ScopedSettings {
            editors_group: self
                .editors_group
                .as_ref()
                .map(|g| g.replace("{collection_id}", collection_id)),
            reviewers_group: self
                .reviewers_group
                .as_ref()
                .map(|g| g.replace("{collection_id}", collection_id)),
            ..self.clone()
        }
    }

    /// Resolve to a [`SignerSettings`] ready to hand to a `SignerRegistry`.
    ///
    /// `read_file` abstracts loading PEM contents from the `ecdsa.*` paths,
    /// so this crate does not need direct filesystem access in tests.
    pub fn to_signer_settings(
        &self,
        read_file: impl Fn(&str) -> std::io::Result<String>,
    ) -> std::io::Result<SignerSettings> {
        let backend = match self.signer_backend.as_deref() {
            Some("autograph") => SignerBackendKind::Autograph,
            _ => SignerBackendKind::LocalEcdsa,
        };
        let ecdsa = self.ecdsa.as_ref();
        let autograph = self.autograph.as_ref();
        Ok(SignerSettings {
            backend,
            local_private_key_pem: ecdsa
                .and_then(|e| e.private_key.as_deref())
                .map(&read_file)
                .transpose()?,
            local_public_key_pem: ecdsa
                .and_then(|e| e.public_key.as_deref())
                .map(&read_file)
                .transpose()?,
            autograph_server_url: autograph.and_then(|a| a.server_url.clone()),
            autograph_hawk_id: autograph.and_then(|a| a.hawk_id.clone()),
            autograph_hawk_secret: autograph.and_then(|a| a.hawk_secret.clone()),
        })
    }
}

/// Resolve scoped settings by cascading global → bucket → collection,
/// narrower scopes overriding broader ones field by field.
#[must_use]
pub fn resolve(
    global: &ScopedSettings,
    bucket: Option<&ScopedSettings>,
    collection: Option<&ScopedSettings>,
) -> ScopedSettings {
    let with_bucket = match bucket {
        Some(b) => global.merge_over(b),
        None => global.clone(),
    };
    match collection {
        Some(c) => with_bucket.merge_over(c),
        None => with_bucket,
    }
}

/// Scoped-settings overlays keyed by bucket id and by collection URI.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ScopeOverlays {
    /// Overrides keyed by bucket id.
    #[serde(default)]
    pub buckets: BTreeMap<String, ScopedSettings>,
    /// Overrides keyed by collection URI (`/buckets/<b>/collections/<c>`).
    #[serde(default)]
    pub collections: BTreeMap<String, ScopedSettings>,
}

impl ScopeOverlays {
    /// Resolve the effective settings for a bucket/collection pair.
    #[must_use]
    pub fn resolve_for(&self, global: &ScopedSettings, bucket: &str, collection: &str) -> ScopedSettings {
        let collection_uri = format!("/buckets/{bucket}/collections/{collection}");
        let bucket_settings = self.buckets.get(bucket);
        let collection_settings = self.collections.get(&collection_uri);
        resolve(global, bucket_settings, collection_settings).with_collection_id(collection)
    }
}
