use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{AutographSigner, LocalEcdsaSigner, Signer, SignerError};

/// Which signer backend a resource is configured to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerBackendKind {
    /// Sign locally with a P-384 key held on disk.
    LocalEcdsa,
    /// Delegate to a remote Autograph instance over HAWK.
    Autograph,
}

/// Resolved signer configuration for one resource (a specific collection,
/// a whole bucket, or the deployment-wide default).
#[derive(Debug, Clone)]
pub struct SignerSettings {
    /// Backend to instantiate.
    pub backend: SignerBackendKind,
    /// PKCS#8 PEM private key, for [`SignerBackendKind::LocalEcdsa`].
    pub local_private_key_pem: Option<String>,
    /// SPKI PEM public key, for verify-only [`SignerBackendKind::LocalEcdsa`] use.
    pub local_public_key_pem: Option<String>,
    /// Autograph server base URL, for [`SignerBackendKind::Autograph`].
    pub autograph_server_url: Option<String>,
    /// Autograph HAWK id, for [`SignerBackendKind::Autograph`].
    pub autograph_hawk_id: Option<String>,
    /// Autograph HAWK secret, for [`SignerBackendKind::Autograph`].
    pub autograph_hawk_secret: Option<String>,
}

impl SignerSettings {
    fn build(&self) -> Result<Arc<dyn Signer>, SignerError> {
        match self.backend {
            SignerBackendKind::LocalEcdsa => {
                if let Some(pem) = &self.local_private_key_pem {
                    Ok(Arc::new(LocalEcdsaSigner::from_private_key_pem(pem)?))
                } else if let Some(pem) = &self.local_public_key_pem {
                    Ok(Arc::new(LocalEcdsaSigner::from_public_key_pem(pem)?))
                } else {
                    Err(SignerError::InvalidKey(
                        "local_ecdsa backend needs a private or public key".to_string(),
                    ))
                }
            }
            SignerBackendKind::Autograph => {
                let server_url = self.autograph_server_url.as_deref().ok_or_else(|| {
                    SignerError::InvalidKey("autograph backend needs server_url".to_string())
                })?;
                let hawk_id = self.autograph_hawk_id.as_deref().ok_or_else(|| {
                    SignerError::InvalidKey("autograph backend needs hawk_id".to_string())
                })?;
                let hawk_secret = self.autograph_hawk_secret.as_deref().ok_or_else(|| {
                    SignerError::InvalidKey("autograph backend needs hawk_secret".to_string())
                })?;
                Ok(Arc::new(AutographSigner::new(server_url, hawk_id, hawk_secret)?))
            }
        }
    }
}

/// Caches one [`Signer`] instance per configured source URI so repeated
/// sign/verify calls against the same resource reuse the same loaded key
/// material instead of reparsing PEMs on every request.
#[derive(Default)]
pub struct SignerRegistry {
    cache: Mutex<HashMap<String, Arc<dyn Signer>>>,
}

impl SignerRegistry {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Look up (or build and cache) the signer for `source_uri`, resolving
    /// settings as `collection_settings` if present, else `bucket_settings`,
    /// else `global_settings`.
    pub fn select_signer(
        &self,
        source_uri: &str,
        collection_settings: Option<&SignerSettings>,
        bucket_settings: Option<&SignerSettings>,
        global_settings: &SignerSettings,
    ) -> Result<Arc<dyn Signer>, SignerError> {
        let mut cache = self.cache.lock().expect("signer registry mutex poisoned");
        if let Some(signer) = cache.get(source_uri) {
            return Ok(Arc::clone(signer));
        }

        let settings = collection_settings
            .or(bucket_settings)
            .unwrap_or(global_settings);
        let signer = settings.build()?;
        cache.insert(source_uri.to_string(), Arc::clone(&signer));
        Ok(signer)
    }
}

impl Default for SignerSettings {
    fn default() -> Self {
        Self {
            backend: SignerBackendKind::LocalEcdsa,
            local_private_key_pem: None,
            local_public_key_pem: None,
            autograph_server_url: None,
            autograph_hawk_id: None,
            autograph_hawk_secret: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_settings_take_priority_over_bucket_and_global() {
        let (private_pem, _) = LocalEcdsaSigner::generate_keypair().unwrap();
        let registry = SignerRegistry::new();

        let collection_settings = SignerSettings {
            local_private_key_pem: Some(private_pem),
            ..SignerSettings::default()
        };
        let global = SignerSettings::default();

        let signer = registry
            .select_signer(
                "/buckets/main/collections/blocklist",
                Some(&collection_settings),
                None,
                &global,
            )
            .unwrap();
        assert!(signer.heartbeat());
    }

    #[test]
    fn missing_key_material_is_an_error() {
        let registry = SignerRegistry::new();
        let global = SignerSettings::default();
        let err = registry
            .select_signer("/buckets/main/collections/x", None, None, &global)
            .unwrap_err();
        assert!(matches!(err, SignerError::InvalidKey(_)));
    }

    #[test]
    fn repeated_lookups_reuse_the_cached_instance() {
        let (private_pem, _) = LocalEcdsaSigner::generate_keypair().unwrap();
        let registry = SignerRegistry::new();
        let settings = SignerSettings {
            local_private_key_pem: Some(private_pem),
            ..SignerSettings::default()
        };

        let first = registry
            .select_signer("/buckets/main/collections/x", Some(&settings), None, &settings)
            .unwrap();
        let second = registry
            .select_signer("/buckets/main/collections/x", None, None, &settings)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
