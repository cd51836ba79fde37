use std::sync::Arc;

use signoff_config::{ResourceEndpoint, ResourceEntry, ScopeOverlays, ScopedSettings};
use signoff_core::{CollectionRef, JsonObject, PLUGIN_PRINCIPAL, SourceMetadata, Status, is_plugin_principal};
use signoff_policy::{Caller, Effect, TransitionOutcome, TransitionRequest, WorkflowSettings, validate_transition};
use signoff_signer::{Signer, SignerRegistry, SignerSettings};
use signoff_storage::{Permission, Storage};

use crate::cache::CacheSettings;
use crate::context::EngineContext;
use crate::error::EngineError;
use crate::events::{CapabilityDescriptor, CapabilityResource, RequestInfo, ReviewEvent};
use crate::lifecycle::bootstrap_review_groups;
use crate::updater::Updater;

/// A resource entry with its placeholders substituted for one concrete
/// (bucket, collection) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedResource {
    /// The concrete source collection.
    pub source: CollectionRef,
    /// The concrete preview collection, if configured.
    pub preview: Option<CollectionRef>,
    /// The concrete destination collection.
    pub destination: CollectionRef,
}

/// Reads PEM-encoded key material from a filesystem path (or, in tests, a
/// fixture map). Abstracted so this crate stays free of direct I/O.
pub type KeyReader = Box<dyn Fn(&str) -> std::io::Result<String> + Send + Sync>;

/// Ties the resource map, scoped settings, signer registry, and storage/
/// permission backends together to process host-emitted notifications.
///
/// Constructed once at startup and shared across requests; the review-event
/// queue lives on the caller-owned, per-request [`EngineContext`] instead.
pub struct Engine {
    resources: Vec<ResourceEntry>,
    global: ScopedSettings,
    overlays: ScopeOverlays,
    signers: SignerRegistry,
    storage: Arc<dyn Storage>,
    permission: Arc<dyn Permission>,
    key_reader: KeyReader,
}

impl Engine {
    /// Build an engine over a parsed resource map and scoped settings.
    pub fn new(
        resources: Vec<ResourceEntry>,
        global: ScopedSettings,
        overlays: ScopeOverlays,
        storage: Arc<dyn Storage>,
        permission: Arc<dyn Permission>,
        key_reader: KeyReader,
    ) -> Self {
        Self {
            resources,
            global,
            overlays,
            signers: SignerRegistry::new(),
            storage,
            permission,
            key_reader,
        }
    }

    /// Resolve the resource matching `bucket`/`collection`: an exact
    /// collection-scoped entry first, else a bucket-wide entry materialized
    /// with the specific collection id filled in.
    #[must_use]
    pub fn resolve_resource(&self, bucket: &str, collection: &str) -> Option<MatchedResource> {
        let exact = self.resources.iter().find(|entry| match &entry.source {
            ResourceEndpoint::Collection(r) => r.bucket == bucket && r.collection == collection,
            ResourceEndpoint::Bucket(_) => false,
        });
        let entry = exact.or_else(|| {
            self.resources
                .iter()
                .find(|entry| matches!(&entry.source, ResourceEndpoint::Bucket(b) if b == bucket))
        })?;
        Some(MatchedResource {
            source: entry.source.with_collection(collection),
            preview: entry.preview.as_ref().map(|p| p.with_collection(collection)),
            destination: entry.destination.with_collection(collection),
        })
    }

    fn resolved_settings(&self, bucket: &str, collection: &str) -> ScopedSettings {
        self.overlays.resolve_for(&self.global, bucket, collection)
    }

    fn workflow_settings(scoped: &ScopedSettings) -> WorkflowSettings {
        WorkflowSettings {
            group_check_enabled: scoped.group_check_enabled.unwrap_or(false),
            to_review_enabled: scoped.to_review_enabled.unwrap_or(false),
            editors_group: scoped.editors_group.clone(),
            reviewers_group: scoped.reviewers_group.clone(),
        }
    }

    fn cache_settings(scoped: &ScopedSettings) -> CacheSettings {
        CacheSettings {
            distribution_id: scoped.distribution_id.clone(),
            invalidation_paths: scoped.invalidation_paths.clone().unwrap_or_default(),
        }
    }

    fn select_signer(&self, source_uri: &str, scoped: &ScopedSettings) -> Result<Arc<dyn Signer>, EngineError> {
        let settings: SignerSettings = scoped.to_signer_settings(|path| (self.key_reader)(path))?;
        self.signers
            .select_signer(source_uri, Some(&settings), None, &SignerSettings::default())
            .map_err(EngineError::from)
    }

    fn updater_for<'a>(
        &'a self,
        source: CollectionRef,
        destination: CollectionRef,
        signer: Arc<dyn Signer>,
        scoped: &ScopedSettings,
    ) -> Updater<'a> {
        Updater::new(
            source,
            destination,
            signer,
            self.storage.as_ref(),
            self.permission.as_ref(),
            Self::cache_settings(scoped),
        )
    }

    /// A record changed under `bucket`/`collection` on a source: demote its
    /// status back to work-in-progress. A no-op if the mutating principal
    /// is the engine's own (the recursivity guard), or if no resource
    /// matches.
    ///
    /// # Errors
    /// Propagates storage errors.
    pub async fn on_record_changed(&self, bucket: &str, collection: &str, caller: &str) -> Result<(), EngineError> {
        if is_plugin_principal(caller) {
            return Ok(());
        }
        let Some(matched) = self.resolve_resource(bucket, collection) else {
            return Ok(());
        };
        let scoped = self.resolved_settings(bucket, collection);
        let signer = self.select_signer(&matched.source.collection_uri(), &scoped)?;
        let updater = self.updater_for(matched.source, matched.destination, signer, &scoped);
        updater.update_source_status(caller, Status::WorkInProgress, None).await?;
        Ok(())
    }

    /// A source collection under `bucket`/`collection` was created: bootstrap
    /// its editors/reviewers groups (if configured) and ensure its
    /// destination/preview collections exist.
    ///
    /// # Errors
    /// Propagates storage/permission errors.
    pub async fn on_source_created(&self, bucket: &str, collection: &str, caller: &str) -> Result<(), EngineError> {
        let Some(matched) = self.resolve_resource(bucket, collection) else {
            return Err(EngineError::NoMatchingResource(format!("/buckets/{bucket}/collections/{collection}")));
        };
        let scoped = self.resolved_settings(bucket, collection);

        if scoped.group_check_enabled.unwrap_or(false)
            && let (Some(editors), Some(reviewers)) = (&scoped.editors_group, &scoped.reviewers_group)
        {
            bootstrap_review_groups(self.permission.as_ref(), &matched.source, editors, reviewers, caller).await?;
        }

        crate::lifecycle::ensure_mirror_collection(
            self.storage.as_ref(),
            self.permission.as_ref(),
            &matched.destination,
            PLUGIN_PRINCIPAL,
        )
        .await?;
        if let Some(preview) = &matched.preview {
            crate::lifecycle::ensure_mirror_collection(self.storage.as_ref(), self.permission.as_ref(), preview, PLUGIN_PRINCIPAL)
                .await?;
        }
        Ok(())
    }

    /// A collection-changed notification requested `requested_status` on
    /// `bucket`/`collection`. Validates the transition and, if accepted,
    /// executes the corresponding updater effect(s), queuing any resulting
    /// review event on `ctx`.
    ///
    /// # Errors
    /// Returns [`EngineError::Rejected`] if the workflow policy rejects the
    /// transition, [`EngineError::NoMatchingResource`] if nothing in the
    /// resource map matches, or a storage/signer error.
    pub async fn on_collection_changed(
        &self,
        ctx: &mut EngineContext,
        bucket: &str,
        collection: &str,
        caller: &Caller,
        requested_status: Status,
    ) -> Result<(), EngineError> {
        if is_plugin_principal(&caller.userid) {
            return Ok(());
        }
        let Some(matched) = self.resolve_resource(bucket, collection) else {
            return Err(EngineError::NoMatchingResource(format!("/buckets/{bucket}/collections/{collection}")));
        };
        let scoped = self.resolved_settings(bucket, collection);
        let workflow_settings = Self::workflow_settings(&scoped);

        let source_obj = self.storage.collection_metadata(&matched.source).await?;
        let source_meta = SourceMetadata::from_object(&source_obj).unwrap_or_default();

        let request = TransitionRequest {
            current_status: source_meta.status,
            requested_status,
            caller,
            last_review_request_by: source_meta.tracking.last_review_request_by.as_deref(),
            settings: &workflow_settings,
        };
        let outcome = validate_transition(&request);
        let (next_status, effects) = match outcome {
            TransitionOutcome::Reject { code, message } => return Err(EngineError::Rejected { code, message }),
            TransitionOutcome::Accept { next_status, effects } => (next_status, effects),
        };

        let signer = self.select_signer(&matched.source.collection_uri(), &scoped)?;
        let updater = self.updater_for(matched.source.clone(), matched.destination.clone(), Arc::clone(&signer), &scoped);

        let request_info = RequestInfo {
            user_id: caller.userid.clone(),
            bucket_id: bucket.to_string(),
            collection_id: collection.to_string(),
        };
        let resource_uri = matched.source.collection_uri();
        let impacted = vec![resource_uri.clone()];

        for effect in effects {
            match effect {
                Effect::StampReviewRequested => {
                    updater.update_source_status(&caller.userid, next_status, source_meta.status).await?;
                    if let Some(preview) = &matched.preview {
                        let preview_updater = self.updater_for(matched.source.clone(), preview.clone(), Arc::clone(&signer), &scoped);
                        preview_updater
                            .sign_and_update_destination(&caller.userid, &source_obj, None, None, true)
                            .await?;
                    }
                    ctx.queue_event(ReviewEvent::Requested {
                        request_info: request_info.clone(),
                        payload: serde_json::Value::Object(source_obj.clone()),
                        impacted_objects: impacted.clone(),
                        resource: resource_uri.clone(),
                        original_event: serde_json::Value::Null,
                    });
                }
                Effect::CancelReview => {
                    updater.update_source_status(&caller.userid, next_status, source_meta.status).await?;
                    ctx.queue_event(ReviewEvent::Rejected {
                        request_info: request_info.clone(),
                        payload: serde_json::Value::Object(source_obj.clone()),
                        impacted_objects: impacted.clone(),
                        resource: resource_uri.clone(),
                        original_event: serde_json::Value::Null,
                    });
                }
                Effect::MirrorAndSign => {
                    let result = updater
                        .sign_and_update_destination(&caller.userid, &source_obj, Some(next_status), source_meta.status, true)
                        .await?;
                    ctx.queue_event(ReviewEvent::Approved {
                        request_info: request_info.clone(),
                        payload: serde_json::Value::Object(source_obj.clone()),
                        impacted_objects: impacted.clone(),
                        resource: resource_uri.clone(),
                        original_event: serde_json::Value::Null,
                        changes_count: result.mirrored,
                    });
                }
                Effect::RefreshSignature => {
                    updater.refresh_signature(&caller.userid, &source_obj).await?;
                }
                Effect::RollbackAndSign => {
                    let changed = updater.rollback_changes().await?;
                    updater.refresh_signature(&caller.userid, &source_obj).await?;
                    if changed > 0 {
                        ctx.queue_event(ReviewEvent::Canceled {
                            request_info: request_info.clone(),
                            payload: serde_json::Value::Object(source_obj.clone()),
                            impacted_objects: impacted.clone(),
                            resource: resource_uri.clone(),
                            original_event: serde_json::Value::Null,
                            changes_count: changed,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// A source collection under `bucket`/`collection` was deleted: empty
    /// and re-sign its destination and (if configured) preview.
    ///
    /// # Errors
    /// Propagates storage/signer errors.
    pub async fn on_source_deleted(&self, bucket: &str, collection: &str) -> Result<(), EngineError> {
        let Some(matched) = self.resolve_resource(bucket, collection) else {
            return Ok(());
        };
        let scoped = self.resolved_settings(bucket, collection);
        let signer = self.select_signer(&matched.source.collection_uri(), &scoped)?;

        for target in [Some(&matched.destination), matched.preview.as_ref()].into_iter().flatten() {
            if self.storage.collection_exists(target).await? {
                self.storage.delete_all_records(target).await?;
            }
            let updater = self.updater_for(matched.source.clone(), target.clone(), Arc::clone(&signer), &scoped);
            updater
                .sign_and_update_destination(PLUGIN_PRINCIPAL, &JsonObject::new(), None, None, false)
                .await?;
        }
        Ok(())
    }

    /// The capability descriptor for the host's root endpoint: every
    /// configured resource, stripped of signer secrets, with its effective
    /// flags and group names. Bucket-wide resources report the
    /// `{collection_id}` placeholder literally, since no specific
    /// collection is involved.
    #[must_use]
    pub fn capability_descriptor(&self, description: impl Into<String>, url: impl Into<String>, version: impl Into<String>) -> CapabilityDescriptor {
        let resources = self
            .resources
            .iter()
            .map(|entry| {
                let (bucket, collection) = match &entry.source {
                    ResourceEndpoint::Collection(r) => (r.bucket.clone(), r.collection.clone()),
                    ResourceEndpoint::Bucket(b) => (b.clone(), "{collection_id}".to_string()),
                };
                let scoped = self.resolved_settings(&bucket, &collection);
                CapabilityResource {
                    source: entry.source.uri(),
                    preview: entry.preview.as_ref().map(ResourceEndpoint::uri),
                    destination: entry.destination.uri(),
                    to_review_enabled: scoped.to_review_enabled.unwrap_or(false),
                    group_check_enabled: scoped.group_check_enabled.unwrap_or(false),
                    editors_group: scoped.editors_group,
                    reviewers_group: scoped.reviewers_group,
                }
            })
            .collect();
        CapabilityDescriptor {
            description: description.into(),
            url: url.into(),
            version: version.into(),
            resources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signoff_config::parse_resource_map;
    use signoff_signer::LocalEcdsaSigner;
    use signoff_storage::InMemoryBackend;

    fn engine(backend: Arc<InMemoryBackend>, global: ScopedSettings) -> Engine {
        let resources = parse_resource_map("main-workspace/blocklist -> main/blocklist").unwrap();
        Engine::new(
            resources,
            global,
            ScopeOverlays::default(),
            backend.clone(),
            backend,
            Box::new(|_: &str| Ok(String::new())),
        )
    }

    fn review_settings() -> ScopedSettings {
        ScopedSettings {
            group_check_enabled: Some(true),
            to_review_enabled: Some(true),
            editors_group: Some("/buckets/main-workspace/groups/editors".to_string()),
            reviewers_group: Some("/buckets/main-workspace/groups/reviewers".to_string()),
            ..ScopedSettings::default()
        }
    }

    #[tokio::test]
    async fn resolves_collection_specific_resource() {
        let backend = Arc::new(InMemoryBackend::new());
        let eng = engine(backend, ScopedSettings::default());
        let matched = eng.resolve_resource("main-workspace", "blocklist").unwrap();
        assert_eq!(matched.destination, CollectionRef::new("main", "blocklist"));
    }

    #[tokio::test]
    async fn full_review_cycle_signs_destination() {
        let backend = Arc::new(InMemoryBackend::new());
        backend
            .create_collection(&CollectionRef::new("main-workspace", "blocklist"))
            .await
            .unwrap();
        let eng = engine(backend.clone(), review_settings());

        let editor = Caller::new("alice", ["/buckets/main-workspace/groups/editors".to_string()]);
        let reviewer = Caller::new("bob", ["/buckets/main-workspace/groups/reviewers".to_string()]);

        backend
            .upsert_record(
                &CollectionRef::new("main-workspace", "blocklist"),
                signoff_core::Record::new("1", 0, JsonObject::new()),
            )
            .await
            .unwrap();

        let mut ctx = EngineContext::new();
        eng.on_collection_changed(&mut ctx, "main-workspace", "blocklist", &editor, Status::ToReview)
            .await
            .unwrap();
        eng.on_collection_changed(&mut ctx, "main-workspace", "blocklist", &reviewer, Status::ToSign)
            .await
            .unwrap();

        let events = ctx.drain_on_commit();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ReviewEvent::Requested { .. }));
        assert!(matches!(events[1], ReviewEvent::Approved { changes_count: 1, .. }));

        let dest_obj = backend
            .collection_metadata(&CollectionRef::new("main", "blocklist"))
            .await
            .unwrap();
        assert!(dest_obj.contains_key("signature"));
    }

    #[tokio::test]
    async fn editor_cannot_approve_own_request() {
        let backend = Arc::new(InMemoryBackend::new());
        backend
            .create_collection(&CollectionRef::new("main-workspace", "blocklist"))
            .await
            .unwrap();
        let eng = engine(backend, review_settings());
        let editor = Caller::new("alice", ["/buckets/main-workspace/groups/editors".to_string(), "/buckets/main-workspace/groups/reviewers".to_string()]);

        let mut ctx = EngineContext::new();
        eng.on_collection_changed(&mut ctx, "main-workspace", "blocklist", &editor, Status::ToReview)
            .await
            .unwrap();
        let err = eng
            .on_collection_changed(&mut ctx, "main-workspace", "blocklist", &editor, Status::ToSign)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Rejected { .. }));
    }

    #[tokio::test]
    async fn record_changed_demotes_signed_source_to_wip() {
        let backend = Arc::new(InMemoryBackend::new());
        let source = CollectionRef::new("main-workspace", "blocklist");
        backend.create_collection(&source).await.unwrap();
        backend
            .set_collection_metadata(&source, serde_json::json!({"status": "signed"}).as_object().unwrap().clone())
            .await
            .unwrap();
        let eng = engine(backend.clone(), ScopedSettings::default());

        eng.on_record_changed("main-workspace", "blocklist", "alice").await.unwrap();

        let obj = backend.collection_metadata(&source).await.unwrap();
        let meta = SourceMetadata::from_object(&obj).unwrap();
        assert_eq!(meta.status, Some(Status::WorkInProgress));
    }

    #[tokio::test]
    async fn record_changed_from_plugin_principal_is_a_no_op() {
        let backend = Arc::new(InMemoryBackend::new());
        let source = CollectionRef::new("main-workspace", "blocklist");
        backend.create_collection(&source).await.unwrap();
        backend
            .set_collection_metadata(&source, serde_json::json!({"status": "signed"}).as_object().unwrap().clone())
            .await
            .unwrap();
        let eng = engine(backend.clone(), ScopedSettings::default());

        eng.on_record_changed("main-workspace", "blocklist", PLUGIN_PRINCIPAL).await.unwrap();

        let obj = backend.collection_metadata(&source).await.unwrap();
        let meta = SourceMetadata::from_object(&obj).unwrap();
        assert_eq!(meta.status, Some(Status::Signed));
    }

    #[tokio::test]
    async fn deleting_source_empties_and_resigns_destination() {
        let backend = Arc::new(InMemoryBackend::new());
        let source = CollectionRef::new("main-workspace", "blocklist");
        backend.create_collection(&source).await.unwrap();
        backend
            .upsert_record(&source, signoff_core::Record::new("1", 0, JsonObject::new()))
            .await
            .unwrap();
        let eng = engine(backend.clone(), ScopedSettings::default());

        let destination = CollectionRef::new("main", "blocklist");
        backend.create_collection(&destination).await.unwrap();
        backend
            .upsert_record(&destination, signoff_core::Record::new("1", 0, JsonObject::new()))
            .await
            .unwrap();

        eng.on_source_deleted("main-workspace", "blocklist").await.unwrap();

        let dest_obj = backend.collection_metadata(&destination).await.unwrap();
        assert!(dest_obj.contains_key("signature"));
        assert!(backend.all_records(&destination).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn capability_descriptor_lists_configured_resources() {
        let backend = Arc::new(InMemoryBackend::new());
        let eng = engine(backend, review_settings());
        let descriptor = eng.capability_descriptor("signoff", "https://example.test", "0.1.0");
        assert_eq!(descriptor.resources.len(), 1);
        assert!(descriptor.resources[0].group_check_enabled);
    }

    #[tokio::test]
    async fn missing_private_key_still_allows_verify_only_heartbeat() {
        // Sanity check that an empty-string key reader doesn't panic the
        // default local-ecdsa path construction during signer selection;
        // actual signing would fail, but that's covered by signoff-signer.
        let _ = LocalEcdsaSigner::generate_keypair();
    }
}
