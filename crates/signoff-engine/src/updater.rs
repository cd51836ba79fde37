use std::sync::Arc;

use chrono::Utc;
use signoff_canonical::canonical_json;
use signoff_core::{CollectionRef, DestinationMetadata, JsonObject, PLUGIN_PRINCIPAL, Record, SourceMetadata, Status};
use signoff_signer::Signer;
use signoff_storage::{Permission, Storage};

use crate::cache::{CacheInvalidator, CacheSettings, NoopInvalidator};
use crate::error::EngineError;
use crate::lifecycle::ensure_mirror_collection;

fn now_iso8601() -> String {
    Utc::now().to_rfc3339()
}

/// Records mirrored and the destination state after a sign operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutcome {
    /// Number of source records copied over during mirroring (0 if
    /// `push_records` was false or nothing was pending).
    pub mirrored: u64,
    /// The destination's timestamp after signing.
    pub destination_timestamp: i64,
}

/// Mirrors records from a source collection to one destination (the
/// "destination" collection proper, or a preview — callers construct one
/// `Updater` per target), signs the result, and mutates source/destination
/// metadata.
pub struct Updater<'a> {
    source: CollectionRef,
    destination: CollectionRef,
    signer: Arc<dyn Signer>,
    storage: &'a dyn Storage,
    permission: &'a dyn Permission,
    cache: CacheSettings,
    cache_invalidator: Arc<dyn CacheInvalidator>,
}

impl<'a> Updater<'a> {
    /// Build an updater for one source/destination pair, with no cache
    /// invalidation hook beyond [`NoopInvalidator`].
    pub fn new(
        source: CollectionRef,
        destination: CollectionRef,
        signer: Arc<dyn Signer>,
        storage: &'a dyn Storage,
        permission: &'a dyn Permission,
        cache: CacheSettings,
    ) -> Self {
        Self::with_cache_invalidator(source, destination, signer, storage, permission, cache, Arc::new(NoopInvalidator))
    }

    /// Build an updater with an explicit [`CacheInvalidator`] hook.
    pub fn with_cache_invalidator(
        source: CollectionRef,
        destination: CollectionRef,
        signer: Arc<dyn Signer>,
        storage: &'a dyn Storage,
        permission: &'a dyn Permission,
        cache: CacheSettings,
        cache_invalidator: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            source,
            destination,
            signer,
            storage,
            permission,
            cache,
            cache_invalidator,
        }
    }

    /// The source this updater mirrors from.
    #[must_use]
    pub fn source(&self) -> &CollectionRef {
        &self.source
    }

    /// The destination this updater mirrors into.
    #[must_use]
    pub fn destination(&self) -> &CollectionRef {
        &self.destination
    }

    /// Mirror pending changes from source to destination.
    ///
    /// Reads the destination's timestamp `t_d`, then every source record
    /// (including tombstones) with `last_modified > t_d`, applying deletes
    /// and upserts in ascending `last_modified` order.
    ///
    /// # Errors
    /// Returns [`EngineError::StorageSkew`] if the source collection's
    /// timestamp is behind the destination's — a backend clock-skew
    /// condition that must not be silently mirrored over.
    pub async fn mirror_records(&self) -> Result<u64, EngineError> {
        let t_d = self.storage.collection_timestamp(&self.destination).await?;
        let t_s = self.storage.collection_timestamp(&self.source).await?;
        if t_s < t_d {
            return Err(EngineError::StorageSkew(t_s, t_d));
        }

        let pending = self.storage.records_since(&self.source, t_d).await?;
        let mut changed = 0u64;
        for record in pending {
            let Some(id) = record.id() else { continue };
            if record.is_deleted() {
                self.storage.delete_record(&self.destination, id).await?;
            } else {
                self.storage.upsert_record(&self.destination, record).await?;
            }
            changed += 1;
        }
        Ok(changed)
    }

    async fn sign_destination(&self, source_attrs: &JsonObject) -> Result<SignOutcome, EngineError> {
        ensure_mirror_collection(self.storage, self.permission, &self.destination, PLUGIN_PRINCIPAL).await?;

        let records = self.storage.all_records(&self.destination).await?;
        let timestamp = self.storage.collection_timestamp(&self.destination).await?;
        let bytes = canonical_json(records, timestamp);
        let mut bundle = self.signer.sign(bytes.as_bytes())?;
        bundle.merge_ui_hints_from(source_attrs);

        let dest_obj = self.storage.collection_metadata(&self.destination).await?;
        let mut dest_meta = DestinationMetadata::from_object(&dest_obj);
        dest_meta.signature = Some(bundle);
        self.storage
            .set_collection_metadata(&self.destination, dest_meta.to_object())
            .await?;

        self.cache.invalidate_with(self.cache_invalidator.as_ref());

        Ok(SignOutcome {
            mirrored: 0,
            destination_timestamp: timestamp,
        })
    }

    /// Mirror (if `push_records`), sign, and optionally move the source to
    /// `next_source_status`, stamping the tracking fields that status
    /// implies.
    ///
    /// # Errors
    /// Propagates mirroring, signing, and storage errors.
    pub async fn sign_and_update_destination(
        &self,
        caller: &str,
        source_attrs: &JsonObject,
        next_source_status: Option<Status>,
        old_source_status: Option<Status>,
        push_records: bool,
    ) -> Result<SignOutcome, EngineError> {
        if push_records {
            ensure_mirror_collection(self.storage, self.permission, &self.destination, PLUGIN_PRINCIPAL).await?;
        }
        let mirrored = if push_records { self.mirror_records().await? } else { 0 };
        let mut outcome = self.sign_destination(source_attrs).await?;
        outcome.mirrored = mirrored;

        if let Some(status) = next_source_status {
            self.update_source_status(caller, status, old_source_status).await?;
        }
        Ok(outcome)
    }

    /// Re-sign the destination without mirroring. `last_signature_{by,date}`
    /// are stamped; review-tracking fields are untouched (the source was
    /// already `signed`).
    ///
    /// # Errors
    /// Propagates signing and storage errors.
    pub async fn refresh_signature(&self, caller: &str, source_attrs: &JsonObject) -> Result<SignOutcome, EngineError> {
        let outcome = self.sign_destination(source_attrs).await?;
        self.update_source_status(caller, Status::Signed, Some(Status::Signed)).await?;
        Ok(outcome)
    }

    /// Replace the source record set with a copy of the destination's.
    /// Returns the number of records that were actually different (added,
    /// removed, or changed) — if zero, the caller must not emit a
    /// cancellation event.
    ///
    /// # Errors
    /// Propagates storage errors.
    pub async fn rollback_changes(&self) -> Result<u64, EngineError> {
        let before = self.storage.all_records(&self.source).await?;
        let dest_records = self.storage.all_records(&self.destination).await?;

        let before_by_id: std::collections::HashMap<&str, JsonObject> = before
            .iter()
            .filter_map(|r| r.id().map(|id| (id, content_sans_timestamp(r))))
            .collect();
        let dest_by_id: std::collections::HashMap<&str, JsonObject> = dest_records
            .iter()
            .filter_map(|r| r.id().map(|id| (id, content_sans_timestamp(r))))
            .collect();

        let mut changed = 0u64;
        for (id, content) in &dest_by_id {
            if before_by_id.get(id) != Some(content) {
                changed += 1;
            }
        }
        for id in before_by_id.keys() {
            if !dest_by_id.contains_key(id) {
                changed += 1;
            }
        }

        self.storage.delete_all_records(&self.source).await?;
        for record in dest_records {
            self.storage.upsert_record(&self.source, record).await?;
        }
        Ok(changed)
    }

    /// Mutate the source collection's status, stamping tracking fields per
    /// the target status. A no-op if the resulting record would not differ
    /// from what's stored.
    ///
    /// # Errors
    /// Propagates storage errors.
    pub async fn update_source_status(
        &self,
        caller: &str,
        status: Status,
        old_status: Option<Status>,
    ) -> Result<(), EngineError> {
        let obj = self.storage.collection_metadata(&self.source).await?;
        let mut meta = SourceMetadata::from_object(&obj).unwrap_or_default();
        let now = now_iso8601();

        match status {
            Status::WorkInProgress => {
                meta.tracking.last_edit_by = Some(caller.to_string());
                meta.tracking.last_edit_date = Some(now);
            }
            Status::ToReview => {
                meta.tracking.last_review_request_by = Some(caller.to_string());
                meta.tracking.last_review_request_date = Some(now);
            }
            Status::Signed => {
                if old_status != Some(Status::Signed) {
                    meta.tracking.last_review_by = Some(caller.to_string());
                    meta.tracking.last_review_date = Some(now.clone());
                }
                meta.tracking.last_signature_by = Some(caller.to_string());
                meta.tracking.last_signature_date = Some(now);
            }
            // Never stored directly: policy always resolves a requested
            // to-sign/to-refresh/to-rollback into a next_status of Signed.
            Status::ToSign | Status::ToRefresh | Status::ToRollback => {}
        }
        meta.status = Some(status);

        let new_obj = meta.to_object();
        if new_obj != obj {
            self.storage.set_collection_metadata(&self.source, new_obj).await?;
        }
        Ok(())
    }
}

fn content_sans_timestamp(record: &Record) -> JsonObject {
    let mut obj = record.as_object().clone();
    obj.remove("last_modified");
    obj
}
