use signoff_core::CollectionRef;
use signoff_storage::{Permission, Storage, StorageError};

/// The principal granted read access on every destination/preview
/// collection, matching the host's well-known "everyone" principal.
pub const EVERYONE_PRINCIPAL: &str = "system.Everyone";

/// Ensure a mirror collection (destination or preview) exists, owned by
/// `owner_principal`: `read: [Everyone]`, `write: [owner_principal]`
/// exactly, on both the bucket and the collection. Idempotent.
///
/// # Errors
/// Propagates storage/permission backend failures.
pub async fn ensure_mirror_collection(
    storage: &dyn Storage,
    permission: &dyn Permission,
    collection: &CollectionRef,
    owner_principal: &str,
) -> Result<(), StorageError> {
    if !storage.bucket_exists(&collection.bucket).await? {
        storage.create_bucket(&collection.bucket).await?;
    }
    permission
        .set_bucket_write(&collection.bucket, vec![owner_principal.to_string()])
        .await?;

    if !storage.collection_exists(collection).await? {
        storage.create_collection(collection).await?;
    }
    permission
        .set_collection_read(collection, vec![EVERYONE_PRINCIPAL.to_string()])
        .await?;
    permission
        .set_collection_write(collection, vec![owner_principal.to_string()])
        .await?;
    Ok(())
}

/// Ensure the source collection's `editors`/`reviewers` groups exist under
/// its bucket, with `caller` as the sole initial editor and the sole write
/// principal on both groups; grant both groups write on the source
/// collection. `{collection_id}` substitution is the caller's
/// responsibility (group names arrive already resolved).
///
/// # Errors
/// Propagates storage/permission backend failures.
pub async fn bootstrap_review_groups(
    permission: &dyn Permission,
    source: &CollectionRef,
    editors_group: &str,
    reviewers_group: &str,
    caller_principal: &str,
) -> Result<(), StorageError> {
    permission
        .ensure_group(&source.bucket, editors_group, vec![caller_principal.to_string()])
        .await?;
    permission
        .ensure_group(&source.bucket, reviewers_group, vec![])
        .await?;
    permission
        .set_group_write(&source.bucket, editors_group, vec![caller_principal.to_string()])
        .await?;
    permission
        .set_group_write(&source.bucket, reviewers_group, vec![caller_principal.to_string()])
        .await?;

    let editors_uri = format!("{}/groups/{editors_group}", source.bucket_uri());
    let reviewers_uri = format!("{}/groups/{reviewers_group}", source.bucket_uri());
    permission
        .set_collection_write(source, vec![editors_uri, reviewers_uri])
        .await?;
    Ok(())
}
