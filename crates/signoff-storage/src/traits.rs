use async_trait::async_trait;
use signoff_core::{CollectionRef, JsonObject, Record};

use crate::StorageError;

/// Record and collection storage operations the engine needs from the host.
///
/// Mirrors the host's generic `get`/`create`/`update`/`delete`/`get_all`/
/// `collection_timestamp`/`delete_all` object store, specialized to the two
/// kinds of object this engine actually touches (collections and their
/// records) so callers get typed signatures instead of `(kind, parent, id)`
/// tuples.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Whether `bucket` exists.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError>;
    /// Create an empty bucket. A no-op if it already exists.
    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    /// Whether `collection` exists.
    async fn collection_exists(&self, collection: &CollectionRef) -> Result<bool, StorageError>;
    /// Create an empty collection (and its bucket, if missing).
    async fn create_collection(&self, collection: &CollectionRef) -> Result<(), StorageError>;
    /// Delete a collection and all of its records.
    async fn delete_collection(&self, collection: &CollectionRef) -> Result<(), StorageError>;

    /// Read a collection's metadata object.
    async fn collection_metadata(&self, collection: &CollectionRef) -> Result<JsonObject, StorageError>;
    /// Replace a collection's metadata object.
    async fn set_collection_metadata(
        &self,
        collection: &CollectionRef,
        metadata: JsonObject,
    ) -> Result<(), StorageError>;

    /// The collection's current timestamp (the `last_modified` of its most
    /// recently changed record, or of the collection metadata itself).
    async fn collection_timestamp(&self, collection: &CollectionRef) -> Result<i64, StorageError>;

    /// Records (including tombstones) with `last_modified > since`, sorted
    /// ascending by `last_modified`.
    async fn records_since(&self, collection: &CollectionRef, since: i64) -> Result<Vec<Record>, StorageError>;
    /// All non-deleted records in the collection.
    async fn all_records(&self, collection: &CollectionRef) -> Result<Vec<Record>, StorageError>;

    /// Create the record if absent, else update it in place. Returns the
    /// stored record (with a freshly stamped `last_modified`).
    async fn upsert_record(&self, collection: &CollectionRef, record: Record) -> Result<Record, StorageError>;
    /// Delete a record by id, writing a tombstone. Deleting an id that does
    /// not exist is treated as success (`Ok(())`), per the mirroring
    /// contract's `NotFound`-is-success rule.
    async fn delete_record(&self, collection: &CollectionRef, id: &str) -> Result<(), StorageError>;
    /// Delete every record in the collection (tombstoning each). Returns the
    /// number of records that were actually live (and thus changed).
    async fn delete_all_records(&self, collection: &CollectionRef) -> Result<u64, StorageError>;
}

/// Principal/permission operations the engine needs from the host.
///
/// Mirrors the host's generic `replace_object_permissions`/
/// `add_principal_to_ace`/`check_permission` interface, specialized to
/// buckets, collections, and groups.
#[async_trait]
pub trait Permission: Send + Sync {
    /// Set the write principals on a bucket (replacing any existing ones).
    async fn set_bucket_write(&self, bucket: &str, principals: Vec<String>) -> Result<(), StorageError>;
    /// Set the read principals on a collection (replacing any existing ones).
    async fn set_collection_read(
        &self,
        collection: &CollectionRef,
        principals: Vec<String>,
    ) -> Result<(), StorageError>;
    /// Set the write principals on a collection (replacing any existing ones).
    async fn set_collection_write(
        &self,
        collection: &CollectionRef,
        principals: Vec<String>,
    ) -> Result<(), StorageError>;

    /// Ensure a group exists under `bucket` with exactly these members,
    /// creating it if absent.
    async fn ensure_group(&self, bucket: &str, group: &str, members: Vec<String>) -> Result<(), StorageError>;
    /// The current members of a group, or `NotFound` if it does not exist.
    async fn group_members(&self, bucket: &str, group: &str) -> Result<Vec<String>, StorageError>;
    /// Set the write principals on a group (replacing any existing ones).
    async fn set_group_write(&self, bucket: &str, group: &str, principals: Vec<String>) -> Result<(), StorageError>;
}
