use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use signoff_core::{CollectionRef, JsonObject, Record};

use crate::{Permission, Storage, StorageError};

struct CollectionState {
    metadata: JsonObject,
    records: BTreeMap<String, Record>,
    groups: HashMap<String, HashSet<String>>,
    read_principals: HashSet<String>,
    write_principals: HashSet<String>,
}

impl CollectionState {
    fn new() -> Self {
        Self {
            metadata: JsonObject::new(),
            records: BTreeMap::new(),
            groups: HashMap::new(),
            read_principals: HashSet::new(),
            write_principals: HashSet::new(),
        }
    }

    fn timestamp(&self) -> i64 {
        self.records
            .values()
            .filter_map(Record::last_modified)
            .max()
            .unwrap_or(0)
    }
}

struct State {
    buckets: HashMap<String, HashSet<String>>,
    collections: HashMap<String, CollectionState>,
}

/// An in-memory [`Storage`]/[`Permission`] backend for tests and the demo
/// binary. Not durable; every write lives only for the process lifetime.
pub struct InMemoryBackend {
    state: Mutex<State>,
    clock: AtomicI64,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Build an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                buckets: HashMap::new(),
                collections: HashMap::new(),
            }),
            clock: AtomicI64::new(1),
        }
    }

    fn tick(&self) -> i64 {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }
}

fn not_found(what: impl Into<String>) -> StorageError {
    StorageError::NotFound(what.into())
}

#[async_trait]
impl Storage for InMemoryBackend {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        Ok(self.state.lock().unwrap().buckets.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.state
            .lock()
            .unwrap()
            .buckets
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }

    async fn collection_exists(&self, collection: &CollectionRef) -> Result<bool, StorageError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .collections
            .contains_key(&collection.collection_uri()))
    }

    async fn create_collection(&self, collection: &CollectionRef) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state
            .buckets
            .entry(collection.bucket.clone())
            .or_default()
            .insert(collection.collection.clone());
        state
            .collections
            .entry(collection.collection_uri())
            .or_insert_with(CollectionState::new);
        Ok(())
    }

    async fn delete_collection(&self, collection: &CollectionRef) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state.collections.remove(&collection.collection_uri());
        Ok(())
    }

    async fn collection_metadata(&self, collection: &CollectionRef) -> Result<JsonObject, StorageError> {
        let state = self.state.lock().unwrap();
        state
            .collections
            .get(&collection.collection_uri())
            .map(|c| c.metadata.clone())
            .ok_or_else(|| not_found(collection.collection_uri()))
    }

    async fn set_collection_metadata(
        &self,
        collection: &CollectionRef,
        metadata: JsonObject,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .collections
            .get_mut(&collection.collection_uri())
            .ok_or_else(|| not_found(collection.collection_uri()))?;
        entry.metadata = metadata;
        Ok(())
    }

    async fn collection_timestamp(&self, collection: &CollectionRef) -> Result<i64, StorageError> {
        let state = self.state.lock().unwrap();
        state
            .collections
            .get(&collection.collection_uri())
            .map(CollectionState::timestamp)
            .ok_or_else(|| not_found(collection.collection_uri()))
    }

    async fn records_since(&self, collection: &CollectionRef, since: i64) -> Result<Vec<Record>, StorageError> {
        let state = self.state.lock().unwrap();
        let entry = state
            .collections
            .get(&collection.collection_uri())
            .ok_or_else(|| not_found(collection.collection_uri()))?;
        let mut records: Vec<Record> = entry
            .records
            .values()
            .filter(|r| r.last_modified().unwrap_or(0) > since)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.last_modified().unwrap_or(0));
        Ok(records)
    }

    async fn all_records(&self, collection: &CollectionRef) -> Result<Vec<Record>, StorageError> {
        let state = self.state.lock().unwrap();
        let entry = state
            .collections
            .get(&collection.collection_uri())
            .ok_or_else(|| not_found(collection.collection_uri()))?;
        Ok(entry.records.values().filter(|r| !r.is_deleted()).cloned().collect())
    }

    async fn upsert_record(&self, collection: &CollectionRef, mut record: Record) -> Result<Record, StorageError> {
        let id = record
            .id()
            .ok_or_else(|| StorageError::Backend("record has no id".to_string()))?
            .to_string();
        let ts = self.tick();
        record.0.insert(
            "last_modified".to_string(),
            serde_json::Value::Number(ts.into()),
        );
        let mut state = self.state.lock().unwrap();
        let entry = state
            .collections
            .get_mut(&collection.collection_uri())
            .ok_or_else(|| not_found(collection.collection_uri()))?;
        entry.records.insert(id, record.clone());
        Ok(record)
    }

    async fn delete_record(&self, collection: &CollectionRef, id: &str) -> Result<(), StorageError> {
        let ts = self.tick();
        let mut state = self.state.lock().unwrap();
        let entry = state
            .collections
            .get_mut(&collection.collection_uri())
            .ok_or_else(|| not_found(collection.collection_uri()))?;
        entry.records.insert(id.to_string(), Record::tombstone(id, ts));
        Ok(())
    }

    async fn delete_all_records(&self, collection: &CollectionRef) -> Result<u64, StorageError> {
        let live_ids: Vec<String> = {
            let state = self.state.lock().unwrap();
            let entry = state
                .collections
                .get(&collection.collection_uri())
                .ok_or_else(|| not_found(collection.collection_uri()))?;
            entry
                .records
                .iter()
                .filter(|(_, r)| !r.is_deleted())
                .map(|(id, _)| id.clone())
                .collect()
        };
        let changed = live_ids.len() as u64;
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.collections.get_mut(&collection.collection_uri()) {
            for id in live_ids {
                let ts = self.clock.fetch_add(1, Ordering::SeqCst);
                entry.records.insert(id.clone(), Record::tombstone(&id, ts));
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl Permission for InMemoryBackend {
    async fn set_bucket_write(&self, bucket: &str, principals: Vec<String>) -> Result<(), StorageError> {
        self.state
            .lock()
            .unwrap()
            .buckets
            .entry(bucket.to_string())
            .or_default();
        // Bucket-level write principals are tracked alongside the bucket's
        // collection set via a synthetic empty-collection entry keyed by the
        // bucket URI, mirroring how collection permissions are stored.
        let mut state = self.state.lock().unwrap();
        let entry = state
            .collections
            .entry(format!("/buckets/{bucket}"))
            .or_insert_with(CollectionState::new);
        entry.write_principals = principals.into_iter().collect();
        Ok(())
    }

    async fn set_collection_read(
        &self,
        collection: &CollectionRef,
        principals: Vec<String>,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .collections
            .get_mut(&collection.collection_uri())
            .ok_or_else(|| not_found(collection.collection_uri()))?;
        entry.read_principals = principals.into_iter().collect();
        Ok(())
    }

    async fn set_collection_write(
        &self,
        collection: &CollectionRef,
        principals: Vec<String>,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .collections
            .get_mut(&collection.collection_uri())
            .ok_or_else(|| not_found(collection.collection_uri()))?;
        entry.write_principals = principals.into_iter().collect();
        Ok(())
    }

    async fn ensure_group(&self, bucket: &str, group: &str, members: Vec<String>) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state
            .buckets
            .entry(bucket.to_string())
            .or_default();
        let entry = state
            .collections
            .entry(format!("/buckets/{bucket}"))
            .or_insert_with(CollectionState::new);
        entry
            .groups
            .entry(group.to_string())
            .or_default()
            .extend(members);
        Ok(())
    }

    async fn group_members(&self, bucket: &str, group: &str) -> Result<Vec<String>, StorageError> {
        let state = self.state.lock().unwrap();
        let entry = state
            .collections
            .get(&format!("/buckets/{bucket}"))
            .ok_or_else(|| not_found(format!("/buckets/{bucket}/groups/{group}")))?;
        entry
            .groups
            .get(group)
            .map(|members| members.iter().cloned().collect())
            .ok_or_else(|| not_found(format!("/buckets/{bucket}/groups/{group}")))
    }

    async fn set_group_write(&self, bucket: &str, group: &str, principals: Vec<String>) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .collections
            .entry(format!("/buckets/{bucket}"))
            .or_insert_with(CollectionState::new);
        entry.groups.entry(group.to_string()).or_default();
        entry.write_principals = principals.into_iter().collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection() -> CollectionRef {
        CollectionRef::new("main", "blocklist")
    }

    #[tokio::test]
    async fn create_then_exists() {
        let backend = InMemoryBackend::new();
        assert!(!backend.collection_exists(&collection()).await.unwrap());
        backend.create_collection(&collection()).await.unwrap();
        assert!(backend.collection_exists(&collection()).await.unwrap());
        assert!(backend.bucket_exists("main").await.unwrap());
    }

    #[tokio::test]
    async fn upsert_and_read_back() {
        let backend = InMemoryBackend::new();
        backend.create_collection(&collection()).await.unwrap();
        let record = Record::new("1", 0, json!({"value": "x"}).as_object().unwrap().clone());
        backend.upsert_record(&collection(), record).await.unwrap();
        let all = backend.all_records(&collection()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id(), Some("1"));
    }

    #[tokio::test]
    async fn delete_missing_record_is_success() {
        let backend = InMemoryBackend::new();
        backend.create_collection(&collection()).await.unwrap();
        backend.delete_record(&collection(), "nonexistent").await.unwrap();
    }

    #[tokio::test]
    async fn records_since_filters_by_timestamp() {
        let backend = InMemoryBackend::new();
        backend.create_collection(&collection()).await.unwrap();
        let r1 = backend
            .upsert_record(&collection(), Record::new("1", 0, JsonObject::new()))
            .await
            .unwrap();
        let since = r1.last_modified().unwrap();
        backend
            .upsert_record(&collection(), Record::new("2", 0, JsonObject::new()))
            .await
            .unwrap();
        let changed = backend.records_since(&collection(), since).await.unwrap();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].id(), Some("2"));
    }

    #[tokio::test]
    async fn delete_all_tombstones_live_records_only() {
        let backend = InMemoryBackend::new();
        backend.create_collection(&collection()).await.unwrap();
        backend
            .upsert_record(&collection(), Record::new("1", 0, JsonObject::new()))
            .await
            .unwrap();
        backend
            .upsert_record(&collection(), Record::new("2", 0, JsonObject::new()))
            .await
            .unwrap();
        let changed = backend.delete_all_records(&collection()).await.unwrap();
        assert_eq!(changed, 2);
        assert!(backend.all_records(&collection()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_membership_round_trips() {
        let backend = InMemoryBackend::new();
        backend
            .ensure_group("main", "editors", vec!["alice".to_string()])
            .await
            .unwrap();
        let members = backend.group_members("main", "editors").await.unwrap();
        assert_eq!(members, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn missing_group_is_not_found() {
        let backend = InMemoryBackend::new();
        let err = backend.group_members("main", "editors").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
