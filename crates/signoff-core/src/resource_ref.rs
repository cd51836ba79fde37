use std::fmt;

/// Identifies a bucket/collection pair, the unit the engine mirrors
/// between source, preview, and destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionRef {
    /// Bucket id, e.g. `main-workspace`.
    pub bucket: String,
    /// Collection id, e.g. `blocklist`.
    pub collection: String,
}

impl CollectionRef {
    /// Build a reference from a bucket id and a collection id.
    #[must_use]
    pub fn new(bucket: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            collection: collection.into(),
        }
    }

    /// The bucket's resource URI, e.g. `/buckets/main-workspace`.
    #[must_use]
    pub fn bucket_uri(&self) -> String {
        format!("/buckets/{}", self.bucket)
    }

    /// The collection's resource URI, e.g. `/buckets/main-workspace/collections/blocklist`.
    #[must_use]
    pub fn collection_uri(&self) -> String {
        format!("/buckets/{}/collections/{}", self.bucket, self.collection)
    }

    /// The records resource URI, e.g. `/buckets/main-workspace/collections/blocklist/records`.
    #[must_use]
    pub fn records_uri(&self) -> String {
        format!("{}/records", self.collection_uri())
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.collection_uri())
    }
}
