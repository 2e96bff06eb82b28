use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Datelike, Utc};
use uuid::Uuid;

use crate::error::ShelfResult;
use crate::query::FilterSpec;
use crate::types::{BlobKey, FileId, FileRecord, NewFileRecord, RecordPatch};

/// Object-storage capability - holds raw file bytes addressed by opaque keys.
///
/// Implementations wrap whatever backend the deployment uses (S3-compatible
/// stores, local disk, the in-memory backend in tests). The adapter and the
/// upload coordinator only ever see this trait, so privilege separation is a
/// construction-time concern: hand them a handle built with the credentials
/// that concern needs, never a shared client with a privilege flag.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `key`, overwriting any previous content
    async fn put(&self, key: &BlobKey, bytes: Bytes) -> ShelfResult<PutResult>;

    /// Fetch the bytes stored under `key`
    async fn get(&self, key: &BlobKey) -> ShelfResult<Bytes>;

    /// Check whether `key` holds a blob
    async fn exists(&self, key: &BlobKey) -> ShelfResult<bool>;

    /// Delete the blob under `key`.
    ///
    /// Idempotent: deleting a missing key is not an error.
    async fn delete(&self, key: &BlobKey) -> ShelfResult<()>;
}

/// Result of a successful put operation
#[derive(Debug, Clone)]
pub struct PutResult {
    pub size_bytes: u64,
}

/// Document-database capability - holds the structured [`FileRecord`]s
/// describing stored files.
///
/// `insert` is assumed atomic: a record is either fully committed (with
/// store-assigned id and timestamps) or absent. No partially-written record
/// is ever observable through `query`.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Commit a new record, assigning its id and timestamps
    async fn insert(&self, record: NewFileRecord) -> ShelfResult<FileRecord>;

    /// Fetch a single record by id
    async fn get(&self, id: &FileId) -> ShelfResult<FileRecord>;

    /// Return the records matching `spec`, sorted and truncated per its
    /// sort/limit fields
    async fn query(&self, spec: &FilterSpec) -> ShelfResult<Vec<FileRecord>>;

    /// Apply a patch to an existing record, bumping `updated_at`
    async fn update(&self, id: &FileId, patch: RecordPatch) -> ShelfResult<FileRecord>;

    /// Remove a record
    async fn delete(&self, id: &FileId) -> ShelfResult<()>;
}

/// Strategy for generating blob keys for new uploads
pub trait BlobKeyStrategy: Send + Sync {
    /// Generate a fresh, unique key for a blob owned by `account_id`
    fn object_key(&self, account_id: &str) -> BlobKey;
}

/// Default key strategy: `account/year/month/uuid`
#[derive(Debug, Clone)]
pub struct DefaultKeyStrategy;

impl BlobKeyStrategy for DefaultKeyStrategy {
    fn object_key(&self, account_id: &str) -> BlobKey {
        let now = Utc::now();
        BlobKey::from_string(format!(
            "{}/{:04}/{:02}/{}",
            account_id,
            now.year(),
            now.month(),
            Uuid::new_v4()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keys_are_account_scoped_and_unique() {
        let keys = DefaultKeyStrategy;
        let a = keys.object_key("acct-1");
        let b = keys.object_key("acct-1");

        assert!(a.as_str().starts_with("acct-1/"));
        assert_ne!(a, b);
    }
}
