//! In-memory stores for testing and development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{ShelfError, ShelfResult};
use crate::query::{FilterSpec, Predicate, SortDirection, SortField};
use crate::store::{BlobStore, MetadataStore, PutResult};
use crate::types::{BlobKey, FileId, FileRecord, NewFileRecord, RecordPatch};

/// In-memory blob store: a map of key to bytes
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<BlobKey, Bytes>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently held
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &BlobKey, bytes: Bytes) -> ShelfResult<PutResult> {
        let size_bytes = bytes.len() as u64;
        self.blobs.write().insert(key.clone(), bytes);
        Ok(PutResult { size_bytes })
    }

    async fn get(&self, key: &BlobKey) -> ShelfResult<Bytes> {
        self.blobs
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ShelfError::blob_not_found(key.as_str()))
    }

    async fn exists(&self, key: &BlobKey) -> ShelfResult<bool> {
        Ok(self.blobs.read().contains_key(key))
    }

    async fn delete(&self, key: &BlobKey) -> ShelfResult<()> {
        // Idempotent: removing a missing key succeeds
        self.blobs.write().remove(key);
        Ok(())
    }
}

/// In-memory metadata store with full filter-spec query semantics
#[derive(Clone, Default)]
pub struct MemoryMetadataStore {
    records: Arc<RwLock<HashMap<FileId, FileRecord>>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert(&self, record: NewFileRecord) -> ShelfResult<FileRecord> {
        let now = Utc::now();
        let committed = FileRecord {
            id: FileId::new(),
            blob_key: record.blob_key,
            name: record.name,
            extension: record.extension,
            kind: record.kind,
            size_bytes: record.size_bytes,
            owner_id: record.owner_id,
            account_id: record.account_id,
            shared_with: record.shared_with,
            created_at: now,
            updated_at: now,
        };
        self.records
            .write()
            .insert(committed.id.clone(), committed.clone());
        Ok(committed)
    }

    async fn get(&self, id: &FileId) -> ShelfResult<FileRecord> {
        self.records
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ShelfError::record_not_found(id.as_str()))
    }

    async fn query(&self, spec: &FilterSpec) -> ShelfResult<Vec<FileRecord>> {
        let records = self.records.read();
        let mut matches: Vec<FileRecord> = records
            .values()
            .filter(|record| spec.predicates.iter().all(|p| matches_predicate(record, p)))
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            let ordering = match spec.sort.field {
                SortField::Name => a.name.cmp(&b.name),
                SortField::Size => a.size_bytes.cmp(&b.size_bytes),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            };
            match spec.sort.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });

        if let Some(limit) = spec.limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    async fn update(&self, id: &FileId, patch: RecordPatch) -> ShelfResult<FileRecord> {
        let mut records = self.records.write();
        let record = records
            .get_mut(id)
            .ok_or_else(|| ShelfError::record_not_found(id.as_str()))?;

        match patch {
            RecordPatch::Rename { name, extension } => {
                record.name = name;
                record.extension = extension;
            }
            RecordPatch::SharedWith(emails) => {
                record.shared_with = emails;
            }
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete(&self, id: &FileId) -> ShelfResult<()> {
        self.records
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ShelfError::record_not_found(id.as_str()))
    }
}

fn matches_predicate(record: &FileRecord, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::OwnedByOrSharedWith { owner_id, email } => {
            &record.owner_id == owner_id || record.shared_with.contains(email)
        }
        Predicate::OwnerIs(owner_id) => &record.owner_id == owner_id,
        Predicate::KindIn(kinds) => kinds.contains(&record.kind),
        Predicate::NameContains(needle) => record.name.contains(needle.as_str()),
    }
}
