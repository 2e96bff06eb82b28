use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use tracing::warn;

use crate::classify::classify;
use crate::config::ShelfConfig;
use crate::error::{OrphanedBlobWarning, ShelfError, ShelfResult};
use crate::query::FileQuery;
use crate::saga::{UploadCoordinator, UploadError};
use crate::store::{BlobKeyStrategy, BlobStore, DefaultKeyStrategy, MetadataStore};
use crate::types::{FileId, FileRecord, RecordPatch, ShelfCtx};
use crate::usage::{summarize_with_capacity, UsageSummary};

/// The main shelf adapter - the object a request-handling layer embeds.
///
/// Wraps the two store capabilities behind the file lifecycle: upload
/// (through the saga coordinator), open, rename, share, delete, list, and
/// usage. Stateless apart from the injected handles; safe to share across
/// concurrent requests.
pub struct ShelfAdapter {
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    uploads: UploadCoordinator,
    config: ShelfConfig,
}

/// A record together with its blob bytes, as returned by [`ShelfAdapter::open`]
pub struct OpenedFile {
    pub record: FileRecord,
    pub bytes: Bytes,
}

/// Outcome of a delete.
///
/// The record is always gone when this is returned. `orphan` reports a blob
/// the store refused to delete afterwards - surfaced, logged, never retried.
#[derive(Debug)]
pub struct DeleteReceipt {
    pub record: FileRecord,
    pub orphan: Option<OrphanedBlobWarning>,
}

impl ShelfAdapter {
    /// Create a new adapter with the default key strategy
    pub fn new<B, M>(blobs: B, metadata: M, config: ShelfConfig) -> Self
    where
        B: BlobStore + 'static,
        M: MetadataStore + 'static,
    {
        Self::with_key_strategy(blobs, metadata, DefaultKeyStrategy, config)
    }

    /// Create with a custom blob key strategy
    pub fn with_key_strategy<B, M, K>(blobs: B, metadata: M, keys: K, config: ShelfConfig) -> Self
    where
        B: BlobStore + 'static,
        M: MetadataStore + 'static,
        K: BlobKeyStrategy + 'static,
    {
        let blobs: Arc<dyn BlobStore> = Arc::new(blobs);
        let metadata: Arc<dyn MetadataStore> = Arc::new(metadata);
        let keys: Arc<dyn BlobKeyStrategy> = Arc::new(keys);
        let uploads = UploadCoordinator::from_handles(blobs.clone(), metadata.clone(), keys);
        Self {
            blobs,
            metadata,
            uploads,
            config,
        }
    }

    /// Upload a file through the saga coordinator.
    ///
    /// Returns either a fully committed record, immediately visible to
    /// [`list`](Self::list), or an [`UploadError`] - there is no observable
    /// half-uploaded state.
    pub async fn upload(
        &self,
        ctx: &ShelfCtx,
        name: &str,
        bytes: Bytes,
    ) -> Result<FileRecord, UploadError> {
        self.uploads.upload(ctx, name, bytes).await
    }

    /// Fetch a record and its bytes. Allowed for the owner and for anyone
    /// the record is shared with.
    pub async fn open(&self, ctx: &ShelfCtx, id: &FileId) -> ShelfResult<OpenedFile> {
        let record = self.metadata.get(id).await?;
        if record.owner_id != ctx.user_id && !record.shared_with.contains(&ctx.email) {
            return Err(ShelfError::forbidden(id.as_str()));
        }
        let bytes = self.blobs.get(&record.blob_key).await?;
        Ok(OpenedFile { record, bytes })
    }

    /// Rename a file. Owner only.
    ///
    /// The extension is re-derived from the new name; the kind the file was
    /// classified into at upload time is deliberately left unchanged.
    pub async fn rename(
        &self,
        ctx: &ShelfCtx,
        id: &FileId,
        new_name: &str,
    ) -> ShelfResult<FileRecord> {
        if new_name.is_empty() || new_name.contains('/') || new_name.contains('\\') {
            return Err(ShelfError::invalid("invalid file name"));
        }
        self.fetch_owned(ctx, id).await?;
        let (_, extension) = classify(new_name);
        self.metadata
            .update(
                id,
                RecordPatch::Rename {
                    name: new_name.to_string(),
                    extension,
                },
            )
            .await
    }

    /// Replace a file's share list. Owner only.
    pub async fn set_shared_with(
        &self,
        ctx: &ShelfCtx,
        id: &FileId,
        emails: BTreeSet<String>,
    ) -> ShelfResult<FileRecord> {
        self.fetch_owned(ctx, id).await?;
        self.metadata
            .update(id, RecordPatch::SharedWith(emails))
            .await
    }

    /// Delete a file. Owner only.
    ///
    /// The metadata record is removed first, then the blob: the worst case
    /// is a leaked blob reported in the receipt, never a surviving record
    /// that references missing bytes.
    pub async fn delete(&self, ctx: &ShelfCtx, id: &FileId) -> ShelfResult<DeleteReceipt> {
        let record = self.fetch_owned(ctx, id).await?;
        self.metadata.delete(id).await?;

        let orphan = match self.blobs.delete(&record.blob_key).await {
            Ok(()) => None,
            Err(delete_error) => {
                let warning = OrphanedBlobWarning {
                    key: record.blob_key.clone(),
                    delete_error,
                };
                warn!(%warning, record_id = %id, "blob delete failed after record removal");
                Some(warning)
            }
        };

        Ok(DeleteReceipt { record, orphan })
    }

    /// List files visible to the caller: owned, or shared with their email.
    pub async fn list(&self, ctx: &ShelfCtx, query: FileQuery) -> ShelfResult<Vec<FileRecord>> {
        let mut spec = query.build(ctx);
        if spec.limit.is_none() {
            spec.limit = self.config.default_list_limit;
        }
        self.metadata.query(&spec).await
    }

    /// Usage summary over the files the caller owns.
    ///
    /// Shared files never count against the recipient's capacity, so the
    /// query is narrowed to owned records.
    pub async fn usage(&self, ctx: &ShelfCtx) -> ShelfResult<UsageSummary> {
        let spec = FileQuery::new().owned_only().build(ctx);
        let records = self.metadata.query(&spec).await?;
        Ok(summarize_with_capacity(
            records.iter(),
            self.config.capacity_bytes,
        ))
    }

    /// Get configuration
    pub fn config(&self) -> &ShelfConfig {
        &self.config
    }

    /// Fetch a record and require the caller to own it
    async fn fetch_owned(&self, ctx: &ShelfCtx, id: &FileId) -> ShelfResult<FileRecord> {
        let record = self.metadata.get(id).await?;
        if record.owner_id != ctx.user_id {
            return Err(ShelfError::forbidden(id.as_str()));
        }
        Ok(record)
    }
}
