use std::collections::BTreeSet;

use async_trait::async_trait;
use bytes::Bytes;

use cloudshelf::backend::memory::{MemoryBlobStore, MemoryMetadataStore};
use cloudshelf::{
    BlobKey, BlobStore, FileId, FileKind, FileQuery, FileRecord, FilterSpec, MetadataStore,
    NewFileRecord, PutResult, RecordPatch, ShelfAdapter, ShelfConfig, ShelfCtx, ShelfError,
    ShelfResult, UploadError,
};

/// Test factory functions
fn create_ctx(user: &str) -> ShelfCtx {
    ShelfCtx::new(user, format!("{user}@x.com"), "acct-1")
}

fn create_adapter() -> (ShelfAdapter, MemoryBlobStore, MemoryMetadataStore) {
    let blobs = MemoryBlobStore::new();
    let metadata = MemoryMetadataStore::new();
    let adapter = ShelfAdapter::new(blobs.clone(), metadata.clone(), ShelfConfig::default());
    (adapter, blobs, metadata)
}

/// Metadata store whose inserts always fail, for exercising compensation
struct FailingMetadataStore {
    inner: MemoryMetadataStore,
}

#[async_trait]
impl MetadataStore for FailingMetadataStore {
    async fn insert(&self, _record: NewFileRecord) -> ShelfResult<FileRecord> {
        Err(ShelfError::metadata_write("document create rejected"))
    }

    async fn get(&self, id: &FileId) -> ShelfResult<FileRecord> {
        self.inner.get(id).await
    }

    async fn query(&self, spec: &FilterSpec) -> ShelfResult<Vec<FileRecord>> {
        self.inner.query(spec).await
    }

    async fn update(&self, id: &FileId, patch: RecordPatch) -> ShelfResult<FileRecord> {
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &FileId) -> ShelfResult<()> {
        self.inner.delete(id).await
    }
}

/// Blob store that refuses deletes, for exercising the orphan path
struct NoDeleteBlobStore {
    inner: MemoryBlobStore,
}

#[async_trait]
impl BlobStore for NoDeleteBlobStore {
    async fn put(&self, key: &BlobKey, bytes: Bytes) -> ShelfResult<PutResult> {
        self.inner.put(key, bytes).await
    }

    async fn get(&self, key: &BlobKey) -> ShelfResult<Bytes> {
        self.inner.get(key).await
    }

    async fn exists(&self, key: &BlobKey) -> ShelfResult<bool> {
        self.inner.exists(key).await
    }

    async fn delete(&self, key: &BlobKey) -> ShelfResult<()> {
        Err(ShelfError::blob_delete(key.as_str(), "delete refused"))
    }
}

/// A1. Successful upload commits a record whose blob holds the input bytes
#[tokio::test]
async fn test_upload_commits_record_and_blob() {
    let (adapter, blobs, _metadata) = create_adapter();
    let ctx = create_ctx("u1");
    let payload = Bytes::from_static(b"hello blob!");

    let record = adapter.upload(&ctx, "hello.txt", payload.clone()).await.unwrap();

    assert_eq!(record.kind, FileKind::Document);
    assert_eq!(record.extension, "txt");
    assert_eq!(record.size_bytes, payload.len() as u64);
    assert_eq!(record.owner_id, "u1");
    assert_eq!(record.account_id, "acct-1");
    assert!(record.shared_with.is_empty());

    // The blob key resolves to bytes of the input length
    let opened = adapter.open(&ctx, &record.id).await.unwrap();
    assert_eq!(opened.bytes.len(), payload.len());
    assert_eq!(blobs.len(), 1);
}

/// A2. A committed upload is immediately visible to a scoped query
#[tokio::test]
async fn test_upload_immediately_visible() {
    let (adapter, _blobs, _metadata) = create_adapter();
    let ctx = create_ctx("u1");

    let record = adapter
        .upload(&ctx, "photo.png", Bytes::from_static(b"png-bytes"))
        .await
        .unwrap();

    let listed = adapter.list(&ctx, FileQuery::new()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, record.id);
}

/// A3. Empty payloads and blank identities are rejected before any write
#[tokio::test]
async fn test_upload_preconditions() {
    let (adapter, blobs, metadata) = create_adapter();

    let result = adapter
        .upload(&create_ctx("u1"), "empty.txt", Bytes::new())
        .await;
    assert!(matches!(result, Err(UploadError::Invalid(_))));

    let blank = ShelfCtx::new("", "nobody@x.com", "");
    let result = adapter
        .upload(&blank, "a.txt", Bytes::from_static(b"x"))
        .await;
    assert!(matches!(result, Err(UploadError::Invalid(_))));

    // Nothing was written anywhere
    assert!(blobs.is_empty());
    assert!(metadata.is_empty());
}

/// B1. Metadata failure rolls the blob back
#[tokio::test]
async fn test_metadata_failure_rolls_back_blob() {
    let blobs = MemoryBlobStore::new();
    let metadata = FailingMetadataStore {
        inner: MemoryMetadataStore::new(),
    };
    let adapter = ShelfAdapter::new(blobs.clone(), metadata, ShelfConfig::default());
    let ctx = create_ctx("u1");

    let result = adapter
        .upload(&ctx, "doomed.txt", Bytes::from_static(b"bytes"))
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, UploadError::MetadataRolledBack(_)));
    assert!(err.orphan().is_none());
    assert!(matches!(
        err.store_error(),
        Some(ShelfError::MetadataWrite { .. })
    ));

    // Compensating delete removed the blob
    assert!(blobs.is_empty());
}

/// B2. Failed compensation surfaces an orphaned blob warning, never silence
#[tokio::test]
async fn test_failed_compensation_reports_orphan() {
    let inner_blobs = MemoryBlobStore::new();
    let blobs = NoDeleteBlobStore {
        inner: inner_blobs.clone(),
    };
    let metadata = FailingMetadataStore {
        inner: MemoryMetadataStore::new(),
    };
    let adapter = ShelfAdapter::new(blobs, metadata, ShelfConfig::default());
    let ctx = create_ctx("u1");

    let err = adapter
        .upload(&ctx, "stuck.txt", Bytes::from_static(b"bytes"))
        .await
        .unwrap_err();

    // Both the originating metadata error and the orphan are surfaced
    assert!(matches!(
        err.store_error(),
        Some(ShelfError::MetadataWrite { .. })
    ));
    let warning = err.orphan().expect("orphan warning expected");
    assert!(matches!(
        warning.delete_error,
        ShelfError::BlobDelete { .. }
    ));

    // The blob is still there under the reported key
    assert_eq!(inner_blobs.len(), 1);
    assert!(inner_blobs.exists(&warning.key).await.unwrap());
}

/// C1. Queries are scoped: another user's private file is invisible
#[tokio::test]
async fn test_query_scoping_hides_private_files() {
    let (adapter, _blobs, _metadata) = create_adapter();
    let owner = create_ctx("u1");
    let stranger = create_ctx("u2");

    adapter
        .upload(&owner, "private.txt", Bytes::from_static(b"secret"))
        .await
        .unwrap();

    let listed = adapter.list(&stranger, FileQuery::new()).await.unwrap();
    assert!(listed.is_empty());
}

/// C2. Sharing by email makes the file visible and openable
#[tokio::test]
async fn test_sharing_grants_visibility() {
    let (adapter, _blobs, _metadata) = create_adapter();
    let owner = create_ctx("u1");
    let friend = create_ctx("u2");

    let record = adapter
        .upload(&owner, "shared.txt", Bytes::from_static(b"hi"))
        .await
        .unwrap();
    adapter
        .set_shared_with(
            &owner,
            &record.id,
            BTreeSet::from(["u2@x.com".to_string()]),
        )
        .await
        .unwrap();

    let listed = adapter.list(&friend, FileQuery::new()).await.unwrap();
    assert_eq!(listed.len(), 1);

    let opened = adapter.open(&friend, &record.id).await.unwrap();
    assert_eq!(opened.bytes, Bytes::from_static(b"hi"));
}

/// C3. Kind, search, sort, and limit narrow a listing
#[tokio::test]
async fn test_list_narrowing_and_sort() {
    let (adapter, _blobs, _metadata) = create_adapter();
    let ctx = create_ctx("u1");

    adapter.upload(&ctx, "a.txt", Bytes::from_static(b"1")).await.unwrap();
    adapter.upload(&ctx, "b.png", Bytes::from_static(b"123")).await.unwrap();
    adapter.upload(&ctx, "c.txt", Bytes::from_static(b"12")).await.unwrap();

    let documents = adapter
        .list(&ctx, FileQuery::new().with_kinds([FileKind::Document]))
        .await
        .unwrap();
    assert_eq!(documents.len(), 2);

    let searched = adapter
        .list(&ctx, FileQuery::new().with_search("b.p"))
        .await
        .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].name, "b.png");

    let ascending = adapter
        .list(&ctx, FileQuery::new().with_sort("size-asc"))
        .await
        .unwrap();
    let sizes: Vec<u64> = ascending.iter().map(|r| r.size_bytes).collect();
    assert_eq!(sizes, vec![1, 2, 3]);

    // Invalid direction falls back to descending
    let fallback = adapter
        .list(&ctx, FileQuery::new().with_sort("size-weird"))
        .await
        .unwrap();
    let sizes: Vec<u64> = fallback.iter().map(|r| r.size_bytes).collect();
    assert_eq!(sizes, vec![3, 2, 1]);

    let limited = adapter
        .list(&ctx, FileQuery::new().with_sort("size-asc").with_limit(2))
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
}

/// D1. Rename re-derives the extension and leaves the kind alone
#[tokio::test]
async fn test_rename_updates_name_and_extension_only() {
    let (adapter, _blobs, _metadata) = create_adapter();
    let ctx = create_ctx("u1");

    let record = adapter
        .upload(&ctx, "notes.txt", Bytes::from_static(b"n"))
        .await
        .unwrap();
    let renamed = adapter.rename(&ctx, &record.id, "notes.xyz").await.unwrap();

    assert_eq!(renamed.name, "notes.xyz");
    assert_eq!(renamed.extension, "xyz");
    assert_eq!(renamed.kind, FileKind::Document);
    assert_eq!(renamed.blob_key, record.blob_key);
    assert!(renamed.updated_at >= record.updated_at);
}

/// D2. Only the owner can rename, share, or delete
#[tokio::test]
async fn test_mutations_require_ownership() {
    let (adapter, _blobs, _metadata) = create_adapter();
    let owner = create_ctx("u1");
    let stranger = create_ctx("u2");

    let record = adapter
        .upload(&owner, "mine.txt", Bytes::from_static(b"m"))
        .await
        .unwrap();

    let rename = adapter.rename(&stranger, &record.id, "theirs.txt").await;
    assert!(matches!(rename, Err(ShelfError::Forbidden { .. })));

    let share = adapter
        .set_shared_with(&stranger, &record.id, BTreeSet::new())
        .await;
    assert!(matches!(share, Err(ShelfError::Forbidden { .. })));

    let delete = adapter.delete(&stranger, &record.id).await;
    assert!(matches!(delete, Err(ShelfError::Forbidden { .. })));
}

/// E1. Delete removes the record first, then the blob
#[tokio::test]
async fn test_delete_removes_record_and_blob() {
    let (adapter, blobs, metadata) = create_adapter();
    let ctx = create_ctx("u1");

    let record = adapter
        .upload(&ctx, "gone.txt", Bytes::from_static(b"g"))
        .await
        .unwrap();
    let receipt = adapter.delete(&ctx, &record.id).await.unwrap();

    assert!(receipt.orphan.is_none());
    assert!(metadata.is_empty());
    assert!(blobs.is_empty());
    assert!(matches!(
        adapter.open(&ctx, &record.id).await,
        Err(ShelfError::RecordNotFound { .. })
    ));
}

/// E2. A refused blob delete leaks no record and reports the orphan
#[tokio::test]
async fn test_delete_reports_orphaned_blob() {
    let inner_blobs = MemoryBlobStore::new();
    let blobs = NoDeleteBlobStore {
        inner: inner_blobs.clone(),
    };
    let metadata = MemoryMetadataStore::new();
    let adapter = ShelfAdapter::new(blobs, metadata.clone(), ShelfConfig::default());
    let ctx = create_ctx("u1");

    let record = adapter
        .upload(&ctx, "sticky.txt", Bytes::from_static(b"s"))
        .await
        .unwrap();
    let receipt = adapter.delete(&ctx, &record.id).await.unwrap();

    // The record is gone either way; the surviving blob is reported
    assert!(metadata.is_empty());
    let orphan = receipt.orphan.expect("orphan warning expected");
    assert_eq!(orphan.key, record.blob_key);
    assert_eq!(inner_blobs.len(), 1);
}

/// F1. Usage counts owned files only
#[tokio::test]
async fn test_usage_excludes_shared_files() {
    let (adapter, _blobs, _metadata) = create_adapter();
    let owner = create_ctx("u1");
    let friend = create_ctx("u2");

    let record = adapter
        .upload(&owner, "song.mp3", Bytes::from_static(b"0123456789"))
        .await
        .unwrap();
    adapter
        .set_shared_with(
            &owner,
            &record.id,
            BTreeSet::from(["u2@x.com".to_string()]),
        )
        .await
        .unwrap();

    let owner_usage = adapter.usage(&owner).await.unwrap();
    assert_eq!(owner_usage.audio.size_bytes, 10);
    assert_eq!(owner_usage.used, 10);

    let friend_usage = adapter.usage(&friend).await.unwrap();
    assert_eq!(friend_usage.used, 0);
}

/// G1. End-to-end: upload, scoped listing, usage summary agree
#[tokio::test]
async fn test_end_to_end_scenario() {
    let (adapter, _blobs, _metadata) = create_adapter();
    let ctx = ShelfCtx::new("u1", "u1@x.com", "acct-1");

    let record = adapter
        .upload(&ctx, "a.txt", Bytes::from_static(b"0123456789"))
        .await
        .unwrap();

    assert_eq!(record.kind, FileKind::Document);
    assert_eq!(record.extension, "txt");
    assert_eq!(record.size_bytes, 10);
    assert_eq!(record.owner_id, "u1");

    let listed = adapter
        .list(&ctx, FileQuery::new().with_sort("size-desc"))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, record.id);

    let usage = adapter.usage(&ctx).await.unwrap();
    assert_eq!(usage.document.size_bytes, 10);
    assert_eq!(usage.used, 10);
}

/// G2. Records serialize with lowercase kinds for the dashboard layer
#[tokio::test]
async fn test_record_serialization_shape() {
    let (adapter, _blobs, _metadata) = create_adapter();
    let ctx = create_ctx("u1");

    let record = adapter
        .upload(&ctx, "pic.jpg", Bytes::from_static(b"jpeg"))
        .await
        .unwrap();

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["kind"], "image");
    assert_eq!(value["size_bytes"], 4);
}
