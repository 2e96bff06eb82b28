//! Upload saga: a two-phase write (blob, then metadata) over two
//! independently-failing stores, with a single compensating delete on
//! partial failure.

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

use crate::classify::classify;
use crate::error::{OrphanedBlobWarning, ShelfError};
use crate::store::{BlobKeyStrategy, BlobStore, DefaultKeyStrategy, MetadataStore};
use crate::types::{BlobKey, FileId, FileRecord, NewFileRecord, ShelfCtx};

/// States the upload saga moves through.
///
/// The machine is linear: `Started -> BlobWritten -> Committed` on the
/// happy path, and `BlobWritten -> RolledBack | OrphanFailure` when the
/// metadata insert fails. There is no observable state between these -
/// callers see either a committed record or an error.
#[derive(Debug, Clone, PartialEq)]
pub enum SagaState {
    /// Preconditions checked, nothing written yet
    Started,
    /// Blob bytes are durable under this key; the record is not yet visible
    BlobWritten(BlobKey),
    /// Record committed and visible to queries
    Committed(FileId),
    /// Metadata insert failed and the compensating blob delete succeeded
    RolledBack(BlobKey),
    /// Metadata insert failed and so did the compensating delete; the blob
    /// under this key is orphaned
    OrphanFailure(BlobKey),
}

impl SagaState {
    /// Whether the saga has finished (successfully or not)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaState::Committed(_) | SagaState::RolledBack(_) | SagaState::OrphanFailure(_)
        )
    }
}

/// How an upload failed.
///
/// The compensation outcome is part of the variant so callers can audit it
/// without parsing messages: `MetadataRolledBack` means no trace of the
/// upload remains, `MetadataOrphaned` means the blob survived and the
/// attached warning says why.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Invalid upload request: {0}")]
    Invalid(String),

    #[error("Blob write failed: {0}")]
    BlobWrite(#[source] ShelfError),

    #[error("Metadata write failed, blob rolled back: {0}")]
    MetadataRolledBack(#[source] ShelfError),

    #[error("Metadata write failed and blob was orphaned: {source}")]
    MetadataOrphaned {
        #[source]
        source: ShelfError,
        warning: OrphanedBlobWarning,
    },
}

impl UploadError {
    /// The originating store error, if any
    pub fn store_error(&self) -> Option<&ShelfError> {
        match self {
            UploadError::Invalid(_) => None,
            UploadError::BlobWrite(err)
            | UploadError::MetadataRolledBack(err)
            | UploadError::MetadataOrphaned { source: err, .. } => Some(err),
        }
    }

    /// The orphaned-blob warning, when compensation itself failed
    pub fn orphan(&self) -> Option<&OrphanedBlobWarning> {
        match self {
            UploadError::MetadataOrphaned { warning, .. } => Some(warning),
            _ => None,
        }
    }
}

/// Orchestrates the blob-then-metadata write and its compensation.
///
/// Holds no locks and no shared mutable state; any number of sagas may run
/// concurrently against the same stores. At most one compensating delete is
/// attempted per failed saga - no retries, no backoff. Timeout and
/// cancellation policy around the whole saga belong to the caller.
pub struct UploadCoordinator {
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    keys: Arc<dyn BlobKeyStrategy>,
}

impl UploadCoordinator {
    /// Create a coordinator with the default key strategy
    pub fn new<B, M>(blobs: B, metadata: M) -> Self
    where
        B: BlobStore + 'static,
        M: MetadataStore + 'static,
    {
        Self {
            blobs: Arc::new(blobs),
            metadata: Arc::new(metadata),
            keys: Arc::new(DefaultKeyStrategy),
        }
    }

    /// Create a coordinator from already-shared store handles.
    ///
    /// This is the dependency-injection seam: hand in handles constructed
    /// with whatever credentials the write path needs.
    pub fn from_handles(
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        keys: Arc<dyn BlobKeyStrategy>,
    ) -> Self {
        Self {
            blobs,
            metadata,
            keys,
        }
    }

    /// Run the upload saga: store `bytes` under a fresh key, then commit a
    /// record describing them.
    ///
    /// On success the returned record is immediately visible to queries
    /// scoped by the caller's owner or account id. On a metadata failure the
    /// blob is deleted before returning; if that delete also fails the error
    /// carries an [`OrphanedBlobWarning`] and the condition is logged at
    /// `warn` - never silently swallowed.
    pub async fn upload(
        &self,
        ctx: &ShelfCtx,
        name: &str,
        bytes: Bytes,
    ) -> Result<FileRecord, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Invalid("upload payload is empty".to_string()));
        }
        if ctx.user_id.is_empty() || ctx.account_id.is_empty() {
            return Err(UploadError::Invalid(
                "missing owner or account identifier".to_string(),
            ));
        }

        let mut state = SagaState::Started;
        debug!(?state, name, owner = %ctx.user_id, "upload saga started");

        let key = self.keys.object_key(&ctx.account_id);
        let put = self
            .blobs
            .put(&key, bytes)
            .await
            .map_err(UploadError::BlobWrite)?;

        state = SagaState::BlobWritten(key.clone());
        debug!(?state, size_bytes = put.size_bytes, "blob written");

        let (kind, extension) = classify(name);
        let record = NewFileRecord {
            blob_key: key.clone(),
            name: name.to_string(),
            extension,
            kind,
            size_bytes: put.size_bytes,
            owner_id: ctx.user_id.clone(),
            account_id: ctx.account_id.clone(),
            shared_with: BTreeSet::new(),
        };

        match self.metadata.insert(record).await {
            Ok(committed) => {
                state = SagaState::Committed(committed.id.clone());
                debug!(?state, "upload saga committed");
                Ok(committed)
            }
            Err(meta_err) => match self.blobs.delete(&key).await {
                Ok(()) => {
                    state = SagaState::RolledBack(key);
                    debug!(?state, error = %meta_err, "metadata insert failed, blob rolled back");
                    Err(UploadError::MetadataRolledBack(meta_err))
                }
                Err(delete_err) => {
                    let warning = OrphanedBlobWarning {
                        key: key.clone(),
                        delete_error: delete_err,
                    };
                    state = SagaState::OrphanFailure(key);
                    warn!(?state, error = %meta_err, %warning, "compensating delete failed, blob orphaned");
                    Err(UploadError::MetadataOrphaned {
                        source: meta_err,
                        warning,
                    })
                }
            },
        }
    }
}
