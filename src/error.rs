use thiserror::Error;

use crate::types::BlobKey;

/// Result type for shelf operations
pub type ShelfResult<T> = Result<T, ShelfError>;

/// Infrastructure errors surfaced by the store clients.
///
/// The crate treats the underlying stores' transient-vs-permanent
/// distinction opaquely: nothing here is retried.
#[derive(Error, Debug, Clone)]
pub enum ShelfError {
    #[error("Blob write failed for key {key}: {reason}")]
    BlobWrite { key: String, reason: String },

    #[error("Blob delete failed for key {key}: {reason}")]
    BlobDelete { key: String, reason: String },

    #[error("Blob not found: {key}")]
    BlobNotFound { key: String },

    #[error("Metadata write failed: {reason}")]
    MetadataWrite { reason: String },

    #[error("Metadata delete failed for record {id}: {reason}")]
    MetadataDelete { id: String, reason: String },

    #[error("File record not found: {id}")]
    RecordNotFound { id: String },

    #[error("Access denied for file record {id}")]
    Forbidden { id: String },

    #[error("Invalid request: {message}")]
    Invalid { message: String },
}

impl ShelfError {
    /// Create a blob write error
    pub fn blob_write(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BlobWrite {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a blob delete error
    pub fn blob_delete(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BlobDelete {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a blob not found error
    pub fn blob_not_found(key: impl Into<String>) -> Self {
        Self::BlobNotFound { key: key.into() }
    }

    /// Create a metadata write error
    pub fn metadata_write(reason: impl Into<String>) -> Self {
        Self::MetadataWrite {
            reason: reason.into(),
        }
    }

    /// Create a metadata delete error
    pub fn metadata_delete(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MetadataDelete {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a record not found error
    pub fn record_not_found(id: impl Into<String>) -> Self {
        Self::RecordNotFound { id: id.into() }
    }

    /// Create an access denied error
    pub fn forbidden(id: impl Into<String>) -> Self {
        Self::Forbidden { id: id.into() }
    }

    /// Create an invalid request error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// A blob that survived its failed upload or delete.
///
/// Emitted only when a compensating (or post-delete) blob removal itself
/// fails. The orphan is reported exactly once and never auto-retried;
/// reclaiming it is an operator concern.
#[derive(Error, Debug, Clone)]
#[error("Orphaned blob {key}: delete failed: {delete_error}")]
pub struct OrphanedBlobWarning {
    /// Key of the blob left behind in the blob store.
    pub key: BlobKey,
    /// The error the blob store returned for the delete attempt.
    #[source]
    pub delete_error: ShelfError,
}
