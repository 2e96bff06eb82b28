use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Unique identifier for a file record, assigned by the metadata store at
/// insert time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub String);

impl FileId {
    /// Generate a new random file ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from existing string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque key addressing the raw bytes of a file in the blob store.
///
/// Immutable once a record has committed: renames and share updates never
/// touch the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobKey(pub String);

impl BlobKey {
    /// Generate a new random blob key
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from existing string
    pub fn from_string(key: String) -> Self {
        Self(key)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BlobKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category a file is classified into, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Document,
    Image,
    Video,
    Audio,
    Other,
}

impl FileKind {
    /// All categories, in dashboard display order
    pub const ALL: [FileKind; 5] = [
        FileKind::Document,
        FileKind::Image,
        FileKind::Video,
        FileKind::Audio,
        FileKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Document => "document",
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
            FileKind::Other => "other",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity context for shelf operations, supplied by the surrounding
/// request layer's identity provider. Passed per call - never stored as a
/// process-wide singleton.
#[derive(Debug, Clone)]
pub struct ShelfCtx {
    pub user_id: String,
    pub email: String,
    pub account_id: String,
}

impl ShelfCtx {
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            account_id: account_id.into(),
        }
    }
}

/// The committed description of one uploaded file, owned by the metadata
/// store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    pub blob_key: BlobKey,
    pub name: String,
    pub extension: String,
    pub kind: FileKind,
    pub size_bytes: u64,
    pub owner_id: String,
    pub account_id: String,
    pub shared_with: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a file record. The metadata store assigns `id`,
/// `created_at`, and `updated_at` when committing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFileRecord {
    pub blob_key: BlobKey,
    pub name: String,
    pub extension: String,
    pub kind: FileKind,
    pub size_bytes: u64,
    pub owner_id: String,
    pub account_id: String,
    pub shared_with: BTreeSet<String>,
}

/// The only two mutations a committed record supports.
///
/// Everything else on a `FileRecord` is immutable after the upload saga
/// commits; in particular the blob key and the size never change.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPatch {
    /// Rename: new display name plus the extension re-derived from it.
    /// The kind is deliberately left untouched.
    Rename { name: String, extension: String },
    /// Replace the share list wholesale.
    SharedWith(BTreeSet<String>),
}
