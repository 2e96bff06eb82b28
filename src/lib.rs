//! # cloudshelf: file upload coordination and metadata consistency
//!
//! `cloudshelf` is the storage core of a cloud drive application: it owns the
//! upload transaction across an object store and a document database, the
//! scoped query construction for listings, and the per-category usage
//! aggregation - and nothing else. No HTTP surface, no CLI, no
//! authentication: the surrounding request layer supplies an identity
//! context and two store capabilities, and embeds the adapter.
//!
//! ## Key ideas
//!
//! - **Upload is a saga**: blob write, then metadata insert, with exactly one
//!   compensating blob delete when the insert fails. Callers observe either a
//!   committed [`FileRecord`] or an error - never a half-uploaded file. When
//!   compensation itself fails, the error carries an [`OrphanedBlobWarning`]
//!   and the condition is logged; it is never silently dropped.
//! - **Storage agnostic**: [`BlobStore`] and [`MetadataStore`] are capability
//!   traits. Production code wraps its backend SDKs; tests inject fakes.
//! - **Scoped reads by construction**: every filter built through
//!   [`FileQuery`] carries the owner-or-shared access predicate.
//!
//! ## Quick Start
//!
//! ```rust
//! use cloudshelf::prelude::*;
//! use cloudshelf::backend::memory::{MemoryBlobStore, MemoryMetadataStore};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let shelf = ShelfAdapter::new(
//!     MemoryBlobStore::new(),
//!     MemoryMetadataStore::new(),
//!     ShelfConfig::default(),
//! );
//!
//! let ctx = ShelfCtx::new("user-1", "user-1@example.com", "acct-1");
//!
//! let record = shelf
//!     .upload(&ctx, "report.pdf", bytes::Bytes::from_static(b"%PDF-1.4"))
//!     .await?;
//! assert_eq!(record.kind, FileKind::Document);
//!
//! let files = shelf.list(&ctx, FileQuery::new().with_sort("size-desc")).await?;
//! assert_eq!(files.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  Request layer   │  ← auth, routing, timeouts (not this crate)
//! ├──────────────────┤
//! │   ShelfAdapter   │  ← lifecycle: upload/open/rename/share/delete/list/usage
//! ├──────────────────┤
//! │ UploadCoordinator│  ← the blob-then-metadata saga
//! ├──────────────────┤
//! │ BlobStore        │  ← capability traits over the real backends
//! │ MetadataStore    │
//! └──────────────────┘
//! ```

mod adapter;
pub mod backend;
mod classify;
mod config;
mod error;
mod query;
mod saga;
pub mod store;
mod types;
mod usage;

// Re-export main types for clean API
pub use adapter::{DeleteReceipt, OpenedFile, ShelfAdapter};
pub use classify::{classify, kind_for_extension};
pub use config::ShelfConfig;
pub use error::{OrphanedBlobWarning, ShelfError, ShelfResult};
pub use query::{FileQuery, FilterSpec, Predicate, SortDirection, SortField, SortSpec};
pub use saga::{SagaState, UploadCoordinator, UploadError};
pub use store::{BlobKeyStrategy, BlobStore, DefaultKeyStrategy, MetadataStore, PutResult};
pub use types::{BlobKey, FileId, FileKind, FileRecord, NewFileRecord, RecordPatch, ShelfCtx};
pub use usage::{
    summarize, summarize_with_capacity, CategoryUsage, UsageSummary, DEFAULT_CAPACITY_BYTES,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobStore, FileKind, FileQuery, FileRecord, MetadataStore, ShelfAdapter, ShelfConfig,
        ShelfCtx, ShelfError, ShelfResult, UploadError,
    };
}
