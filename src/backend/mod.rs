//! Store backends. Only the in-memory backend ships with the crate;
//! production deployments implement [`BlobStore`](crate::BlobStore) and
//! [`MetadataStore`](crate::MetadataStore) against their own services.

pub mod memory;
