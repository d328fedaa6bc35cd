//! Reelvault Storage Library
//!
//! This crate provides the object store capability used by ingestion and
//! retrieval, with S3, local filesystem, and bounded in-memory backends.
//!
//! # Object layout
//!
//! Objects are addressed by a [`StorageLocator`](reelvault_core::StorageLocator):
//! `{aspect-folder}/{random-key}.{ext}`, e.g. `landscape/q3J...Zw.mp4`. Keys are
//! derived in the `keys` module; the `(store_id, locator)` pair written to video
//! records is handled by the `locator` module.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod locator;
#[cfg(feature = "storage-memory")]
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod signing;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{derive_storage_key, locator_for, media_type_to_ext};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use locator::{DecodedLocator, LocatorError, PersistedLocator};
#[cfg(feature = "storage-memory")]
pub use memory::MemoryStorage;
pub use reelvault_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use signing::UrlSigner;
pub use traits::{Storage, StorageError, StorageResult};
