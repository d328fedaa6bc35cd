//! Reelvault Core Library
//!
//! This crate provides the domain models, error metadata, and configuration
//! shared by the storage, processing, and CLI crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, IngestConfig};
pub use error::{ErrorMetadata, LogLevel};
pub use models::{AspectClass, StorageKey, StorageLocator, VideoRecord};
pub use storage_types::StorageBackend;
