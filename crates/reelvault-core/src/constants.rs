//! Application-wide constants.

/// Upper bound for a staged video upload (1 GiB).
pub const DEFAULT_MAX_VIDEO_SIZE_BYTES: u64 = 1 << 30;

/// Lifetime of a presigned retrieval URL.
pub const PRESIGNED_URL_TTL_SECS: u64 = 3600;

/// Media types accepted for video ingestion unless configured otherwise.
pub const DEFAULT_VIDEO_CONTENT_TYPES: &[&str] = &["video/mp4"];

/// Media types the fast-start remux can produce. It always writes MP4.
pub const FAST_START_CONTENT_TYPES: &[&str] = &["video/mp4"];

/// Separator between the store identifier and the locator in a persisted field.
pub const LOCATOR_SEPARATOR: char = ',';

/// Capacity of the in-memory storage backend when none is configured.
pub const DEFAULT_MEMORY_STORE_CAPACITY: usize = 256;
