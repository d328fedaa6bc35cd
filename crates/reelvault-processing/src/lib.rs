//! Reelvault Processing Library
//!
//! The video ingestion pipeline and its stages:
//!
//! ```text
//! validate -> stage -> fast-start remux -> probe/classify -> derive key
//!          -> upload -> encode locator -> persist
//! ```
//!
//! Reads go the other way: a persisted locator is decoded and handed to the
//! [`PresignedUrlIssuer`](resolve::PresignedUrlIssuer).

pub mod pipeline;
pub mod records;
pub mod resolve;
pub mod staging;
pub mod upload;
pub mod validator;
pub mod video;

pub use pipeline::{IngestError, IngestOutcome, IngestStage, IngestionPipeline, UploadRequest};
pub use records::{InMemoryVideoRecords, RecordError, VideoRecords};
pub use resolve::{sign_video_record, PresignedUrlIssuer, SignedUrl, SigningError};
pub use staging::{StagedFile, StagingError, UploadStager};
pub use upload::ObjectStoreUploader;
pub use validator::{normalize_media_type, MediaValidator, ValidationError};
pub use video::{
    classify_aspect_ratio, AspectClassifier, FFmpegTool, FastStartTranscoder, MediaTool,
    MediaToolError, VideoGeometry,
};
