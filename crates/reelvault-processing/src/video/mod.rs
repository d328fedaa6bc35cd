//! Video stages backed by external media tools
//!
//! [`MediaTool`] is the seam between the pipeline and ffmpeg/ffprobe; tests
//! substitute a fake.

mod aspect;
mod faststart;
mod ffmpeg;
mod tool;

pub use aspect::{classify_aspect_ratio, AspectClassifier, ASPECT_RATIO_TOLERANCE};
pub use faststart::FastStartTranscoder;
pub use ffmpeg::FFmpegTool;
pub use tool::{MediaTool, MediaToolError, VideoGeometry};
