use uuid::Uuid;

/// Validation errors raised before any payload byte is staged
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Unsupported media type: {content_type} (allowed: {allowed:?})")]
    UnsupportedMediaType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge { size: u64, max: u64 },

    #[error("Video not found: {0}")]
    NotFound(Uuid),

    #[error("User {user_id} does not own video {video_id}")]
    Forbidden { user_id: Uuid, video_id: Uuid },
}

/// Strip media type parameters and fold case: `Video/MP4; codecs=avc1` -> `video/mp4`.
///
/// Returns `None` for values without a `type/subtype` shape.
pub fn normalize_media_type(content_type: &str) -> Option<String> {
    let essence = content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase();

    match essence.split_once('/') {
        Some((ty, subtype)) if !ty.is_empty() && !subtype.is_empty() => Some(essence),
        _ => None,
    }
}

/// Upload validator
///
/// Holds the size bound and the media type allow-list for ingestion.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    max_file_size: u64,
    allowed_content_types: Vec<String>,
}

impl MediaValidator {
    pub fn new(max_file_size: u64, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.to_lowercase())
                .collect(),
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate content type; returns the normalized media type on success.
    pub fn validate_content_type(&self, content_type: &str) -> Result<String, ValidationError> {
        let unsupported = || ValidationError::UnsupportedMediaType {
            content_type: content_type.to_string(),
            allowed: self.allowed_content_types.clone(),
        };

        let normalized = normalize_media_type(content_type).ok_or_else(unsupported)?;
        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(unsupported());
        }

        Ok(normalized)
    }

    /// Validate a size, declared or observed.
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::PayloadTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }
}
