use std::path::Path;
use std::sync::Arc;

use reelvault_core::AspectClass;

use super::tool::{MediaTool, MediaToolError, VideoGeometry};

/// Maximum distance from a reference ratio that still counts as a match.
pub const ASPECT_RATIO_TOLERANCE: f64 = 0.01;

const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;
const PORTRAIT_RATIO: f64 = 9.0 / 16.0;

/// Bucket a width/height ratio. Landscape is checked first.
pub fn classify_aspect_ratio(ratio: f64) -> AspectClass {
    if (ratio - LANDSCAPE_RATIO).abs() <= ASPECT_RATIO_TOLERANCE {
        AspectClass::Landscape
    } else if (ratio - PORTRAIT_RATIO).abs() <= ASPECT_RATIO_TOLERANCE {
        AspectClass::Portrait
    } else {
        AspectClass::Other
    }
}

/// Probes a file and classifies its primary video stream.
#[derive(Clone)]
pub struct AspectClassifier {
    tool: Arc<dyn MediaTool>,
}

impl AspectClassifier {
    pub fn new(tool: Arc<dyn MediaTool>) -> Self {
        Self { tool }
    }

    pub async fn classify(&self, path: &Path) -> Result<(AspectClass, VideoGeometry), MediaToolError> {
        let geometry = self.tool.probe(path).await?;
        let ratio = geometry
            .aspect_ratio()
            .ok_or(MediaToolError::InvalidGeometry {
                width: geometry.width,
                height: geometry.height,
            })?;

        let class = classify_aspect_ratio(ratio);
        tracing::debug!(
            width = geometry.width,
            height = geometry.height,
            aspect_class = %class,
            "Video classified"
        );
        Ok((class, geometry))
    }
}
