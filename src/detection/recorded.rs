//! Inference provider backed by exported detector output.
//!
//! A recording is the raw prediction list a detector produced for an image,
//! saved as JSON:
//!
//! ```json
//! {
//!   "image_size": [640, 480],
//!   "detections": [
//!     { "bbox": [10.0, 10.0, 50.0, 50.0], "confidence": 0.9, "class_id": 0 }
//!   ]
//! }
//! ```
//!
//! `image_size` is optional. When present, predictions for an image of a
//! different size fail, since the boxes would not line up.

use crate::config::DetectorConfig;
use crate::detection::{InferenceProvider, ProviderLoader};
use crate::models::RawDetection;
use anyhow::{Context, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default)]
    pub image_size: Option<(u32, u32)>,
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

/// Replays a recording for every image it is asked about
#[derive(Debug, Clone)]
pub struct RecordedProvider {
    name: String,
    recording: Recording,
}

impl RecordedProvider {
    pub fn new(name: impl Into<String>, recording: Recording) -> Self {
        Self {
            name: name.into(),
            recording,
        }
    }

    pub fn from_file(name: impl Into<String>, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read recording {}", path.display()))?;
        let recording: Recording = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse recording {}", path.display()))?;
        Ok(Self::new(name, recording))
    }
}

impl InferenceProvider for RecordedProvider {
    fn predict(&self, image: &RgbImage, confidence_threshold: f32) -> Result<Vec<RawDetection>> {
        if let Some((width, height)) = self.recording.image_size {
            if image.dimensions() != (width, height) {
                anyhow::bail!(
                    "recording is for a {}x{} image, got {}x{}",
                    width,
                    height,
                    image.width(),
                    image.height()
                );
            }
        }

        Ok(self
            .recording
            .detections
            .iter()
            .filter(|det| det.confidence > confidence_threshold)
            .map(|det| RawDetection {
                source: self.name.clone(),
                ..det.clone()
            })
            .collect())
    }
}

/// Loads each configured detector path as a recording
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedLoader;

impl ProviderLoader for RecordedLoader {
    fn load(&self, config: &DetectorConfig) -> Result<Box<dyn InferenceProvider>> {
        if !config.path.exists() {
            anyhow::bail!("{} does not exist", config.path.display());
        }
        let provider = RecordedProvider::from_file(&config.name, &config.path)?;
        Ok(Box::new(provider))
    }
}
