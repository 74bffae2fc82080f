pub mod aggregator;
pub mod nms;
pub mod recorded;

use crate::config::DetectorConfig;
use crate::models::RawDetection;
use anyhow::Result;
use image::RgbImage;
use std::fmt;

pub use aggregator::{Aggregation, Aggregator, DetectorOutcome};
pub use nms::Deduplicator;
pub use recorded::{RecordedLoader, RecordedProvider};

/// A trained model that turns an image into raw detections.
///
/// Implementations wrap whatever runtime actually executes the network. They
/// must return only detections whose confidence is above `confidence_threshold`
/// and must leave no shared state behind when they fail.
pub trait InferenceProvider: Send + Sync {
    fn predict(&self, image: &RgbImage, confidence_threshold: f32) -> Result<Vec<RawDetection>>;
}

/// Opens a detector handle from its configured location at startup
pub trait ProviderLoader {
    fn load(&self, config: &DetectorConfig) -> Result<Box<dyn InferenceProvider>>;
}

/// A loaded detector in the active roster
pub struct Detector {
    pub name: String,
    pub weight: f32,
    provider: Box<dyn InferenceProvider>,
}

impl Detector {
    pub fn new(name: impl Into<String>, weight: f32, provider: Box<dyn InferenceProvider>) -> Self {
        Self {
            name: name.into(),
            weight,
            provider,
        }
    }

    pub fn predict(
        &self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<Vec<RawDetection>> {
        self.provider.predict(image, confidence_threshold)
    }
}

impl fmt::Debug for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detector")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}
