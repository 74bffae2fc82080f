use bladescan::{BoundingBox, Detector, InferenceProvider, RawDetection, WeightedDetection};
use image::{ImageBuffer, Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// Creates a black 3-channel test image of the given size
pub fn blank_image(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_pixel(width, height, Rgb([0u8, 0u8, 0u8]))
}

pub fn raw(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32, class_id: usize) -> RawDetection {
    RawDetection::new(BoundingBox::new(x1, y1, x2, y2), confidence, class_id)
}

pub fn weighted(
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    confidence: f32,
    class_id: usize,
) -> WeightedDetection {
    raw(x1, y1, x2, y2, confidence, class_id).weighted(1.0, "test")
}

/// Provider that always returns the same detections above the threshold
pub struct StubProvider {
    pub detections: Vec<RawDetection>,
}

impl InferenceProvider for StubProvider {
    fn predict(
        &self,
        _image: &RgbImage,
        confidence_threshold: f32,
    ) -> anyhow::Result<Vec<RawDetection>> {
        Ok(self
            .detections
            .iter()
            .filter(|d| d.confidence > confidence_threshold)
            .cloned()
            .collect())
    }
}

/// Provider that fails on every call
pub struct FailingProvider;

impl InferenceProvider for FailingProvider {
    fn predict(
        &self,
        _image: &RgbImage,
        _confidence_threshold: f32,
    ) -> anyhow::Result<Vec<RawDetection>> {
        anyhow::bail!("CUDA out of memory")
    }
}

pub fn stub_detector(name: &str, weight: f32, detections: Vec<RawDetection>) -> Detector {
    Detector::new(name, weight, Box::new(StubProvider { detections }))
}

pub fn failing_detector(name: &str) -> Detector {
    Detector::new(name, 1.0, Box::new(FailingProvider))
}

/// Writes a recorded-detections JSON file and returns its path
pub fn write_recording(dir: &Path, file_name: &str, json: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, json).expect("Failed to write recording");
    path
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-5,
        "expected {} to be close to {}",
        actual,
        expected
    );
}
