use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Axis-aligned box in image coordinates (x1, y1) top-left, (x2, y2) bottom-right
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Width, zero for inverted or NaN extents. An infinite coordinate gives
    /// an infinite width.
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    /// Height, zero for inverted or NaN extents. An infinite coordinate gives
    /// an infinite height.
    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.x2 > self.x1 && self.y2 > self.y1)
    }

    /// Area of the overlap with another box, zero when they don't touch
    pub fn intersection(&self, other: &BoundingBox) -> f32 {
        let w = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let h = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        w * h
    }

    /// Intersection-over-Union. Zero when the union is empty, which also
    /// covers degenerate boxes.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        if self.is_degenerate() || other.is_degenerate() {
            return 0.0;
        }

        let inter = self.intersection(other);
        let union = self.area() + other.area() - inter;

        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Longest side, used as the defect size in reports
    pub fn size(&self) -> f32 {
        self.width().max(self.height())
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One candidate region reported by a single detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub class_id: usize,
    /// Tag of the detector that produced this box (filled in by the aggregator
    /// when a provider leaves it empty)
    #[serde(default)]
    pub source: String,
}

impl RawDetection {
    pub fn new(bbox: BoundingBox, confidence: f32, class_id: usize) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
            source: String::new(),
        }
    }

    /// Rescale confidence by the detector weight. Weights above 1.0 are not clamped.
    pub fn weighted(self, weight: f32, detector: &str) -> WeightedDetection {
        WeightedDetection {
            bbox: self.bbox,
            confidence: self.confidence * weight,
            raw_confidence: self.confidence,
            class_id: self.class_id,
            detector: detector.to_string(),
        }
    }
}

/// A detection whose confidence has been multiplied by its detector's weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedDetection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub raw_confidence: f32,
    pub class_id: usize,
    pub detector: String,
}

/// Detections for one analyzed image, in aggregation or selection order
pub type DetectionSet = Vec<WeightedDetection>;

/// Fixed, ordered list of defect class names; the index is the class id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCatalog {
    names: Arc<[String]>,
}

impl ClassCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    pub fn contains(&self, class_id: usize) -> bool {
        class_id < self.names.len()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for ClassCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_CLASSES)
    }
}

/// Turbine blade defect classes the shipped detectors were trained on
pub const DEFAULT_CLASSES: [&str; 4] = ["Burn Mark", "Coating_defects", "Crack", "EROSION"];
