use crate::config::{DEFAULT_IOU_THRESHOLD, SuppressionMode};
use crate::models::{DetectionSet, WeightedDetection};

/// Greedy Non-Maximum Suppression over a merged detection set
#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    pub iou_threshold: f32,
    pub mode: SuppressionMode,
}

impl Deduplicator {
    pub fn new(iou_threshold: f32) -> Self {
        Self {
            iou_threshold,
            mode: SuppressionMode::CrossClass,
        }
    }

    pub fn with_mode(mut self, mode: SuppressionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Keep the most confident box of every overlapping group.
    ///
    /// Boxes are visited in descending confidence (ties keep input order). Each
    /// selected box suppresses every later box whose IoU with it is at least
    /// the threshold. The input is left untouched; the result is in selection order.
    pub fn deduplicate(&self, detections: &[WeightedDetection]) -> DetectionSet {
        if detections.is_empty() {
            return Vec::new();
        }

        let mut order: Vec<&WeightedDetection> = detections.iter().collect();
        // sort_by is stable
        order.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let mut active = vec![true; order.len()];
        let mut kept = Vec::new();

        for i in 0..order.len() {
            if !active[i] {
                continue;
            }
            let current = order[i];
            kept.push(current.clone());

            for j in (i + 1)..order.len() {
                if active[j] && self.suppresses(current, order[j]) {
                    active[j] = false;
                }
            }
        }

        kept
    }

    fn suppresses(&self, kept: &WeightedDetection, other: &WeightedDetection) -> bool {
        if self.mode == SuppressionMode::PerClass && kept.class_id != other.class_id {
            return false;
        }
        // Zero-area boxes never take part, even with a zero threshold
        if kept.bbox.is_degenerate() || other.bbox.is_degenerate() {
            return false;
        }
        kept.bbox.iou(&other.bbox) >= self.iou_threshold
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_IOU_THRESHOLD)
    }
}
