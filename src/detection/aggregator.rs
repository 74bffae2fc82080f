use crate::detection::Detector;
use crate::error::EnsembleError;
use crate::models::{ClassCatalog, DetectionSet, RawDetection, WeightedDetection};
use image::RgbImage;
use log::{debug, warn};
use serde::Serialize;

/// What happened to one detector during a single aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectorOutcome {
    Detected { detector: String, count: usize },
    Failed { detector: String, error: String },
}

impl DetectorOutcome {
    pub fn detector(&self) -> &str {
        match self {
            DetectorOutcome::Detected { detector, .. }
            | DetectorOutcome::Failed { detector, .. } => detector,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, DetectorOutcome::Failed { .. })
    }
}

/// True when at least one detector ran and none of them succeeded
pub fn all_failed(outcomes: &[DetectorOutcome]) -> bool {
    !outcomes.is_empty() && outcomes.iter().all(DetectorOutcome::is_failure)
}

/// Combined output of every detector for one image
#[derive(Debug, Clone, Default, Serialize)]
pub struct Aggregation {
    pub detections: DetectionSet,
    pub outcomes: Vec<DetectorOutcome>,
}

impl Aggregation {
    pub fn all_failed(&self) -> bool {
        all_failed(&self.outcomes)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DetectorOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}

/// Runs every detector in the roster over one image and merges their weighted output
pub struct Aggregator<'a> {
    detectors: &'a [Detector],
    catalog: &'a ClassCatalog,
    parallel: bool,
}

impl<'a> Aggregator<'a> {
    pub fn new(detectors: &'a [Detector], catalog: &'a ClassCatalog) -> Self {
        Self {
            detectors,
            catalog,
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Invoke each detector with the image and threshold, isolating failures.
    ///
    /// Output order is roster order, then provider order, whether or not the
    /// detectors ran in parallel.
    pub fn aggregate(&self, image: &RgbImage, confidence_threshold: f32) -> Aggregation {
        let run_parallel = self.parallel && self.detectors.len() > 1;
        let results: Vec<anyhow::Result<Vec<RawDetection>>> = if run_parallel {
            std::thread::scope(|scope| {
                let handles: Vec<_> = self
                    .detectors
                    .iter()
                    .map(|detector| {
                        scope.spawn(move || detector.predict(image, confidence_threshold))
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|handle| {
                        handle
                            .join()
                            .unwrap_or_else(|_| Err(anyhow::anyhow!("detector thread panicked")))
                    })
                    .collect()
            })
        } else {
            self.detectors
                .iter()
                .map(|detector| detector.predict(image, confidence_threshold))
                .collect()
        };

        let mut aggregation = Aggregation::default();

        for (detector, result) in self.detectors.iter().zip(results) {
            match result {
                Ok(raw) => {
                    let weighted = self.apply_weight(detector, raw);
                    debug!(
                        "Detector '{}' produced {} detections (weight {})",
                        detector.name,
                        weighted.len(),
                        detector.weight
                    );
                    aggregation.outcomes.push(DetectorOutcome::Detected {
                        detector: detector.name.clone(),
                        count: weighted.len(),
                    });
                    aggregation.detections.extend(weighted);
                }
                Err(e) => {
                    let err = EnsembleError::DetectorInference {
                        name: detector.name.clone(),
                        reason: format!("{:#}", e),
                    };
                    warn!("{}", err);
                    aggregation.outcomes.push(DetectorOutcome::Failed {
                        detector: detector.name.clone(),
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        aggregation
    }

    /// Weight and tag one detector's raw output, dropping boxes with an unknown class
    fn apply_weight(&self, detector: &Detector, raw: Vec<RawDetection>) -> Vec<WeightedDetection> {
        raw.into_iter()
            .filter(|det| {
                if self.catalog.contains(det.class_id) {
                    true
                } else {
                    warn!(
                        "Detector '{}' returned unknown class id {} (catalog has {} classes), \
                         dropping it",
                        detector.name,
                        det.class_id,
                        self.catalog.len()
                    );
                    false
                }
            })
            .map(|det| det.weighted(detector.weight, &detector.name))
            .collect()
    }
}
