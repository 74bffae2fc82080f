use crate::config::{DEFAULT_CONFIDENCE_THRESHOLD, EnsembleConfig, SuppressionMode};
use crate::detection::{
    Aggregation, Aggregator, Deduplicator, Detector, DetectorOutcome, ProviderLoader, aggregator,
};
use crate::error::{EnsembleError, Result as EnsembleResult};
use crate::models::{ClassCatalog, DetectionSet};
use anyhow::Result;
use image::RgbImage;
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

/// Final result of analyzing one image
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Deduplicated detections in selection order
    pub detections: DetectionSet,
    /// Per-detector outcome of the aggregation stage
    pub outcomes: Vec<DetectorOutcome>,
    /// Number of candidates before deduplication
    pub candidates: usize,
}

impl Analysis {
    pub fn all_detectors_failed(&self) -> bool {
        aggregator::all_failed(&self.outcomes)
    }
}

/// Multi-detector ensemble: aggregation followed by greedy NMS.
///
/// Built once at startup; holds only read-only state afterwards, so one
/// instance can serve concurrent requests.
pub struct Ensemble {
    detectors: Vec<Detector>,
    catalog: ClassCatalog,
    confidence_threshold: f32,
    deduplicator: Deduplicator,
    parallel: bool,
    debug: Option<DebugConfig>,
}

impl std::fmt::Debug for Ensemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ensemble")
            .field("detectors", &self.detectors)
            .field("catalog", &self.catalog)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("deduplicator", &self.deduplicator)
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl Ensemble {
    pub fn builder() -> EnsembleBuilder {
        EnsembleBuilder::new()
    }

    /// Load every configured detector through `loader`.
    ///
    /// Detectors that fail to load are logged and left out. Fails with
    /// [`EnsembleError::NoDetectorsAvailable`] when none load.
    pub fn from_config(
        config: &EnsembleConfig,
        loader: &dyn ProviderLoader,
    ) -> EnsembleResult<Self> {
        config.validate()?;

        let mut builder = EnsembleBuilder::new()
            .with_catalog(config.class_catalog())
            .with_confidence_threshold(config.confidence_threshold)
            .with_iou_threshold(config.iou_threshold)
            .with_suppression(config.suppression)
            .with_parallel(config.parallel);

        for detector_config in &config.detectors {
            match loader.load(detector_config) {
                Ok(provider) => {
                    info!(
                        "Loaded detector '{}' ({}), weight {}",
                        detector_config.name,
                        detector_config.path.display(),
                        detector_config.weight
                    );
                    builder = builder.add_detector(Detector::new(
                        detector_config.name.clone(),
                        detector_config.weight,
                        provider,
                    ));
                }
                Err(e) => {
                    let err = EnsembleError::DetectorUnavailable {
                        name: detector_config.name.clone(),
                        reason: format!("{:#}", e),
                    };
                    warn!("{}", err);
                }
            }
        }

        let ensemble = builder.build()?;
        info!("Ensemble ready with {} detector(s)", ensemble.detectors.len());
        Ok(ensemble)
    }

    pub fn detectors(&self) -> &[Detector] {
        &self.detectors
    }

    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn deduplicator(&self) -> &Deduplicator {
        &self.deduplicator
    }

    /// Enable debug mode with output directory.
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });

        Ok(self)
    }

    /// Run the aggregation stage only
    pub fn aggregate(&self, image: &RgbImage) -> Aggregation {
        Aggregator::new(&self.detectors, &self.catalog)
            .with_parallel(self.parallel)
            .aggregate(image, self.confidence_threshold)
    }

    /// Run all detectors over the image and merge their output into one
    /// deduplicated detection set
    pub fn analyze(&self, image: &RgbImage) -> Result<Analysis> {
        self.save_debug_input(image)?;

        let aggregation = self.aggregate(image);
        debug!(
            "Aggregated {} candidates from {} detector(s)",
            aggregation.detections.len(),
            self.detectors.len()
        );
        if aggregation.all_failed() {
            warn!("Every detector failed on this image; reporting no detections");
        }
        self.save_debug_json("01_aggregated.json", &aggregation)?;

        let detections = self.deduplicator.deduplicate(&aggregation.detections);
        debug!(
            "NMS kept {} of {} candidates (iou threshold {})",
            detections.len(),
            aggregation.detections.len(),
            self.deduplicator.iou_threshold
        );

        let analysis = Analysis {
            candidates: aggregation.detections.len(),
            detections,
            outcomes: aggregation.outcomes,
        };
        self.save_debug_json("02_deduplicated.json", &analysis.detections)?;

        Ok(analysis)
    }

    fn debug_dir(&self) -> Option<&Path> {
        match &self.debug {
            Some(debug_config) if debug_config.enabled => Some(debug_config.output_dir.as_path()),
            _ => None,
        }
    }

    fn save_debug_input(&self, image: &RgbImage) -> Result<()> {
        if let Some(dir) = self.debug_dir() {
            let path = dir.join("00_input.png");
            image
                .save(&path)
                .map_err(|e| anyhow::anyhow!("Failed to save debug input: {}", e))?;
            debug!("Debug: saved {}", path.display());
        }
        Ok(())
    }

    fn save_debug_json<T: Serialize>(&self, filename: &str, value: &T) -> Result<()> {
        if let Some(dir) = self.debug_dir() {
            let path = dir.join(filename);
            let file = std::fs::File::create(&path)?;
            serde_json::to_writer_pretty(file, value)?;
            debug!("Debug: saved {}", path.display());
        }
        Ok(())
    }
}

/// Composable ensemble builder
pub struct EnsembleBuilder {
    detectors: Vec<Detector>,
    catalog: ClassCatalog,
    confidence_threshold: f32,
    deduplicator: Deduplicator,
    parallel: bool,
}

impl EnsembleBuilder {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
            catalog: ClassCatalog::default(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            deduplicator: Deduplicator::default(),
            parallel: false,
        }
    }

    pub fn with_catalog(mut self, catalog: ClassCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
        self.deduplicator.iou_threshold = threshold;
        self
    }

    pub fn with_suppression(mut self, mode: SuppressionMode) -> Self {
        self.deduplicator = self.deduplicator.with_mode(mode);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Add a loaded detector to the roster
    pub fn add_detector(mut self, detector: Detector) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn build(self) -> EnsembleResult<Ensemble> {
        if self.detectors.is_empty() {
            return Err(EnsembleError::NoDetectorsAvailable);
        }

        Ok(Ensemble {
            detectors: self.detectors,
            catalog: self.catalog,
            confidence_threshold: self.confidence_threshold,
            deduplicator: self.deduplicator,
            parallel: self.parallel,
            debug: None,
        })
    }
}

impl Default for EnsembleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
