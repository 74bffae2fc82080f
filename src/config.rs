use crate::error::{EnsembleError, Result};
use crate::models::{ClassCatalog, DEFAULT_CLASSES};
use crate::report::Criticality;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;

/// How the deduplicator decides which boxes may suppress each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuppressionMode {
    /// Any sufficiently overlapping box is suppressed, regardless of class
    #[default]
    CrossClass,
    /// Only boxes of the same class suppress each other
    PerClass,
}

/// One entry of the detector roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

fn default_confidence() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_iou() -> f32 {
    DEFAULT_IOU_THRESHOLD
}

fn default_classes() -> Vec<String> {
    DEFAULT_CLASSES.iter().map(|s| s.to_string()).collect()
}

/// Immutable ensemble configuration, read once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    #[serde(default = "default_confidence")]
    pub confidence_threshold: f32,

    #[serde(default = "default_iou")]
    pub iou_threshold: f32,

    #[serde(default)]
    pub suppression: SuppressionMode,

    /// Run detectors on scoped threads instead of one after another
    #[serde(default)]
    pub parallel: bool,

    #[serde(default = "default_classes")]
    pub classes: Vec<String>,

    /// Per-class criticality overrides, keyed by class name
    #[serde(default)]
    pub criticality: BTreeMap<String, Criticality>,

    #[serde(default)]
    pub detectors: Vec<DetectorConfig>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            suppression: SuppressionMode::default(),
            parallel: false,
            classes: default_classes(),
            criticality: BTreeMap::new(),
            detectors: vec![
                DetectorConfig {
                    name: "v2".to_string(),
                    path: PathBuf::from("models/augmented_training_v2.json"),
                    weight: 1.0,
                },
                DetectorConfig {
                    name: "v3".to_string(),
                    path: PathBuf::from("models/augmented_training_v3.json"),
                    weight: 1.0,
                },
                DetectorConfig {
                    name: "yolo8n".to_string(),
                    path: PathBuf::from("models/augmented_training_yolo8n_v1.json"),
                    weight: 0.8,
                },
            ],
        }
    }
}

impl EnsembleConfig {
    /// Parse a TOML config. Relative detector paths are resolved against
    /// `base_dir` when given.
    pub fn from_toml_str(
        text: &str,
        base_dir: Option<&Path>,
    ) -> std::result::Result<Self, toml::de::Error> {
        let mut config: EnsembleConfig = toml::from_str(text)?;
        if let Some(base) = base_dir {
            for detector in &mut config.detectors {
                if detector.path.is_relative() {
                    detector.path = base.join(&detector.path);
                }
            }
        }
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config =
            Self::from_toml_str(&text, path.parent()).map_err(|source| EnsembleError::Config {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config at `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("Config {} not found, using built-in defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_unit_interval("confidence_threshold", self.confidence_threshold)?;
        check_unit_interval("iou_threshold", self.iou_threshold)?;

        if self.classes.is_empty() {
            return Err(EnsembleError::InvalidConfig("class catalog is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for detector in &self.detectors {
            if detector.name.trim().is_empty() {
                return Err(EnsembleError::InvalidConfig("detector name is empty".to_string()));
            }
            if !seen.insert(detector.name.as_str()) {
                return Err(EnsembleError::InvalidConfig(format!(
                    "duplicate detector name '{}'",
                    detector.name
                )));
            }
            if !detector.weight.is_finite() || detector.weight < 0.0 {
                return Err(EnsembleError::InvalidConfig(format!(
                    "detector '{}' has invalid weight {}",
                    detector.name, detector.weight
                )));
            }
        }

        Ok(())
    }

    pub fn class_catalog(&self) -> ClassCatalog {
        ClassCatalog::new(self.classes.iter().cloned())
    }
}

fn check_unit_interval(field: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EnsembleError::InvalidConfig(format!(
            "{} must be between 0.0 and 1.0, got {}",
            field, value
        )))
    }
}
