pub mod annotate;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;

pub use config::{DetectorConfig, EnsembleConfig, SuppressionMode};
pub use detection::{
    Aggregation, Aggregator, Deduplicator, Detector, DetectorOutcome, InferenceProvider,
    ProviderLoader, RecordedLoader, RecordedProvider,
};
pub use error::EnsembleError;
pub use models::{BoundingBox, ClassCatalog, DetectionSet, RawDetection, WeightedDetection};
pub use pipeline::{Analysis, DebugConfig, Ensemble, EnsembleBuilder};
pub use report::{Criticality, CriticalityTable, DefectReport};
