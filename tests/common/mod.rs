#![allow(dead_code, unused_imports)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from bladescan for tests
pub use bladescan::{
    Aggregator, BoundingBox, ClassCatalog, Deduplicator, DetectorOutcome, Ensemble,
    EnsembleConfig, EnsembleError, RawDetection, SuppressionMode, WeightedDetection,
};
