use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnsembleError {
    #[error("detector '{name}' is unavailable: {reason}")]
    DetectorUnavailable { name: String, reason: String },

    #[error("detector '{name}' failed during inference: {reason}")]
    DetectorInference { name: String, reason: String },

    #[error("no detectors available: every configured detector failed to load")]
    NoDetectorsAvailable,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EnsembleError>;
