use std::path::PathBuf;

use thiserror::Error;
use wahlsim_core::{ConfigError, ValidationError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{path} line {line}: {source}")]
    Record {
        path: PathBuf,
        line: usize,
        source: ValidationError,
    },

    #[error("failed to serialize record: {0}")]
    Serialize(serde_json::Error),
}
