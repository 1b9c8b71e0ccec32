use std::path::PathBuf;

use config::ConfigError;
use thiserror::Error;
use validator::ValidationErrors;

use crate::ingest::error::IngestError;
use crate::kb::error::KbError;

/// Failures while assembling the engine before any variant is processed.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("Could not find config file at '{0}'")]
    NoConfigFileFound(PathBuf),
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Kb(#[from] KbError),
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("Could not parse sample metadata at '{path}': {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Could not parse purity file at '{path}': {source}")]
    PurityParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Run-level pipeline failures. Per-variant processing errors never surface
/// here; they are isolated into the affected bundle's `errors` array.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Kb(#[from] KbError),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("Could not serialize run report: {0}")]
    Serialize(#[from] serde_json::Error),
}
