use std::path::PathBuf;

use thiserror::Error;

/// Reference-data errors are fatal at startup; no variant is processed when
/// any KB file is missing or corrupt.
#[derive(Debug, Error)]
pub enum KbError {
    #[error("Knowledge-base directory not found at '{0}'")]
    MissingDirectory(PathBuf),
    #[error("Could not read knowledge-base file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not parse knowledge-base file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Duplicate knowledge base '{0}' in snapshot")]
    DuplicateKb(String),
    #[error("Knowledge base '{0}' is not part of the loaded snapshot")]
    UnknownKb(String),
}
