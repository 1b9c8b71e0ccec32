use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Could not read input file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Input file '{0}' has no #CHROM header line")]
    MissingHeader(PathBuf),
    #[error("Input assembly '{found}' does not match configured reference '{expected}'")]
    MismatchedAssembly { expected: String, found: String },
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
    #[error("Required FORMAT field '{field}' missing at line {line}")]
    MissingFormatField { field: String, line: usize },
    #[error("Input file has no sample columns")]
    NoSamples,
    #[error("Normal sample requested but input carries only {0} sample column(s)")]
    MissingNormalSample(usize),
    #[error("Could not parse annotation sidecar '{path}': {source}")]
    AnnotationParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
