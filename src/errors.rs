use std::io;
use std::num::ParseFloatError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading config file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse JSON configuration in {path}: {source}")]
    JsonParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Configuration file not found at {path}")]
    NotFound { path: PathBuf },
    #[error("Unknown unit system: {name}")]
    UnknownUnitSystem { name: String },
}

/// Failure to get at the external data file. Always recoverable.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading data file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reasons a single merge cycle is abandoned. The record is left untouched
/// whenever one of these is returned.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("cannot read data file: {0}")]
    FileAccess(#[from] ParseError),
    #[error("invalid value '{value}' for field '{field}': {source}")]
    ValueParse {
        field: String,
        value: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("unknown unit system code {code} in field '{field}'")]
    UnknownUnitCode { field: String, code: f64 },
    #[error("record has no valid usUnits field")]
    RecordUnitSystem,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration failed: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error on record file {path}: {source}")]
    RecordIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to (de)serialize record {path}: {source}")]
    RecordJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
