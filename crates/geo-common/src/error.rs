//! Error types for geoscope ingestion.

use thiserror::Error;

/// Result type alias using IngestError.
pub type IngestResult<T> = Result<T, IngestError>;

/// Primary error type for dataset ingestion.
///
/// Display strings are written to be shown to the user verbatim: structural
/// failures carry the headers, variable names, or observed lengths needed to
/// diagnose the source without re-inspecting the raw file.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Dispatch Errors ===
    #[error("Input file is empty")]
    EmptyInput,

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    // === Structural Parse Errors ===
    #[error("Input could not be parsed: {0}")]
    MalformedInput(String),

    #[error("Unrecognized record structure: {0}")]
    InvalidStructure(String),

    #[error("No latitude/longitude columns found. Available columns: {}", .headers.join(", "))]
    MissingCoordinateColumns { headers: Vec<String> },

    #[error("No latitude/longitude variables found. Available variables: {}", .variables.join(", "))]
    CoordinateVariablesNotFound { variables: Vec<String> },

    #[error("No suitable value variable found.\n{0}")]
    ValueVariableNotFound(String),

    #[error("No dataset found for {role}. Tried paths: {}", .tried.join(", "))]
    RequiredDatasetsNotFound { role: String, tried: Vec<String> },

    #[error(
        "Incompatible array lengths: lat={lat_len}, lon={lon_len}, value={value_len}. \
         Expected equal lengths or value = lat * lon"
    )]
    IncompatibleDimensions {
        lat_len: usize,
        lon_len: usize,
        value_len: usize,
    },

    // === Empty-After-Validation Errors ===
    #[error("No valid data rows survived validation")]
    NoValidRecords,

    #[error("No valid grid points extracted: {0}")]
    NoValidGridPoints(String),

    #[error("No valid points extracted from container datasets")]
    NoValidPoints,

    // === Cache / Field Switching Errors ===
    #[error("No cached source data for '{0}'. Re-upload the file to switch fields")]
    SourceNotCached(String),

    #[error("Unknown field '{field}'. Available fields: {}", .available.join(", "))]
    UnknownField { field: String, available: Vec<String> },

    // === Container / I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read container: {0}")]
    ContainerRead(String),
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::MalformedInput(err.to_string())
    }
}
