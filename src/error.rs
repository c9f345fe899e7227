//! Error types for target encoding operations.

use thiserror::Error;

/// Error type for fitting, transforming, and (de)serializing target encoders.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// Invalid hyperparameter or configuration value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// A column required by the configuration is not present in the table.
    #[error("Missing column: {0}")]
    MissingColumn(String),
    /// A column exists but has the wrong kind for the requested role.
    #[error("Column type mismatch for '{column}': expected {expected}")]
    ColumnType { column: String, expected: String },
    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),
    /// Leakage strategy value that does not name a supported strategy.
    #[error("Unsupported data leakage handling strategy: {0}")]
    UnsupportedStrategy(String),
    /// A required artifact section could not be found.
    #[error("Missing artifact section: {0}")]
    MissingSection(String),
    /// An artifact section exists but its contents are malformed.
    #[error("Malformed artifact section {section} (line {line}): {message}")]
    ArtifactFormat {
        section: String,
        line: usize,
        message: String,
    },
    /// Serialization or deserialization error from an external format.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The caller asked the operation to stop between stages.
    #[error("Operation aborted by caller")]
    Aborted,
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncodingError {
    pub(crate) fn format(section: &str, line: usize, message: impl Into<String>) -> Self {
        EncodingError::ArtifactFormat {
            section: section.to_string(),
            line,
            message: message.into(),
        }
    }
}

impl From<bincode::Error> for EncodingError {
    fn from(err: bincode::Error) -> Self {
        EncodingError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for EncodingError {
    fn from(err: toml::de::Error) -> Self {
        EncodingError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for EncodingError {
    fn from(err: csv::Error) -> Self {
        EncodingError::Serialization(err.to_string())
    }
}
