//! Error types for model file loading.

use std::path::PathBuf;

/// Errors that can occur while reading a model file.
#[derive(Debug, thiserror::Error)]
pub enum ModelFileError {
    /// The file could not be read.
    #[error("Failed to read model file '{path}': {source}")]
    Io {
        /// Path to the model file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The file is not a valid list of models.
    #[error("Failed to parse model file '{path}': {source}")]
    Parse {
        /// Path to the model file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Two models share a name.
    #[error("Model '{0}' is defined more than once")]
    DuplicateModel(String),
}

/// Result type for model file operations.
pub type Result<T> = std::result::Result<T, ModelFileError>;
