//! Error types for the adapter.

use std::time::Duration;

use sqlbridge_core::QueryError;
use thiserror::Error;

/// Adapter errors.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Driver error, passed through unchanged.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The call was rejected before any statement was sent.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// No model is registered under this name.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// A statement or migration batch ran past its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// One or more models failed to migrate. The other models of the batch
    /// were still migrated.
    #[error(
        "migration failed for {} model(s):\n{}",
        .0.len(),
        .0.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n")
    )]
    Migration(Vec<ModelMigrationError>),
}

/// The failure of a single model within a migration batch.
#[derive(Debug, Error)]
#[error("{model}: {source}")]
pub struct ModelMigrationError {
    /// Model name.
    pub model: String,
    /// What went wrong.
    pub source: Box<AdapterError>,
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
