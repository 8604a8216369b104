//! Caller-contract errors.

use thiserror::Error;

/// Errors raised while compiling a statement, before any SQL is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A DELETE was requested without a `where` condition.
    #[error("Undefined cond.where: refusing to delete without a condition")]
    MissingWhere,

    /// An UPDATE was requested on data without an `id`.
    #[error("cannot update {model}: data has no id")]
    MissingId {
        /// The model name.
        model: String,
    },

    /// An UPDATE was requested but the data holds no declared property.
    #[error("nothing to update on {model}: no declared property in data")]
    EmptyUpdate {
        /// The model name.
        model: String,
    },

    /// The model was never registered with `define`.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// A condition value could not be compiled.
    #[error("invalid condition: {0}")]
    InvalidCondition(String),
}

/// Result alias for compilation.
pub type Result<T> = std::result::Result<T, QueryError>;
