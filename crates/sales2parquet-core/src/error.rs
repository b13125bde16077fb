//! Error types for the sales transformation

use arrow::error::ArrowError;
use thiserror::Error;

/// Errors raised while transforming sales records
#[derive(Debug, Error)]
pub enum TransformError {
    /// An Arrow kernel failed
    #[error("arrow error in {stage}: {source}")]
    Arrow {
        stage: &'static str,
        #[source]
        source: ArrowError,
    },

    /// A column required by a later stage is absent
    #[error("column '{column}' missing from {stage} output")]
    MissingColumn {
        stage: &'static str,
        column: &'static str,
    },

    /// A column has a different type than the stage expects
    #[error("column '{column}' has type {actual}, expected {expected}")]
    UnexpectedType {
        column: &'static str,
        expected: String,
        actual: String,
    },

    /// Timestamps failed to parse and the policy says to abort
    #[error("{count} timestamp value(s) did not match '{format}' (first: {sample:?})")]
    InvalidTimestamps {
        count: usize,
        format: String,
        sample: Option<String>,
    },

    /// Row index does not fit Arrow's u32 take indices
    #[error("row {row} exceeds the u32 index range used for partitioning")]
    BatchTooLarge { row: usize },

    /// Parquet encoding failed
    #[error("parquet encoding failed: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl TransformError {
    pub(crate) fn arrow(stage: &'static str) -> impl FnOnce(ArrowError) -> Self {
        move |source| Self::Arrow { stage, source }
    }
}

/// Result type alias for TransformError
pub type Result<T> = std::result::Result<T, TransformError>;
