//! Error types for catalog resolution and source reading

use arrow::error::ArrowError;
use sales2parquet_config::SourceFormat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// No catalog entry for the requested table
    #[error("table {database}.{table} not found in catalog (declared: {declared})")]
    TableNotFound {
        database: String,
        table: String,
        declared: String,
    },

    #[error("invalid location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("table {table}: CSV delimiter '{delimiter}' is not a single ASCII byte")]
    InvalidDelimiter { table: String, delimiter: char },

    #[error("storage error at '{path}': {source}")]
    Storage {
        path: String,
        #[source]
        source: opendal::Error,
    },

    #[error("failed to decode {format} file '{path}': {source}")]
    Decode {
        path: String,
        format: SourceFormat,
        #[source]
        source: ArrowError,
    },
}

impl CatalogError {
    pub(crate) fn storage(path: impl Into<String>) -> impl FnOnce(opendal::Error) -> Self {
        let path = path.into();
        move |source| Self::Storage { path, source }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
