// Source and sink seams for the sales pipeline
//
// The transform itself is pure; reading raw records and writing partitions
// are collaborators injected by the job runner.
//
// Implementations:
// - CatalogSource (sales2parquet-catalog): catalogued CSV / JSON files
// - PartitionedParquetWriter (sales2parquet-writer): Hive-style Parquet output

use anyhow::Result;
use arrow::array::RecordBatch;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::partition::SalesPartition;

/// Supplies the raw sales records for one run
#[async_trait]
pub trait SalesSource: Send + Sync {
    /// Human-readable description of where records come from, for logs
    fn describe(&self) -> String;

    /// Read every raw record batch of the source
    async fn read_batches(&self) -> Result<Vec<RecordBatch>>;
}

/// Persists date partitions
#[async_trait]
pub trait PartitionSink: Send + Sync {
    /// Human-readable description of the output location, for logs
    fn describe(&self) -> String;

    /// Write one partition, returning the files created
    async fn write_partition(&self, partition: &SalesPartition) -> Result<Vec<WrittenFile>>;
}

/// A file produced by a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: String,
    pub rows: usize,
    pub bytes: usize,
}

/// How a sink treats data already present in a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Add new files next to existing ones
    #[default]
    Append,
    /// Replace the contents of every partition the run writes
    Overwrite,
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::Append => write!(f, "append"),
            WriteMode::Overwrite => write!(f, "overwrite"),
        }
    }
}

impl std::str::FromStr for WriteMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "append" => Ok(WriteMode::Append),
            "overwrite" => Ok(WriteMode::Overwrite),
            _ => anyhow::bail!("Unsupported write mode: {}. Supported: append, overwrite", s),
        }
    }
}
