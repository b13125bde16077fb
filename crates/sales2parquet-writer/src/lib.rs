//! Date-partitioned Parquet sink for sales2parquet
//!
//! Implements the core `PartitionSink` trait on top of an OpenDAL operator,
//! writing one Parquet file per date partition in Hive-style directories.

pub mod error;
mod write;

pub use error::{ErrorCode, Result, WriterError};
pub use write::PartitionedParquetWriter;
