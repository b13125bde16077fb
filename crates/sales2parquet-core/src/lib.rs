// sales2parquet-core - Pure sales record transformation
//
// This crate holds the transformation that turns raw sales records into
// date-partitioned, normalized record batches. No I/O, no async runtime:
// reading and writing go through the `SalesSource` / `PartitionSink` traits
// implemented by the catalog and writer crates.
//
// Pipeline: map schema → drop nulls → derive dates → normalize price → partition

use arrow::array::RecordBatch;
use arrow::compute::concat_batches;
use serde::{Deserialize, Serialize};

pub mod dates;
pub mod error;
pub mod io;
pub mod mapping;
pub mod nulls;
pub mod parquet;
pub mod partition;
pub mod price;
pub mod schema;

pub use error::{Result, TransformError};
pub use io::{PartitionSink, SalesSource, WriteMode, WrittenFile};
pub use mapping::{MappingReport, SALES_MAPPINGS};
pub use partition::{PartitionKey, SalesPartition};
pub use price::strip_currency;
pub use schema::{normalized_sales_schema, raw_sales_schema};

/// Default pattern for the `timestamp` column (`yyyy-MM-dd HH:mm:ss`).
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What to do with timestamps that do not match the configured pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidTimestampPolicy {
    /// Treat the timestamp as null; the row is removed with the other nulls
    #[default]
    Drop,
    /// Abort the transformation
    Fail,
}

impl std::fmt::Display for InvalidTimestampPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidTimestampPolicy::Drop => write!(f, "drop"),
            InvalidTimestampPolicy::Fail => write!(f, "fail"),
        }
    }
}

impl std::str::FromStr for InvalidTimestampPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "drop" => Ok(InvalidTimestampPolicy::Drop),
            "fail" => Ok(InvalidTimestampPolicy::Fail),
            _ => anyhow::bail!(
                "Unsupported invalid timestamp policy: {}. Supported: drop, fail",
                s
            ),
        }
    }
}

/// Options for [`transform_sales`]
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// chrono format string used to parse `timestamp`
    pub timestamp_format: String,
    pub invalid_timestamps: InvalidTimestampPolicy,
    /// Keep `year`/`month`/`day` inside partition batches as well as in the path
    pub keep_partition_columns: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            invalid_timestamps: InvalidTimestampPolicy::Drop,
            keep_partition_columns: false,
        }
    }
}

/// Row accounting for one transformation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub rows_read: usize,
    /// Rows removed because a mapped column was null (includes failed conversions)
    pub rows_dropped: usize,
    /// Timestamps present in the source that did not match the pattern
    pub invalid_timestamps: usize,
    pub rows_out: usize,
}

/// Result of [`transform_sales`]
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub partitions: Vec<SalesPartition>,
    pub stats: TransformStats,
    pub mapping: MappingReport,
}

/// Normalize raw batches into one batch with the normalized sales schema.
///
/// Batches may come from files with different column sets; each is mapped to
/// the fixed schema before they are combined.
pub fn normalize_sales(
    batches: &[RecordBatch],
    options: &TransformOptions,
) -> Result<(RecordBatch, TransformStats, MappingReport)> {
    let mut stats = TransformStats::default();
    let mut report = MappingReport::default();
    let mut mapped = Vec::with_capacity(batches.len());

    for batch in batches {
        stats.rows_read += batch.num_rows();
        let (mapped_batch, batch_report) =
            mapping::apply_mapping(batch, &SALES_MAPPINGS, &options.timestamp_format)?;
        report.merge(batch_report);
        mapped.push(mapped_batch);
    }

    let mapped_schema = mapping::mapped_schema(&SALES_MAPPINGS);
    let combined = concat_batches(&mapped_schema, &mapped)
        .map_err(TransformError::arrow("mapping"))?;
    tracing::debug!(rows = combined.num_rows(), "mapped raw sales records");

    stats.invalid_timestamps = report.failures(schema::field::TIMESTAMP);
    if stats.invalid_timestamps > 0 {
        if options.invalid_timestamps == InvalidTimestampPolicy::Fail {
            return Err(TransformError::InvalidTimestamps {
                count: stats.invalid_timestamps,
                format: options.timestamp_format.clone(),
                sample: report.failed_conversions[schema::field::TIMESTAMP]
                    .sample
                    .clone(),
            });
        }
        tracing::warn!(
            count = stats.invalid_timestamps,
            format = %options.timestamp_format,
            "dropping rows with unparseable timestamps"
        );
    }

    let (non_null, dropped) = nulls::drop_null_rows(&combined)?;
    stats.rows_dropped = dropped;

    let dated = dates::derive_date_columns(&non_null)?;
    let normalized = price::normalize_price(&dated)?;
    stats.rows_out = normalized.num_rows();

    Ok((normalized, stats, report))
}

/// Run the full transformation: normalize then split into date partitions.
pub fn transform_sales(
    batches: &[RecordBatch],
    options: &TransformOptions,
) -> Result<TransformOutput> {
    let (normalized, stats, mapping) = normalize_sales(batches, options)?;
    let partitions = partition::partition_by_date(&normalized, options.keep_partition_columns)?;

    Ok(TransformOutput {
        partitions,
        stats,
        mapping,
    })
}
