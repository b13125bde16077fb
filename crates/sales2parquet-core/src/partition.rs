//! Date partitioning of normalized sales records
//!
//! Rows are grouped by `(year, month, day)` and each group maps to a
//! Hive-style path segment: `year={year}/month={month}/day={day}`.
//! Values are written without zero padding, the way the columns hold them.

use arrow::array::{Array, AsArray, RecordBatch, UInt32Array};
use arrow::compute::take_record_batch;
use arrow::datatypes::Int32Type;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, TransformError};
use crate::schema::{field, PARTITION_COLUMNS};

/// Calendar date identifying one output partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

impl PartitionKey {
    pub fn new(year: i32, month: i32, day: i32) -> Self {
        Self { year, month, day }
    }

    /// Relative directory for this partition, e.g. `year=2022/month=3/day=5`.
    pub fn path(&self) -> String {
        format!(
            "{}={}/{}={}/{}={}",
            field::YEAR,
            self.year,
            field::MONTH,
            self.month,
            field::DAY,
            self.day
        )
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Rows belonging to a single date partition
#[derive(Debug, Clone)]
pub struct SalesPartition {
    pub key: PartitionKey,
    pub batch: RecordBatch,
}

impl SalesPartition {
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }
}

/// Split a normalized batch into per-date partitions, ordered by date.
///
/// When `keep_partition_columns` is false the `year`, `month` and `day`
/// columns are dropped from each partition batch since the path carries them.
pub fn partition_by_date(
    batch: &RecordBatch,
    keep_partition_columns: bool,
) -> Result<Vec<SalesPartition>> {
    let year = int_column(batch, field::YEAR)?;
    let month = int_column(batch, field::MONTH)?;
    let day = int_column(batch, field::DAY)?;

    let mut groups: BTreeMap<PartitionKey, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let key = PartitionKey::new(year[row], month[row], day[row]);
        groups.entry(key).or_default().push(take_index(row)?);
    }

    let projection: Option<Vec<usize>> = if keep_partition_columns {
        None
    } else {
        Some(
            batch
                .schema()
                .fields()
                .iter()
                .enumerate()
                .filter(|(_, f)| !PARTITION_COLUMNS.contains(&f.name().as_str()))
                .map(|(idx, _)| idx)
                .collect(),
        )
    };

    let mut partitions = Vec::with_capacity(groups.len());
    for (key, rows) in groups {
        let indices = UInt32Array::from(rows);
        let mut rows_batch =
            take_record_batch(batch, &indices).map_err(TransformError::arrow("partitioning"))?;
        if let Some(projection) = &projection {
            rows_batch = rows_batch
                .project(projection)
                .map_err(TransformError::arrow("partitioning"))?;
        }
        partitions.push(SalesPartition {
            key,
            batch: rows_batch,
        });
    }

    Ok(partitions)
}

/// `take` indices are u32.
fn take_index(row: usize) -> Result<u32> {
    u32::try_from(row).map_err(|_| TransformError::BatchTooLarge { row })
}

fn int_column<'a>(batch: &'a RecordBatch, name: &'static str) -> Result<&'a [i32]> {
    let column = batch
        .column_by_name(name)
        .ok_or(TransformError::MissingColumn {
            stage: "partitioning",
            column: name,
        })?;
    let values = column
        .as_primitive_opt::<Int32Type>()
        .ok_or_else(|| TransformError::UnexpectedType {
            column: name,
            expected: "Int32".to_string(),
            actual: column.data_type().to_string(),
        })?;
    Ok(values.values().as_ref())
}
