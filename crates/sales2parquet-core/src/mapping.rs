// Column mapping from raw text columns to the typed sales schema
//
// Each mapping names a source column, a target column and a target type.
// Conversions are safe casts: a value that cannot be converted becomes null
// and is counted, so the null-dropping stage removes the row afterwards.

use arrow::array::{
    new_null_array, Array, ArrayRef, AsArray, RecordBatch, StringArray,
    TimestampMicrosecondArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::util::display::array_value_to_string;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Result, TransformError};
use crate::schema::{field, timestamp_type};

/// Concrete type a mapped column is resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Long,
    String,
    Timestamp,
}

impl TargetType {
    pub fn data_type(&self) -> DataType {
        match self {
            TargetType::Long => DataType::Int64,
            TargetType::String => DataType::Utf8,
            TargetType::Timestamp => timestamp_type(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub source: &'static str,
    pub target: &'static str,
    pub target_type: TargetType,
}

impl ColumnMapping {
    const fn new(source: &'static str, target: &'static str, target_type: TargetType) -> Self {
        Self {
            source,
            target,
            target_type,
        }
    }
}

/// The fixed mapping applied to raw sales records.
pub const SALES_MAPPINGS: [ColumnMapping; 5] = [
    ColumnMapping::new(field::CARD_ID, field::CARD_ID, TargetType::Long),
    ColumnMapping::new(field::CUSTOMER_ID, field::CUSTOMER_ID, TargetType::Long),
    ColumnMapping::new(field::PRICE, field::PRICE, TargetType::String),
    ColumnMapping::new(field::PRODUCT_ID, field::PRODUCT_ID, TargetType::Long),
    ColumnMapping::new(field::TIMESTAMP, field::TIMESTAMP, TargetType::Timestamp),
];

/// Values of one column that were present in the source but failed conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFailures {
    pub count: usize,
    pub sample: Option<String>,
}

/// What the mapping stage had to give up on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingReport {
    pub failed_conversions: BTreeMap<&'static str, ColumnFailures>,
    pub missing_columns: Vec<&'static str>,
}

impl MappingReport {
    /// Number of failed conversions for a target column.
    pub fn failures(&self, column: &str) -> usize {
        self.failed_conversions
            .get(column)
            .map(|f| f.count)
            .unwrap_or(0)
    }

    pub fn total_failures(&self) -> usize {
        self.failed_conversions.values().map(|f| f.count).sum()
    }

    pub fn merge(&mut self, other: MappingReport) {
        for (column, failures) in other.failed_conversions {
            let entry = self.failed_conversions.entry(column).or_default();
            entry.count += failures.count;
            if entry.sample.is_none() {
                entry.sample = failures.sample;
            }
        }
        for column in other.missing_columns {
            if !self.missing_columns.contains(&column) {
                self.missing_columns.push(column);
            }
        }
    }
}

/// Build the output schema of a mapping (all columns nullable).
pub fn mapped_schema(mappings: &[ColumnMapping]) -> SchemaRef {
    let fields: Vec<Field> = mappings
        .iter()
        .map(|m| Field::new(m.target, m.target_type.data_type(), true))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Apply `mappings` to a raw batch, resolving every column to its target type.
pub fn apply_mapping(
    batch: &RecordBatch,
    mappings: &[ColumnMapping],
    timestamp_format: &str,
) -> Result<(RecordBatch, MappingReport)> {
    let mut report = MappingReport::default();
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(mappings.len());

    for mapping in mappings {
        let Some(source) = batch.column_by_name(mapping.source) else {
            tracing::debug!(column = mapping.source, "source column absent; mapping to nulls");
            report.missing_columns.push(mapping.source);
            columns.push(new_null_array(
                &mapping.target_type.data_type(),
                batch.num_rows(),
            ));
            continue;
        };

        let resolved = resolve_column(source, mapping.target_type, timestamp_format)?;
        let failures = conversion_failures(source, &resolved)?;
        if failures.count > 0 {
            report.failed_conversions.insert(mapping.target, failures);
        }
        columns.push(resolved);
    }

    let mapped = RecordBatch::try_new(mapped_schema(mappings), columns)
        .map_err(TransformError::arrow("mapping"))?;
    Ok((mapped, report))
}

fn resolve_column(source: &ArrayRef, target: TargetType, timestamp_format: &str) -> Result<ArrayRef> {
    let resolved = match (target, source.data_type()) {
        (TargetType::Timestamp, DataType::Utf8) => Arc::new(parse_timestamps(
            source.as_string::<i32>(),
            timestamp_format,
        )) as ArrayRef,
        (TargetType::Timestamp, DataType::LargeUtf8 | DataType::Utf8View) => {
            let text = cast(source, &DataType::Utf8).map_err(TransformError::arrow("mapping"))?;
            Arc::new(parse_timestamps(text.as_string::<i32>(), timestamp_format)) as ArrayRef
        }
        (_, actual) if actual == &target.data_type() => Arc::clone(source),
        (_, _) => cast(source, &target.data_type()).map_err(TransformError::arrow("mapping"))?,
    };
    Ok(resolved)
}

fn parse_timestamps(values: &StringArray, format: &str) -> TimestampMicrosecondArray {
    values
        .iter()
        .map(|v| v.and_then(|s| parse_timestamp_micros(s, format)))
        .collect()
}

/// Parse a timestamp string with a chrono format, returning microseconds since epoch.
pub fn parse_timestamp_micros(value: &str, format: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(value, format)
        .ok()
        .map(|dt| dt.and_utc().timestamp_micros())
}

fn conversion_failures(source: &ArrayRef, resolved: &ArrayRef) -> Result<ColumnFailures> {
    let count = resolved.null_count().saturating_sub(source.null_count());
    if count == 0 {
        return Ok(ColumnFailures::default());
    }

    let first = (0..source.len()).find(|&i| source.is_valid(i) && resolved.is_null(i));
    let sample = match first {
        Some(i) => Some(
            array_value_to_string(source.as_ref(), i).map_err(TransformError::arrow("mapping"))?,
        ),
        None => None,
    };

    Ok(ColumnFailures { count, sample })
}
