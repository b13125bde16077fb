// Date derivation: year, month and day columns from the parsed timestamp

use arrow::array::{Array, ArrayRef, RecordBatch};
use arrow::compute::kernels::temporal::{date_part, DatePart};

use crate::error::{Result, TransformError};
use crate::schema::{field, normalized_sales_schema, timestamp_type};

/// Append `year`, `month` and `day` to a mapped, null-free batch.
///
/// The returned batch has the normalized sales schema.
pub fn derive_date_columns(batch: &RecordBatch) -> Result<RecordBatch> {
    let timestamps = batch
        .column_by_name(field::TIMESTAMP)
        .ok_or(TransformError::MissingColumn {
            stage: "date derivation",
            column: field::TIMESTAMP,
        })?;

    if timestamps.data_type() != &timestamp_type() {
        return Err(TransformError::UnexpectedType {
            column: field::TIMESTAMP,
            expected: timestamp_type().to_string(),
            actual: timestamps.data_type().to_string(),
        });
    }

    let year = extract(timestamps, DatePart::Year)?;
    let month = extract(timestamps, DatePart::Month)?;
    let day = extract(timestamps, DatePart::Day)?;

    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    columns.extend([year, month, day]);

    RecordBatch::try_new(normalized_sales_schema(), columns)
        .map_err(TransformError::arrow("date derivation"))
}

fn extract(timestamps: &ArrayRef, part: DatePart) -> Result<ArrayRef> {
    date_part(timestamps.as_ref(), part).map_err(TransformError::arrow("date derivation"))
}
