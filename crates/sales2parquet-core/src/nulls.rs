// Null dropping: a row reaches the output only if every mapped column has a value

use arrow::array::{BooleanArray, RecordBatch};
use arrow::compute::{and, filter_record_batch, is_not_null};

use crate::error::{Result, TransformError};

/// Remove every row that has a null in any column of `batch`.
///
/// Returns the filtered batch and the number of rows removed.
pub fn drop_null_rows(batch: &RecordBatch) -> Result<(RecordBatch, usize)> {
    if batch.num_rows() == 0 || batch.columns().iter().all(|c| c.null_count() == 0) {
        return Ok((batch.clone(), 0));
    }

    let mut keep = BooleanArray::from(vec![true; batch.num_rows()]);
    for column in batch.columns() {
        if column.null_count() == 0 {
            continue;
        }
        let present = is_not_null(column.as_ref()).map_err(TransformError::arrow("drop nulls"))?;
        keep = and(&keep, &present).map_err(TransformError::arrow("drop nulls"))?;
    }

    let filtered = filter_record_batch(batch, &keep).map_err(TransformError::arrow("drop nulls"))?;
    let dropped = batch.num_rows() - filtered.num_rows();
    Ok((filtered, dropped))
}
