// Price normalization: strip currency symbols, keep the value as text

use arrow::array::{Array, ArrayRef, AsArray, RecordBatch, StringArray};
use std::borrow::Cow;
use std::sync::Arc;

use crate::error::{Result, TransformError};
use crate::schema::field;

const CURRENCY_SYMBOL: char = '$';

/// Remove every `$` from a price string. Other characters are left alone and
/// the remainder is not validated as a number.
pub fn strip_currency(price: &str) -> Cow<'_, str> {
    if price.contains(CURRENCY_SYMBOL) {
        Cow::Owned(price.replace(CURRENCY_SYMBOL, ""))
    } else {
        Cow::Borrowed(price)
    }
}

/// Apply [`strip_currency`] to every value of a price column. Nulls stay null.
pub fn normalize_price_column(prices: &StringArray) -> StringArray {
    prices.iter().map(|p| p.map(strip_currency)).collect()
}

/// Replace the `price` column of a batch with its normalized values.
pub fn normalize_price(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let (idx, _) = schema
        .column_with_name(field::PRICE)
        .ok_or(TransformError::MissingColumn {
            stage: "price normalization",
            column: field::PRICE,
        })?;

    let prices = batch
        .column(idx)
        .as_string_opt::<i32>()
        .ok_or_else(|| TransformError::UnexpectedType {
            column: field::PRICE,
            expected: "Utf8".to_string(),
            actual: batch.column(idx).data_type().to_string(),
        })?;

    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    columns[idx] = Arc::new(normalize_price_column(prices));

    RecordBatch::try_new(schema.clone(), columns)
        .map_err(TransformError::arrow("price normalization"))
}
