// Decoding raw sales files into all-text record batches
//
// Every column is read as Utf8 so that typing happens in one place, the
// core mapping stage. CSV columns take their names from the header row;
// JSON lines are read against the raw sales schema with primitives coerced
// to text.

use arrow::array::RecordBatch;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use sales2parquet_core::raw_sales_schema;
use std::io::Cursor;
use std::sync::Arc;

/// Decode a CSV file. Without a header the columns are taken to be in raw
/// schema order.
pub fn decode_csv(
    data: &[u8],
    has_header: bool,
    delimiter: u8,
) -> Result<Vec<RecordBatch>, ArrowError> {
    if is_blank(data) {
        return Ok(Vec::new());
    }

    let format = Format::default()
        .with_header(has_header)
        .with_delimiter(delimiter);

    let schema = if has_header {
        let (inferred, _) = format.infer_schema(Cursor::new(data), Some(1))?;
        text_schema(&inferred)
    } else {
        raw_sales_schema()
    };

    let reader = arrow::csv::ReaderBuilder::new(schema)
        .with_format(format)
        .build(Cursor::new(data))?;
    reader.collect()
}

/// Decode newline-delimited JSON objects. Unknown keys are ignored and
/// absent keys read as null.
pub fn decode_json(data: &[u8]) -> Result<Vec<RecordBatch>, ArrowError> {
    if is_blank(data) {
        return Ok(Vec::new());
    }

    let reader = arrow::json::ReaderBuilder::new(raw_sales_schema())
        .with_coerce_primitive(true)
        .build(Cursor::new(data))?;
    reader.collect()
}

fn text_schema(schema: &Schema) -> SchemaRef {
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| Field::new(f.name().trim(), DataType::Utf8, true))
        .collect();
    Arc::new(Schema::new(fields))
}

fn is_blank(data: &[u8]) -> bool {
    data.iter().all(|b| b.is_ascii_whitespace())
}
