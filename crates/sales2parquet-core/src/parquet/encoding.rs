use arrow::array::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;
use std::io::Write;

use crate::error::Result;
use crate::schema::{SCHEMA_VERSION, SCHEMA_VERSION_KEY};

pub const DEFAULT_ROW_GROUP_SIZE: usize = 128 * 1024;

/// File extension matching the codec the writer properties select.
pub const PARQUET_FILE_SUFFIX: &str = ".snappy.parquet";

/// Build writer properties for sales partition files.
///
/// Configuration:
/// - Snappy compression
/// - Dictionary encoding enabled
/// - Page-level statistics for predicate pushdown
/// - Writer and schema versions embedded in the key/value metadata
pub fn writer_properties(max_row_group_size: usize) -> WriterProperties {
    let metadata = vec![
        KeyValue {
            key: "sales2parquet.version".to_string(),
            value: Some(env!("CARGO_PKG_VERSION").to_string()),
        },
        KeyValue {
            key: SCHEMA_VERSION_KEY.to_string(),
            value: Some(SCHEMA_VERSION.to_string()),
        },
    ];

    let row_group_size = if max_row_group_size == 0 {
        DEFAULT_ROW_GROUP_SIZE
    } else {
        max_row_group_size
    };

    WriterProperties::builder()
        .set_dictionary_enabled(true)
        .set_statistics_enabled(EnabledStatistics::Page)
        .set_compression(Compression::SNAPPY)
        .set_data_page_size_limit(256 * 1024)
        .set_write_batch_size(32 * 1024)
        .set_max_row_group_size(row_group_size)
        .set_dictionary_page_size_limit(128 * 1024)
        .set_key_value_metadata(Some(metadata))
        .build()
}

/// Write a `RecordBatch` as a complete Parquet file into any `Write` sink.
pub fn write_parquet_into<W>(
    batch: &RecordBatch,
    properties: WriterProperties,
    writer: &mut W,
) -> Result<()>
where
    W: Write + Send,
{
    let mut arrow_writer = ArrowWriter::try_new(writer, batch.schema(), Some(properties))?;
    arrow_writer.write(batch)?;
    arrow_writer.close()?;
    Ok(())
}

/// Encode a `RecordBatch` into an in-memory Parquet file.
pub fn encode_parquet(batch: &RecordBatch, properties: WriterProperties) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_parquet_into(batch, properties, &mut buffer)?;
    Ok(buffer)
}
