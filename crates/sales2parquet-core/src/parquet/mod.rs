// Parquet file encoding
//
// This module handles writing Arrow RecordBatches to Parquet format.

pub mod encoding;

pub use encoding::{
    encode_parquet, write_parquet_into, writer_properties, DEFAULT_ROW_GROUP_SIZE,
    PARQUET_FILE_SUFFIX,
};
