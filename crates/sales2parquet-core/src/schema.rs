// Arrow schemas for raw and normalized sales records
//
// Raw records are read with every column as text so that a column holding a
// number in one file and a string in another resolves to one structure.
// Normalized records carry the concrete types plus the derived date columns.

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Column names shared by the raw and normalized schemas.
pub mod field {
    pub const CARD_ID: &str = "card_id";
    pub const CUSTOMER_ID: &str = "customer_id";
    pub const PRICE: &str = "price";
    pub const PRODUCT_ID: &str = "product_id";
    pub const TIMESTAMP: &str = "timestamp";
    pub const YEAR: &str = "year";
    pub const MONTH: &str = "month";
    pub const DAY: &str = "day";
}

/// Columns the output is partitioned by, in path order.
pub const PARTITION_COLUMNS: [&str; 3] = [field::YEAR, field::MONTH, field::DAY];

pub const SCHEMA_VERSION: &str = "1.0.0";
pub const SCHEMA_VERSION_KEY: &str = "sales2parquet.schema_version";

/// Arrow type of the parsed `timestamp` column.
pub fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, None)
}

/// Schema used to decode source files: every known column as nullable text.
pub fn raw_sales_schema() -> SchemaRef {
    static SCHEMA: OnceLock<SchemaRef> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| {
        Arc::new(Schema::new(vec![
            Field::new(field::CARD_ID, DataType::Utf8, true),
            Field::new(field::CUSTOMER_ID, DataType::Utf8, true),
            Field::new(field::PRICE, DataType::Utf8, true),
            Field::new(field::PRODUCT_ID, DataType::Utf8, true),
            Field::new(field::TIMESTAMP, DataType::Utf8, true),
        ]))
    }))
}

/// Returns the cached schema of fully normalized sales records.
pub fn normalized_sales_schema() -> SchemaRef {
    static SCHEMA: OnceLock<SchemaRef> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| Arc::new(build_normalized_schema())))
}

fn build_normalized_schema() -> Schema {
    let fields = vec![
        Field::new(field::CARD_ID, DataType::Int64, false),
        Field::new(field::CUSTOMER_ID, DataType::Int64, false),
        // Kept as text: currency symbols are stripped, the value is not parsed
        Field::new(field::PRICE, DataType::Utf8, false),
        Field::new(field::PRODUCT_ID, DataType::Int64, false),
        Field::new(field::TIMESTAMP, timestamp_type(), false),
        Field::new(field::YEAR, DataType::Int32, false),
        Field::new(field::MONTH, DataType::Int32, false),
        Field::new(field::DAY, DataType::Int32, false),
    ];

    let metadata = HashMap::from([(
        SCHEMA_VERSION_KEY.to_string(),
        SCHEMA_VERSION.to_string(),
    )]);

    Schema::new_with_metadata(fields, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_schema_layout() {
        let schema = normalized_sales_schema();
        assert_eq!(schema.fields().len(), 8);
        assert_eq!(schema.field(0).name(), field::CARD_ID);
        assert_eq!(schema.field(2).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(4).data_type(), &timestamp_type());
        assert_eq!(schema.field(5).name(), field::YEAR);
        assert!(schema.fields().iter().all(|f| !f.is_nullable()));
        assert_eq!(
            schema.metadata().get(SCHEMA_VERSION_KEY).map(String::as_str),
            Some(SCHEMA_VERSION)
        );
    }

    #[test]
    fn test_raw_schema_is_all_text() {
        let schema = raw_sales_schema();
        assert!(schema
            .fields()
            .iter()
            .all(|f| f.data_type() == &DataType::Utf8 && f.is_nullable()));
    }
}
