// CatalogSource against OpenDAL's in-memory service

use arrow::array::{Array, AsArray, RecordBatch};
use opendal::{services, Operator};
use sales2parquet_catalog::{Catalog, CatalogSource};
use sales2parquet_config::{CatalogConfig, CatalogTable, SourceFormat, TableRef};
use sales2parquet_core::SalesSource;

const HEADER: &str = "card_id,customer_id,price,product_id,timestamp\n";

fn memory_operator() -> Operator {
    Operator::new(services::Memory::default())
        .expect("memory operator")
        .finish()
}

fn catalog(format: SourceFormat) -> Catalog {
    Catalog::from_config(&CatalogConfig {
        tables: vec![CatalogTable {
            database: "sales".to_string(),
            table: "raw_sales".to_string(),
            location: "s3://landing/sales/raw".to_string(),
            format,
            has_header: true,
            delimiter: ',',
        }],
    })
}

fn source(operator: &Operator, format: SourceFormat) -> CatalogSource {
    let table = catalog(format)
        .resolve(&TableRef::new("sales", "raw_sales"))
        .unwrap();
    CatalogSource::new(operator.clone(), table)
}

fn total_rows(batches: &[RecordBatch]) -> usize {
    batches.iter().map(|b| b.num_rows()).sum()
}

#[tokio::test]
async fn test_reads_all_csv_files_recursively() {
    let op = memory_operator();
    op.write(
        "sales/raw/part-0.csv",
        format!("{HEADER}1,2,$5.00,3,2022-01-01 00:00:00\n"),
    )
    .await
    .unwrap();
    op.write(
        "sales/raw/2022/03/part-1.csv",
        format!("{HEADER}4,5,$6.00,7,2022-03-05 10:00:00\n8,9,$1.00,10,2022-03-05 11:00:00\n"),
    )
    .await
    .unwrap();
    // Outside the table location
    op.write("sales/other/part-0.csv", format!("{HEADER}9,9,$9,9,2022-01-01 00:00:00\n"))
        .await
        .unwrap();

    let source = source(&op, SourceFormat::Csv);
    let batches = source.read_batches().await.unwrap();
    assert_eq!(total_rows(&batches), 3);
}

#[tokio::test]
async fn test_marker_and_hidden_files_are_skipped() {
    let op = memory_operator();
    op.write("sales/raw/part-0.csv", format!("{HEADER}1,2,$5.00,3,2022-01-01 00:00:00\n"))
        .await
        .unwrap();
    op.write("sales/raw/_SUCCESS", "").await.unwrap();
    op.write("sales/raw/.part-0.csv.crc", "garbage").await.unwrap();
    op.write("sales/raw/_temporary/part-9.csv", "not,a,csv\n\"")
        .await
        .unwrap();

    let source = source(&op, SourceFormat::Csv);
    assert_eq!(
        source.list_data_files().await.unwrap(),
        vec!["sales/raw/part-0.csv".to_string()]
    );
    assert_eq!(total_rows(&source.read_batches().await.unwrap()), 1);
}

#[tokio::test]
async fn test_reads_json_lines() {
    let op = memory_operator();
    op.write(
        "sales/raw/day.json",
        "{\"card_id\":1,\"customer_id\":2,\"price\":\"$5.00\",\"product_id\":3,\"timestamp\":\"2022-01-01 00:00:00\"}\n",
    )
    .await
    .unwrap();

    let batches = source(&op, SourceFormat::Json).read_batches().await.unwrap();
    assert_eq!(total_rows(&batches), 1);
    let card_ids = batches[0].column_by_name("card_id").unwrap().as_string::<i32>();
    assert_eq!(card_ids.value(0), "1");
    assert_eq!(card_ids.null_count(), 0);
}

#[tokio::test]
async fn test_empty_table_is_not_an_error() {
    let op = memory_operator();
    let batches = source(&op, SourceFormat::Csv).read_batches().await.unwrap();
    assert!(batches.is_empty());
}

#[tokio::test]
async fn test_undecodable_file_names_path() {
    let op = memory_operator();
    op.write("sales/raw/broken.json", "{not json").await.unwrap();

    let err = source(&op, SourceFormat::Json)
        .read_batches()
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("sales/raw/broken.json"));
}

#[test]
fn test_describe_names_table_and_location() {
    let op = memory_operator();
    let description = source(&op, SourceFormat::Csv).describe();
    assert!(description.contains("sales.raw_sales"));
    assert!(description.contains("s3://landing/sales/raw"));
}
