// Catalog-backed sales source
//
// Reads every data file under a resolved table location. Hidden and marker
// objects (names starting with `_` or `.`, such as `_SUCCESS`) are skipped.

use anyhow::Context;
use arrow::array::RecordBatch;
use async_trait::async_trait;
use opendal::{EntryMode, Operator};
use sales2parquet_config::SourceFormat;
use sales2parquet_core::SalesSource;

use crate::catalog::ResolvedTable;
use crate::decode::{decode_csv, decode_json};
use crate::error::{CatalogError, Result};

/// Reads a catalogued table through an operator rooted at the table's bucket
pub struct CatalogSource {
    operator: Operator,
    table: ResolvedTable,
}

impl CatalogSource {
    pub fn new(operator: Operator, table: ResolvedTable) -> Self {
        Self { operator, table }
    }

    pub fn table(&self) -> &ResolvedTable {
        &self.table
    }

    /// Data files under the table location, sorted by path.
    pub async fn list_data_files(&self) -> Result<Vec<String>> {
        let dir = self.table.location.dir();
        let entries = self
            .operator
            .list_with(&dir)
            .recursive(true)
            .await
            .map_err(CatalogError::storage(&dir))?;

        let mut files: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.metadata().mode() == EntryMode::FILE)
            .map(|entry| entry.path().to_string())
            .filter(|path| !is_hidden(relative_to(path, &self.table.location.prefix)))
            .collect();
        files.sort();
        Ok(files)
    }

    async fn read_file(&self, path: &str) -> Result<Vec<RecordBatch>> {
        let buffer = self
            .operator
            .read(path)
            .await
            .map_err(CatalogError::storage(path))?;
        let data = buffer.to_vec();

        let decoded = match self.table.format {
            SourceFormat::Csv => decode_csv(&data, self.table.has_header, self.table.delimiter),
            SourceFormat::Json => decode_json(&data),
        };
        decoded.map_err(|source| CatalogError::Decode {
            path: path.to_string(),
            format: self.table.format,
            source,
        })
    }
}

#[async_trait]
impl SalesSource for CatalogSource {
    fn describe(&self) -> String {
        format!(
            "{} ({}, {})",
            self.table.table, self.table.location, self.table.format
        )
    }

    async fn read_batches(&self) -> anyhow::Result<Vec<RecordBatch>> {
        let files = self
            .list_data_files()
            .await
            .with_context(|| format!("Failed to list {}", self.table.location))?;

        if files.is_empty() {
            tracing::warn!(location = %self.table.location, "no data files found for table");
            return Ok(Vec::new());
        }

        let mut batches = Vec::new();
        for path in &files {
            let file_batches = self.read_file(path).await?;
            let rows: usize = file_batches.iter().map(|b| b.num_rows()).sum();
            tracing::debug!(path = %path, rows, "read source file");
            batches.extend(file_batches);
        }

        tracing::info!(
            table = %self.table.table,
            files = files.len(),
            batches = batches.len(),
            "read source table"
        );
        Ok(batches)
    }
}

fn relative_to<'a>(path: &'a str, prefix: &str) -> &'a str {
    path.trim_start_matches('/')
        .strip_prefix(prefix)
        .unwrap_or(path)
        .trim_start_matches('/')
}

/// True if any segment of the relative path starts with `_` or `.`.
fn is_hidden(relative: &str) -> bool {
    relative
        .split('/')
        .any(|segment| segment.starts_with('_') || segment.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_segments() {
        assert!(is_hidden("_SUCCESS"));
        assert!(is_hidden(".part-0.csv.crc"));
        assert!(is_hidden("_temporary/0/part-0.csv"));
        assert!(!is_hidden("2022/part-0.csv"));
    }

    #[test]
    fn test_relative_to_prefix() {
        assert_eq!(relative_to("sales/raw/a.csv", "sales/raw"), "a.csv");
        assert_eq!(relative_to("/sales/raw/_SUCCESS", "sales/raw"), "_SUCCESS");
        assert_eq!(relative_to("a.csv", ""), "a.csv");
    }

    #[test]
    fn test_prefix_with_underscore_is_not_hidden() {
        // Only segments below the table location count
        assert_eq!(relative_to("_landing/a.csv", "_landing"), "a.csv");
        assert!(!is_hidden(relative_to("_landing/a.csv", "_landing")));
    }
}
