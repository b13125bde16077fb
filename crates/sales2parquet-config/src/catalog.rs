// Catalog entries: logical (database, table) names mapped to a storage
// location and a file format.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub tables: Vec<CatalogTable>,
}

impl CatalogConfig {
    pub fn find(&self, table: &TableRef) -> Option<&CatalogTable> {
        self.tables
            .iter()
            .find(|t| t.database == table.database && t.table == table.table)
    }
}

/// One `[[catalog.tables]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogTable {
    pub database: String,
    pub table: String,
    /// `s3://bucket/prefix` or `bucket/prefix`
    pub location: String,
    pub format: SourceFormat,
    #[serde(default = "default_has_header")]
    pub has_header: bool,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_has_header() -> bool {
    true
}

fn default_delimiter() -> char {
    ','
}

impl CatalogTable {
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.database, &self.table)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    /// Newline-delimited JSON objects
    Json,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Csv => write!(f, "csv"),
            SourceFormat::Json => write!(f, "json"),
        }
    }
}

/// Qualified table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub database: String,
    pub table: String,
}

impl TableRef {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}
