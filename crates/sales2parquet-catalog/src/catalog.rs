// Catalog lookup: (database, table) → storage location + file format

use sales2parquet_config::{CatalogConfig, CatalogTable, SourceFormat, TableRef};
use url::Url;

use crate::error::{CatalogError, Result};

const S3_SCHEME: &str = "s3://";

// Placeholder delimiter for JSON sources
const DEFAULT_DELIMITER: u8 = b',';

/// A bucket plus a key prefix inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub bucket: String,
    /// Key prefix without leading or trailing slashes; empty for the bucket root
    pub prefix: String,
}

impl Location {
    /// Directory path to list, in OpenDAL form (`prefix/` or `/` for the root).
    pub fn dir(&self) -> String {
        if self.prefix.is_empty() {
            "/".to_string()
        } else {
            format!("{}/", self.prefix)
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}{}", S3_SCHEME, self.bucket)
        } else {
            write!(f, "{}{}/{}", S3_SCHEME, self.bucket, self.prefix)
        }
    }
}

/// Parse `s3://bucket/prefix` or `bucket/prefix`.
pub fn parse_location(location: &str) -> Result<Location> {
    let invalid = |reason: &str| CatalogError::InvalidLocation {
        location: location.to_string(),
        reason: reason.to_string(),
    };

    let (bucket, prefix) = match Url::parse(location) {
        Ok(url) => {
            if !matches!(url.scheme(), "s3" | "s3a") {
                return Err(invalid(&format!("unsupported scheme '{}'", url.scheme())));
            }
            let bucket = url.host_str().unwrap_or_default().to_string();
            (bucket, url.path().to_string())
        }
        Err(_) => {
            let rest = location.trim_start_matches('/');
            let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
            (bucket.to_string(), prefix.to_string())
        }
    };

    if bucket.is_empty() {
        return Err(invalid("missing bucket"));
    }

    Ok(Location {
        bucket,
        prefix: prefix.trim_matches('/').to_string(),
    })
}

/// A catalog entry resolved to something a source can read
#[derive(Debug, Clone)]
pub struct ResolvedTable {
    pub table: TableRef,
    pub location: Location,
    pub format: SourceFormat,
    pub has_header: bool,
    /// Field separator for CSV; ignored for JSON lines
    pub delimiter: u8,
}

impl ResolvedTable {
    fn from_entry(entry: &CatalogTable) -> Result<Self> {
        let location = parse_location(&entry.location)?;
        let delimiter = match entry.format {
            SourceFormat::Csv => u8::try_from(entry.delimiter)
                .ok()
                .filter(u8::is_ascii)
                .ok_or_else(|| CatalogError::InvalidDelimiter {
                    table: entry.table_ref().to_string(),
                    delimiter: entry.delimiter,
                })?,
            SourceFormat::Json => DEFAULT_DELIMITER,
        };

        Ok(Self {
            table: entry.table_ref(),
            location,
            format: entry.format,
            has_header: entry.has_header,
            delimiter,
        })
    }
}

/// Declarative catalog built from configuration
#[derive(Debug, Clone)]
pub struct Catalog {
    config: CatalogConfig,
}

impl Catalog {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn resolve(&self, table: &TableRef) -> Result<ResolvedTable> {
        let entry = self
            .config
            .find(table)
            .ok_or_else(|| CatalogError::TableNotFound {
                database: table.database.clone(),
                table: table.table.clone(),
                declared: self.declared(),
            })?;

        let resolved = ResolvedTable::from_entry(entry)?;
        tracing::debug!(
            table = %table,
            location = %resolved.location,
            format = %resolved.format,
            "resolved catalog table"
        );
        Ok(resolved)
    }

    fn declared(&self) -> String {
        if self.config.tables.is_empty() {
            return "none".to_string();
        }
        self.config
            .tables
            .iter()
            .map(|t| t.table_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(database: &str, table: &str, location: &str) -> CatalogTable {
        CatalogTable {
            database: database.to_string(),
            table: table.to_string(),
            location: location.to_string(),
            format: SourceFormat::Csv,
            has_header: true,
            delimiter: ',',
        }
    }

    #[test]
    fn test_parse_location_forms() {
        assert_eq!(
            parse_location("s3://landing/sales/raw/").unwrap(),
            Location {
                bucket: "landing".into(),
                prefix: "sales/raw".into()
            }
        );
        assert_eq!(
            parse_location("landing/sales").unwrap(),
            Location {
                bucket: "landing".into(),
                prefix: "sales".into()
            }
        );
        assert_eq!(parse_location("s3://landing").unwrap().prefix, "");
        assert!(parse_location("gs://landing/sales").is_err());
        assert!(parse_location("s3:///sales").is_err());
        assert!(parse_location("").is_err());
    }

    #[test]
    fn test_parse_location_scheme_is_case_insensitive() {
        let expected = Location {
            bucket: "landing".into(),
            prefix: "sales".into(),
        };
        assert_eq!(parse_location("S3://landing/sales").unwrap(), expected);
        assert_eq!(parse_location("S3A://landing/sales/").unwrap(), expected);
        assert_eq!(parse_location("s3a://landing").unwrap().prefix, "");
    }

    #[test]
    fn test_location_dir() {
        assert_eq!(parse_location("b/sales/raw").unwrap().dir(), "sales/raw/");
        assert_eq!(parse_location("b").unwrap().dir(), "/");
    }

    #[test]
    fn test_resolve_known_table() {
        let catalog = Catalog::from_config(&CatalogConfig {
            tables: vec![entry("sales", "raw_sales", "s3://landing/sales")],
        });
        let resolved = catalog.resolve(&TableRef::new("sales", "raw_sales")).unwrap();
        assert_eq!(resolved.location.bucket, "landing");
        assert_eq!(resolved.delimiter, b',');
    }

    #[test]
    fn test_delimiter_checked_only_for_csv() {
        let mut csv = entry("sales", "raw_sales", "s3://landing/sales");
        csv.delimiter = '§';
        let err = Catalog::from_config(&CatalogConfig { tables: vec![csv] })
            .resolve(&TableRef::new("sales", "raw_sales"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidDelimiter { delimiter: '§', .. }));
        assert!(err.to_string().contains("sales.raw_sales"));

        let mut json = entry("sales", "raw_sales", "s3://landing/sales");
        json.format = SourceFormat::Json;
        json.delimiter = '§';
        let resolved = Catalog::from_config(&CatalogConfig { tables: vec![json] })
            .resolve(&TableRef::new("sales", "raw_sales"))
            .unwrap();
        assert_eq!(resolved.format, SourceFormat::Json);
    }

    #[test]
    fn test_unknown_table_names_database_and_table() {
        let catalog = Catalog::from_config(&CatalogConfig {
            tables: vec![entry("sales", "raw_sales", "s3://landing/sales")],
        });
        let err = catalog
            .resolve(&TableRef::new("sales", "refunds"))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("sales.refunds"));
        assert!(message.contains("sales.raw_sales"));
    }
}
