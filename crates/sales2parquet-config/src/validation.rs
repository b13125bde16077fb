// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{anyhow, bail, Result};
use tracing::warn;

const LARGE_ROW_GROUP: usize = 1_000_000;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_job_config(&config.job)?;
    validate_catalog_config(&config.catalog)?;

    let source = config.job.source_table();
    if config.catalog.find(&source).is_none() {
        bail!(
            "source table {} is not declared in [[catalog.tables]]",
            source
        );
    }

    validate_storage_config(&config.storage)?;
    validate_output_config(&config.output)?;

    Ok(())
}

fn validate_job_config(config: &JobConfig) -> Result<()> {
    match config.output_bucket.as_deref() {
        None | Some("") => {
            bail!("job.output_bucket is required (--output_s3_bucket_name or SALES2PARQUET_OUTPUT_BUCKET)")
        }
        Some(_) => {}
    }

    if config.output_prefix.starts_with('/') {
        bail!("job.output_prefix must be relative to the bucket");
    }

    if config.timestamp_format.is_empty() {
        bail!("job.timestamp_format must not be empty");
    }

    Ok(())
}

fn validate_catalog_config(config: &CatalogConfig) -> Result<()> {
    for (idx, table) in config.tables.iter().enumerate() {
        if table.database.is_empty() || table.table.is_empty() {
            bail!("catalog.tables[{}] requires database and table", idx);
        }
        if table.location.is_empty() {
            bail!("catalog table {} requires a location", table.table_ref());
        }
        if table.format == SourceFormat::Csv && !table.delimiter.is_ascii() {
            bail!(
                "catalog table {} delimiter must be a single byte character",
                table.table_ref()
            );
        }
    }
    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    match config.backend {
        StorageBackend::Fs => {
            let fs = config
                .fs
                .as_ref()
                .ok_or_else(|| anyhow!("fs storage backend requires 'fs' configuration"))?;

            if fs.path.is_empty() {
                bail!("storage.fs.path must not be empty");
            }
        }
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or_else(|| anyhow!("s3 storage backend requires 's3' configuration"))?;

            if s3.region.is_empty() {
                bail!("storage.s3.region is required for S3 backend");
            }
        }
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<()> {
    if config.parquet_row_group_size == 0 {
        bail!("output.parquet_row_group_size must be greater than 0");
    }

    if config.parquet_row_group_size > LARGE_ROW_GROUP {
        warn!(
            parquet_row_group_size = config.parquet_row_group_size,
            "output.parquet_row_group_size is very large; may cause memory issues"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.job.output_bucket = Some("analytics".to_string());
        config.catalog.tables.push(CatalogTable {
            database: "sales".to_string(),
            table: "raw_sales".to_string(),
            location: "s3://landing/sales".to_string(),
            format: SourceFormat::Csv,
            has_header: true,
            delimiter: ',',
        });
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_output_bucket_required() {
        let mut config = valid_config();
        config.job.output_bucket = None;
        assert!(validate_config(&config).is_err());

        config.job.output_bucket = Some(String::new());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_source_table_must_be_catalogued() {
        let mut config = valid_config();
        config.job.table = "missing".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("sales.missing"));
    }

    #[test]
    fn test_validate_storage_config() {
        let fs_without_section = StorageConfig {
            backend: StorageBackend::Fs,
            fs: None,
            s3: None,
        };
        assert!(validate_storage_config(&fs_without_section).is_err());

        let empty_region = StorageConfig {
            backend: StorageBackend::S3,
            fs: None,
            s3: Some(S3Config {
                region: String::new(),
                endpoint: None,
            }),
        };
        assert!(validate_storage_config(&empty_region).is_err());
    }

    #[test]
    fn test_row_group_and_prefix_rules() {
        let mut config = valid_config();
        config.output.parquet_row_group_size = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.job.output_prefix = "/processed".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let mut config = valid_config();
        config.catalog.tables[0].delimiter = '§';
        assert!(validate_config(&config).is_err());
    }
}
