// sales2parquet-config - Layered configuration for the sales job
//
// Supports configuration from multiple sources:
// 1. CLI overrides (highest priority)
// 2. Environment variables (SALES2PARQUET_* prefix)
// 3. Config file: --config path, SALES2PARQUET_CONFIG, SALES2PARQUET_CONFIG_CONTENT,
//    or the default locations (./config.toml, ./.sales2parquet.toml)
// 4. Built-in defaults (lowest priority)

use anyhow::Result;
use sales2parquet_core::parquet::DEFAULT_ROW_GROUP_SIZE;
use sales2parquet_core::{InvalidTimestampPolicy, WriteMode, DEFAULT_TIMESTAMP_FORMAT};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod catalog;
mod env_overrides;
mod sources;
mod validation;

pub use catalog::{CatalogConfig, CatalogTable, SourceFormat, TableRef};
pub use env_overrides::{EnvSource, ENV_PREFIX};

/// Main runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub job: JobConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What to read, where to write and how to interpret the records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub name: String,
    pub database: String,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_bucket: Option<String>,
    pub output_prefix: String,
    pub timestamp_format: String,
    pub invalid_timestamps: InvalidTimestampPolicy,
}

impl JobConfig {
    pub fn source_table(&self) -> TableRef {
        TableRef::new(&self.database, &self.table)
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: "sales2parquet".to_string(),
            database: "sales".to_string(),
            table: "raw_sales".to_string(),
            output_bucket: None,
            output_prefix: "processed/sales".to_string(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            invalid_timestamps: InvalidTimestampPolicy::Drop,
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            fs: None,
            s3: Some(S3Config::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Fs,
    S3,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Fs => write!(f, "fs"),
            StorageBackend::S3 => write!(f, "s3"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fs" | "filesystem" => Ok(StorageBackend::Fs),
            "s3" | "aws" => Ok(StorageBackend::S3),
            _ => anyhow::bail!("Unsupported storage backend: {}. Supported: fs, s3", s),
        }
    }
}

/// Local filesystem storage. Buckets are subdirectories of `path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    pub path: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            path: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint: None,
        }
    }
}

/// Parquet output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub write_mode: WriteMode,
    pub keep_partition_columns: bool,
    pub parquet_row_group_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            write_mode: WriteMode::Append,
            keep_partition_columns: false,
            parquet_row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

/// Values given on the command line; applied after environment overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub job_name: Option<String>,
    pub output_bucket: Option<String>,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut RuntimeConfig) {
        if let Some(name) = &self.job_name {
            config.job.name = name.clone();
        }
        if let Some(bucket) = &self.output_bucket {
            config.job.output_bucket = Some(bucket.clone());
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority.
    ///
    /// `path` is the `--config` flag; when absent the standard locations are tried.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        sources::load_config(path, overrides)
    }

    /// Build a configuration from inline TOML plus overrides supplied by an
    /// `EnvSource`. Used by tests and by callers that do not read the host
    /// environment.
    pub fn load_with_env<E: EnvSource>(
        inline_config: Option<&str>,
        env: &E,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let mut config = match inline_config {
            Some(inline) => sources::parse_config(inline, "inline config content")?,
            None => RuntimeConfig::default(),
        };
        config.apply_env_overrides_from(env)?;
        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides from a custom source.
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// The output bucket, once validation has guaranteed it is present.
    pub fn output_bucket(&self) -> Result<&str> {
        self.job
            .output_bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| anyhow::anyhow!("job.output_bucket is required (--output_s3_bucket_name)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("fs".parse::<StorageBackend>().unwrap(), StorageBackend::Fs);
        assert_eq!("s3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(
            "filesystem".parse::<StorageBackend>().unwrap(),
            StorageBackend::Fs
        );
        assert_eq!("aws".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert!("r2".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_default_configs() {
        let config = RuntimeConfig::default();
        assert_eq!(config.job.database, "sales");
        assert_eq!(config.job.table, "raw_sales");
        assert_eq!(config.job.output_prefix, "processed/sales");
        assert_eq!(config.job.timestamp_format, "%Y-%m-%d %H:%M:%S");
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.output.write_mode, WriteMode::Append);
        assert!(!config.output.keep_partition_columns);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_cli_overrides_replace_values() {
        let mut config = RuntimeConfig::default();
        let overrides = ConfigOverrides {
            job_name: Some("nightly".into()),
            output_bucket: Some("out".into()),
            log_level: None,
        };
        overrides.apply(&mut config);
        assert_eq!(config.job.name, "nightly");
        assert_eq!(config.output_bucket().unwrap(), "out");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            [job]
            output_bucket = "my-bucket"

            [output]
            write_mode = "overwrite"
            "#,
        )
        .unwrap();
        assert_eq!(config.job.table, "raw_sales");
        assert_eq!(config.output.write_mode, WriteMode::Overwrite);
        assert_eq!(config.output.parquet_row_group_size, DEFAULT_ROW_GROUP_SIZE);
        assert_eq!(config.storage.backend, StorageBackend::S3);
    }
}
