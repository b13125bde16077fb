use crate::{FsConfig, LogFormat, RuntimeConfig, S3Config, StorageBackend};
use anyhow::{anyhow, Context, Result};
use sales2parquet_core::{InvalidTimestampPolicy, WriteMode};

pub const ENV_PREFIX: &str = "SALES2PARQUET_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    /// Get a variable by its name without the `SALES2PARQUET_` prefix
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Job
    if let Some(name) = get_env_string(env, "JOB_NAME") {
        config.job.name = name;
    }
    if let Some(database) = get_env_string(env, "DATABASE") {
        config.job.database = database;
    }
    if let Some(table) = get_env_string(env, "TABLE") {
        config.job.table = table;
    }
    if let Some(bucket) = get_env_string(env, "OUTPUT_BUCKET") {
        config.job.output_bucket = Some(bucket);
    }
    if let Some(prefix) = get_env_string(env, "OUTPUT_PREFIX") {
        config.job.output_prefix = prefix;
    }
    if let Some(format) = get_env_string(env, "TIMESTAMP_FORMAT") {
        config.job.timestamp_format = format;
    }
    if let Some(policy) = get_env_string(env, "INVALID_TIMESTAMPS") {
        config.job.invalid_timestamps = policy
            .parse::<InvalidTimestampPolicy>()
            .context("Invalid SALES2PARQUET_INVALID_TIMESTAMPS value")?;
    }

    // Storage backend
    if let Some(backend) = get_env_string(env, "STORAGE_BACKEND") {
        config.storage.backend = backend
            .parse::<StorageBackend>()
            .context("Invalid SALES2PARQUET_STORAGE_BACKEND value")?;
    }
    if let Some(path) = get_env_string(env, "STORAGE_PATH") {
        config.storage.fs.get_or_insert_with(FsConfig::default).path = path;
    }
    if let Some(region) = get_env_string(env, "S3_REGION") {
        config.storage.s3.get_or_insert_with(S3Config::default).region = region;
    }
    if let Some(endpoint) = get_env_string(env, "S3_ENDPOINT") {
        config.storage.s3.get_or_insert_with(S3Config::default).endpoint = Some(endpoint);
    }

    // Output
    if let Some(mode) = get_env_string(env, "WRITE_MODE") {
        config.output.write_mode = mode
            .parse::<WriteMode>()
            .context("Invalid SALES2PARQUET_WRITE_MODE value")?;
    }
    if let Some(val) = get_env_bool(env, "KEEP_PARTITION_COLUMNS")? {
        config.output.keep_partition_columns = val;
    }
    if let Some(val) = get_env_usize(env, "PARQUET_ROW_GROUP_SIZE")? {
        config.output.parquet_row_group_size = val;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.logging.format = format
            .parse::<LogFormat>()
            .context("Invalid SALES2PARQUET_LOG_FORMAT value")?;
    }

    Ok(())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key)
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val
                .parse::<usize>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val.parse::<bool>().map_err(|e| {
                anyhow!(
                    "Failed to parse {}{} (expected bool): {}",
                    ENV_PREFIX,
                    key,
                    e
                )
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapEnv(HashMap<&'static str, &'static str>);

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    fn env(pairs: &[(&'static str, &'static str)]) -> MapEnv {
        MapEnv(pairs.iter().copied().collect())
    }

    #[test]
    fn test_job_and_output_overrides() {
        let mut config = RuntimeConfig::default();
        apply_env_overrides(
            &mut config,
            &env(&[
                ("OUTPUT_BUCKET", "warehouse"),
                ("TABLE", "raw_sales_v2"),
                ("INVALID_TIMESTAMPS", "fail"),
                ("WRITE_MODE", "overwrite"),
                ("KEEP_PARTITION_COLUMNS", "true"),
                ("PARQUET_ROW_GROUP_SIZE", "1000"),
            ]),
        )
        .unwrap();

        assert_eq!(config.job.output_bucket.as_deref(), Some("warehouse"));
        assert_eq!(config.job.table, "raw_sales_v2");
        assert_eq!(config.job.invalid_timestamps, InvalidTimestampPolicy::Fail);
        assert_eq!(config.output.write_mode, WriteMode::Overwrite);
        assert!(config.output.keep_partition_columns);
        assert_eq!(config.output.parquet_row_group_size, 1000);
    }

    #[test]
    fn test_storage_path_creates_fs_section() {
        let mut config = RuntimeConfig::default();
        apply_env_overrides(
            &mut config,
            &env(&[("STORAGE_BACKEND", "fs"), ("STORAGE_PATH", "/tmp/lake")]),
        )
        .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Fs);
        assert_eq!(config.storage.fs.unwrap().path, "/tmp/lake");
    }

    #[test]
    fn test_s3_endpoint_override() {
        let mut config = RuntimeConfig::default();
        apply_env_overrides(
            &mut config,
            &env(&[("S3_REGION", "eu-west-1"), ("S3_ENDPOINT", "http://localhost:9000")]),
        )
        .unwrap();

        let s3 = config.storage.s3.unwrap();
        assert_eq!(s3.region, "eu-west-1");
        assert_eq!(s3.endpoint.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_parse_failures_are_errors() {
        let mut config = RuntimeConfig::default();
        let err = apply_env_overrides(&mut config, &env(&[("PARQUET_ROW_GROUP_SIZE", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("SALES2PARQUET_PARQUET_ROW_GROUP_SIZE"));

        assert!(
            apply_env_overrides(&mut config, &env(&[("KEEP_PARTITION_COLUMNS", "yes")])).is_err()
        );
        assert!(apply_env_overrides(&mut config, &env(&[("WRITE_MODE", "merge")])).is_err());
    }
}
