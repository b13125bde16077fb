// Configuration source loading.
//
// Priority order:
// 1. CLI overrides
// 2. Environment variables (SALES2PARQUET_* prefix)
// 3. Config file: explicit path, SALES2PARQUET_CONFIG, inline
//    SALES2PARQUET_CONFIG_CONTENT, then ./config.toml or ./.sales2parquet.toml
// 4. Built-in defaults

use crate::env_overrides::{EnvSource, ENV_PREFIX};
use crate::{ConfigOverrides, RuntimeConfig};
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_FILES: [&str; 2] = ["./config.toml", "./.sales2parquet.toml"];

pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<RuntimeConfig> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => load_from_file()?.unwrap_or_default(),
    };

    config.apply_env_overrides_from(&StdEnvSource)?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn load_from_file() -> Result<Option<RuntimeConfig>> {
    if let Ok(path) = env::var("SALES2PARQUET_CONFIG") {
        return read_config_file(Path::new(&path)).map(Some);
    }

    if let Ok(content) = env::var("SALES2PARQUET_CONFIG_CONTENT") {
        let config = parse_config(&content, "inline config from SALES2PARQUET_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in DEFAULT_CONFIG_FILES {
        let path = Path::new(path);
        if path.exists() {
            return read_config_file(path).map(Some);
        }
    }

    Ok(None)
}

fn read_config_file(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    parse_config(&content, &format!("config file: {}", path.display()))
}

pub(crate) fn parse_config(content: &str, origin: &str) -> Result<RuntimeConfig> {
    toml::from_str(content).with_context(|| format!("Failed to parse {}", origin))
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SourceFormat, StorageBackend};
    use std::io::Write;

    const CONFIG: &str = r#"
        [job]
        name = "sales-processing"
        output_bucket = "analytics"

        [[catalog.tables]]
        database = "sales"
        table = "raw_sales"
        location = "landing/sales"
        format = "json"

        [storage]
        backend = "fs"

        [storage.fs]
        path = "/var/lib/sales"
    "#;

    #[test]
    fn test_explicit_path_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let config = read_config_file(file.path()).unwrap();
        assert_eq!(config.job.name, "sales-processing");
        assert_eq!(config.storage.backend, StorageBackend::Fs);
        assert_eq!(config.catalog.tables[0].format, SourceFormat::Json);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_config_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_malformed_toml_names_origin() {
        let err = parse_config("[job", "config file: broken.toml").unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
