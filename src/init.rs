// Initialization utilities
//
// Storage operators and logging/tracing setup

use anyhow::{Context, Result};
use opendal::{services, Operator};
use sales2parquet_config::{
    ConfigOverrides, LogFormat, LoggingConfig, RuntimeConfig, StorageBackend, StorageConfig,
};
use std::path::Path;
use tracing::{info, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Build an operator rooted at `bucket` for the configured backend.
///
/// With the filesystem backend the bucket is a directory under `storage.fs.path`.
pub fn init_operator(storage: &StorageConfig, bucket: &str) -> Result<Operator> {
    match storage.backend {
        StorageBackend::Fs => {
            let fs = storage
                .fs
                .as_ref()
                .context("fs storage backend requires 'fs' configuration")?;
            let root = Path::new(&fs.path).join(bucket);
            info!(root = %root.display(), "Using filesystem storage");

            let builder = services::Fs::default().root(&root.to_string_lossy());
            Ok(Operator::new(builder)
                .with_context(|| format!("Failed to create fs operator at {}", root.display()))?
                .finish())
        }
        StorageBackend::S3 => {
            let s3 = storage
                .s3
                .as_ref()
                .context("s3 storage backend requires 's3' configuration")?;
            info!(bucket, region = %s3.region, "Using S3 storage");

            let mut builder = services::S3::default().bucket(bucket).region(&s3.region);
            if let Some(endpoint) = s3.endpoint.as_deref() {
                builder = builder.endpoint(endpoint);
            }
            Ok(Operator::new(builder)
                .with_context(|| format!("Failed to create S3 operator for bucket {}", bucket))?
                .finish())
        }
    }
}

/// Load configuration with a bootstrap subscriber active, so warnings raised
/// while loading and validating are not lost before `init_tracing` runs.
///
/// The bootstrap filter comes from `RUST_LOG`, falling back to `info`.
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<RuntimeConfig> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    load_config_with(path, overrides, bootstrap_subscriber(filter, std::io::stdout))
}

fn load_config_with<S>(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
    subscriber: S,
) -> Result<RuntimeConfig>
where
    S: Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::with_default(subscriber, || RuntimeConfig::load(path, overrides))
}

fn bootstrap_subscriber<W>(
    filter: EnvFilter,
    make_writer: W,
) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(make_writer))
}

/// Initialize tracing/logging from the logging config
pub fn init_tracing(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Ignore the error if a subscriber is already set
    let _ = match config.format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
        }
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(fmt::layer())),
    };
}
