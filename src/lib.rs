// sales2parquet - Catalogued raw sales records to date-partitioned Parquet
//
// One linear run per invocation:
//   catalog lookup → read CSV / JSON lines → map schema → drop nulls →
//   derive year/month/day → strip currency → write Hive-style Parquet
//
// The transformation lives in sales2parquet-core; this crate wires the
// configured storage, source and sink together.

use anyhow::{Context, Result};
use sales2parquet_catalog::{Catalog, CatalogSource};
use sales2parquet_config::RuntimeConfig;
use sales2parquet_writer::PartitionedParquetWriter;
use std::sync::Arc;
use uuid::Uuid;

pub mod init;
mod job;

pub use init::{init_operator, init_tracing, load_config};
pub use job::{JobSummary, SalesTransformJob};

/// Build storage, source and sink from configuration and run the job once.
pub async fn run_with_config(config: RuntimeConfig) -> Result<JobSummary> {
    let output_bucket = config.output_bucket()?;

    let catalog = Catalog::from_config(&config.catalog);
    let table = catalog
        .resolve(&config.job.source_table())
        .context("Failed to resolve source table")?;

    let source_operator = init_operator(&config.storage, &table.location.bucket)?;
    let sink_operator = init_operator(&config.storage, output_bucket)?;

    let run_id = Uuid::new_v4().to_string();
    let writer = PartitionedParquetWriter::new(sink_operator, &config.job.output_prefix, &run_id)?
        .with_write_mode(config.output.write_mode)
        .with_row_group_size(config.output.parquet_row_group_size);

    let source = Arc::new(CatalogSource::new(source_operator, table));
    let job = SalesTransformJob::new(&config, source, Arc::new(writer)).with_run_id(run_id);
    job.run().await
}
