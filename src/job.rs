// The sales transform job: read → transform → write, once per run

use anyhow::{Context, Result};
use sales2parquet_config::RuntimeConfig;
use sales2parquet_core::{
    transform_sales, PartitionSink, SalesSource, TransformOptions, WrittenFile,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// What a run did. Informational only; success is the absence of an error.
#[derive(Debug, Clone, Default)]
pub struct JobSummary {
    pub job_name: String,
    pub run_id: String,
    pub rows_read: usize,
    /// Rows removed because a mapped field was null or failed conversion
    pub rows_dropped: usize,
    pub invalid_timestamps: usize,
    pub rows_written: usize,
    pub partitions: Vec<String>,
    pub files: Vec<WrittenFile>,
}

pub struct SalesTransformJob {
    name: String,
    run_id: String,
    options: TransformOptions,
    source: Arc<dyn SalesSource>,
    sink: Arc<dyn PartitionSink>,
}

impl SalesTransformJob {
    pub fn new(
        config: &RuntimeConfig,
        source: Arc<dyn SalesSource>,
        sink: Arc<dyn PartitionSink>,
    ) -> Self {
        Self {
            name: config.job.name.clone(),
            run_id: Uuid::new_v4().to_string(),
            options: TransformOptions {
                timestamp_format: config.job.timestamp_format.clone(),
                invalid_timestamps: config.job.invalid_timestamps,
                keep_partition_columns: config.output.keep_partition_columns,
            },
            source,
            sink,
        }
    }

    /// Use the run id the sink was created with.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub async fn run(&self) -> Result<JobSummary> {
        info!(
            job = %self.name,
            run_id = %self.run_id,
            source = %self.source.describe(),
            sink = %self.sink.describe(),
            "Starting sales transform job"
        );

        let batches = self
            .source
            .read_batches()
            .await
            .with_context(|| format!("Failed to read {}", self.source.describe()))?;
        let rows_read: usize = batches.iter().map(|b| b.num_rows()).sum();
        info!(rows = rows_read, batches = batches.len(), "Read raw sales records");

        let output =
            transform_sales(&batches, &self.options).context("Failed to transform sales records")?;
        info!(
            rows_out = output.stats.rows_out,
            rows_dropped = output.stats.rows_dropped,
            partitions = output.partitions.len(),
            "Transformed sales records"
        );
        if !output.mapping.missing_columns.is_empty() {
            tracing::warn!(
                columns = ?output.mapping.missing_columns,
                "source columns missing from some records"
            );
        }

        let mut summary = JobSummary {
            job_name: self.name.clone(),
            run_id: self.run_id.clone(),
            rows_read: output.stats.rows_read,
            rows_dropped: output.stats.rows_dropped,
            invalid_timestamps: output.stats.invalid_timestamps,
            ..Default::default()
        };

        for partition in &output.partitions {
            let files = self
                .sink
                .write_partition(partition)
                .await
                .with_context(|| format!("Failed to write partition {}", partition.key))?;
            summary.rows_written += files.iter().map(|f| f.rows).sum::<usize>();
            summary.partitions.push(partition.key.path());
            summary.files.extend(files);
        }

        info!(
            job = %summary.job_name,
            run_id = %summary.run_id,
            rows_read = summary.rows_read,
            rows_written = summary.rows_written,
            partitions = summary.partitions.len(),
            files = summary.files.len(),
            "Sales transform job complete"
        );
        Ok(summary)
    }
}
