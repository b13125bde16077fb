//! Partitioned Parquet output through OpenDAL.
//!
//! Each date partition becomes one Snappy-compressed Parquet file at
//! `<prefix>/year=Y/month=M/day=D/part-NNNNN-<run_id>.snappy.parquet`.

use async_trait::async_trait;
use opendal::{EntryMode, Operator};
use sales2parquet_core::parquet::{
    encode_parquet, writer_properties, DEFAULT_ROW_GROUP_SIZE, PARQUET_FILE_SUFFIX,
};
use sales2parquet_core::{PartitionKey, PartitionSink, SalesPartition, WriteMode, WrittenFile};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, WriterError};

/// Writes date partitions as Hive-style Parquet directories
pub struct PartitionedParquetWriter {
    operator: Operator,
    prefix: String,
    run_id: String,
    mode: WriteMode,
    row_group_size: usize,
    sequence: AtomicUsize,
    cleared: Mutex<HashSet<PartitionKey>>,
}

impl PartitionedParquetWriter {
    /// `prefix` is relative to the operator root; `run_id` tags every file
    /// written by this writer.
    pub fn new(operator: Operator, prefix: &str, run_id: impl Into<String>) -> Result<Self> {
        let run_id = run_id.into();
        if run_id.is_empty() {
            return Err(WriterError::invalid_config("run_id must not be empty".to_string()));
        }
        if prefix.starts_with('/') {
            return Err(WriterError::invalid_config(format!(
                "output prefix '{}' must be relative",
                prefix
            )));
        }

        Ok(Self {
            operator,
            prefix: prefix.trim_matches('/').to_string(),
            run_id,
            mode: WriteMode::Append,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            sequence: AtomicUsize::new(0),
            cleared: Mutex::new(HashSet::new()),
        })
    }

    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_row_group_size(mut self, row_group_size: usize) -> Self {
        self.row_group_size = row_group_size;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Directory of a partition, with trailing slash.
    pub fn partition_dir(&self, key: &PartitionKey) -> String {
        if self.prefix.is_empty() {
            format!("{}/", key.path())
        } else {
            format!("{}/{}/", self.prefix, key.path())
        }
    }

    fn next_file_path(&self, key: &PartitionKey) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        format!(
            "{}part-{:05}-{}{}",
            self.partition_dir(key),
            seq,
            self.run_id,
            PARQUET_FILE_SUFFIX
        )
    }

    /// Delete existing objects of a partition once per run.
    async fn clear_partition(&self, key: &PartitionKey) -> Result<()> {
        if self.cleared.lock().contains(key) {
            return Ok(());
        }

        let dir = self.partition_dir(key);
        let entries = self
            .operator
            .list_with(&dir)
            .recursive(true)
            .await
            .map_err(|e| WriterError::partition_cleanup(dir.clone(), e.to_string()))?;

        let mut removed = 0usize;
        for entry in entries {
            if entry.metadata().mode() != EntryMode::FILE {
                continue;
            }
            self.operator
                .delete(entry.path())
                .await
                .map_err(|e| WriterError::partition_cleanup(dir.clone(), e.to_string()))?;
            removed += 1;
        }

        if removed > 0 {
            tracing::info!(partition = %dir, removed, "cleared existing partition files");
        }

        self.cleared.lock().insert(*key);
        Ok(())
    }

    async fn write(&self, partition: &SalesPartition) -> Result<WrittenFile> {
        if self.mode == WriteMode::Overwrite {
            self.clear_partition(&partition.key).await?;
        }

        let path = self.next_file_path(&partition.key);
        let bytes = encode_parquet(&partition.batch, writer_properties(self.row_group_size))
            .map_err(|e| {
                WriterError::write_failure(format!("Failed to encode Parquet for '{}': {}", path, e))
            })?;
        let size = bytes.len();

        tracing::debug!(path = %path, rows = partition.num_rows(), "writing partition file");

        self.operator.write(&path, bytes).await.map_err(|e| {
            WriterError::write_failure(format!(
                "Failed to write parquet bytes to '{}': {}",
                path, e
            ))
        })?;

        tracing::info!(
            path = %path,
            rows = partition.num_rows(),
            bytes = size,
            "wrote partition file"
        );

        Ok(WrittenFile {
            path,
            rows: partition.num_rows(),
            bytes: size,
        })
    }
}

#[async_trait]
impl PartitionSink for PartitionedParquetWriter {
    fn describe(&self) -> String {
        format!("{} ({}, run {})", self.prefix, self.mode, self.run_id)
    }

    async fn write_partition(&self, partition: &SalesPartition) -> anyhow::Result<Vec<WrittenFile>> {
        if partition.num_rows() == 0 {
            return Ok(Vec::new());
        }
        let file = self.write(partition).await?;
        Ok(vec![file])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opendal::services;

    fn writer(prefix: &str) -> PartitionedParquetWriter {
        let op = Operator::new(services::Memory::default()).unwrap().finish();
        PartitionedParquetWriter::new(op, prefix, "run-1").unwrap()
    }

    #[test]
    fn test_file_paths_follow_layout() {
        let writer = writer("processed/sales/");
        let key = PartitionKey::new(2022, 3, 5);
        assert_eq!(writer.partition_dir(&key), "processed/sales/year=2022/month=3/day=5/");
        assert_eq!(
            writer.next_file_path(&key),
            "processed/sales/year=2022/month=3/day=5/part-00000-run-1.snappy.parquet"
        );
        assert_eq!(
            writer.next_file_path(&key),
            "processed/sales/year=2022/month=3/day=5/part-00001-run-1.snappy.parquet"
        );
    }

    #[test]
    fn test_empty_prefix_writes_at_root() {
        let writer = writer("");
        assert_eq!(
            writer.partition_dir(&PartitionKey::new(2021, 12, 31)),
            "year=2021/month=12/day=31/"
        );
    }

    #[test]
    fn test_invalid_construction() {
        let op = Operator::new(services::Memory::default()).unwrap().finish();
        let err = PartitionedParquetWriter::new(op.clone(), "/abs", "run").err().unwrap();
        assert_eq!(err.code(), "E004");
        assert!(PartitionedParquetWriter::new(op, "out", "").is_err());
    }
}
