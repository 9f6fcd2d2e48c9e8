use super::columns::has_column;
use super::metadata::TableMarker;
use crate::reader::source_error;
use arrow::array::UInt64Array;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::Utc;
use common::{Error, Result};
use datafusion::common::config::TableParquetOptions;
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::datasource::listing::ListingTableUrl;
use datafusion::prelude::*;
use futures::TryStreamExt;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;
use tracing::{debug, info};

pub const MARKER_FILE: &str = "_SUCCESS";

/// Destination name and partition layout of one output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSpec {
    pub name: &'static str,
    pub partition_by: &'static [&'static str],
}

#[async_trait]
pub trait TableWriter: Send + Sync + 'static {
    /// Replaces whatever is stored at `path` with `table`. Returns the rows written.
    async fn write_table(
        &self,
        ctx: &SessionContext,
        table: DataFrame,
        spec: &WriteSpec,
        path: &str,
    ) -> Result<u64>;
}

/// Writes hive-partitioned Parquet (`col=value/` directories) in overwrite mode.
///
/// The table is computed in full before anything under the destination is
/// deleted. Failures while computing it are classified by `source_error`;
/// failures after that point are `Error::Write`.
pub struct ParquetTableWriter {
    run_id: String,
}

impl ParquetTableWriter {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
        }
    }

    fn parquet_options(&self, spec: &WriteSpec) -> TableParquetOptions {
        let mut options = TableParquetOptions::new();
        options
            .key_value_metadata
            .insert("star_schema_table".to_string(), Some(spec.name.to_string()));
        options
            .key_value_metadata
            .insert("run_id".to_string(), Some(self.run_id.clone()));
        options
    }

    async fn write_marker(
        &self,
        store: &Arc<dyn ObjectStore>,
        table_url: &ListingTableUrl,
        spec: &WriteSpec,
        rows: u64,
    ) -> Result<()> {
        let marker = TableMarker {
            run_id: self.run_id.clone(),
            table_name: spec.name.to_string(),
            rows,
            partition_by: spec.partition_by.iter().map(|c| c.to_string()).collect(),
            created_at: Utc::now(),
        };
        let marker_json = serde_json::to_vec_pretty(&marker)?;
        let marker_key = table_url.prefix().child(MARKER_FILE);

        store
            .put(&marker_key, PutPayload::from(marker_json))
            .await?;
        debug!(table = spec.name, %marker_key, "Marker file written");
        Ok(())
    }
}

#[async_trait]
impl TableWriter for ParquetTableWriter {
    async fn write_table(
        &self,
        ctx: &SessionContext,
        table: DataFrame,
        spec: &WriteSpec,
        path: &str,
    ) -> Result<u64> {
        let missing: Vec<&str> = spec
            .partition_by
            .iter()
            .copied()
            .filter(|c| !has_column(table.schema(), c))
            .collect();
        if !missing.is_empty() {
            return Err(Error::Write(format!(
                "Partition column(s) {:?} not found in table {}",
                missing, spec.name
            )));
        }

        let table_url = ListingTableUrl::parse(path)
            .map_err(|e| Error::Write(format!("Invalid destination {}: {}", path, e)))?;
        let store = ctx
            .runtime_env()
            .object_store(&table_url)
            .map_err(|e| Error::Write(format!("No object store for {}: {}", path, e)))?;

        // Partition values become directory names.
        let projection: Vec<Expr> = table
            .schema()
            .fields()
            .iter()
            .map(|field| {
                let name = field.name().as_str();
                if spec.partition_by.contains(&name) {
                    cast(ident(name), DataType::Utf8).alias(name)
                } else {
                    ident(name)
                }
            })
            .collect();
        let table = table.select(projection)?;

        // Source records are decoded here, so a malformed record fails before
        // the previous output is removed.
        let table = table.cache().await.map_err(source_error)?;

        let removed = clear_destination(&store, &table_url).await?;
        if removed > 0 {
            info!(table = spec.name, removed, path, "Removed previous output");
        }

        let options = DataFrameWriteOptions::new().with_partition_by(
            spec.partition_by.iter().map(|c| c.to_string()).collect(),
        );
        let result = table
            .write_parquet(path, options, Some(self.parquet_options(spec)))
            .await
            .map_err(|e| Error::Write(format!("Failed to write table {} to {}: {}", spec.name, path, e)))?;
        let rows = rows_written(&result);

        self.write_marker(&store, &table_url, spec, rows).await?;

        Ok(rows)
    }
}

/// Deletes every object under the table prefix. Returns how many were removed.
async fn clear_destination(store: &Arc<dyn ObjectStore>, table_url: &ListingTableUrl) -> Result<usize> {
    let existing: Vec<Path> = store
        .list(Some(table_url.prefix()))
        .map_ok(|meta| meta.location)
        .try_collect()
        .await
        .map_err(|e| Error::Write(format!("Failed to list {}: {}", table_url, e)))?;

    for location in &existing {
        store
            .delete(location)
            .await
            .map_err(|e| Error::Write(format!("Failed to remove {}: {}", location, e)))?;
    }

    Ok(existing.len())
}

fn rows_written(batches: &[RecordBatch]) -> u64 {
    batches
        .iter()
        .filter_map(|batch| batch.column_by_name("count"))
        .filter_map(|column| column.as_any().downcast_ref::<UInt64Array>())
        .flat_map(|counts| counts.values().iter().copied())
        .sum()
}
