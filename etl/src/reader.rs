use crate::utils::paths::PathBuilder;
use common::config::SourcesConfig;
use arrow::error::ArrowError;
use common::{Error, Result};
use datafusion::error::DataFusionError;
use datafusion::prelude::*;
use tracing::{debug, info};

/// The two independently arriving JSON-lines datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceDataset {
    Catalog,
    Events,
}

impl SourceDataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Events => "events",
        }
    }

    pub fn location(&self, input_root: &str, sources: &SourcesConfig) -> String {
        let glob = match self {
            Self::Catalog => &sources.catalog_glob,
            Self::Events => &sources.events_glob,
        };
        PathBuilder::new(input_root)
            .with_file_glob(glob)
            .build_source_path()
    }

    /// Lazily loads the dataset. Each call is an independent read of the source.
    pub async fn load(
        &self,
        ctx: &SessionContext,
        input_root: &str,
        sources: &SourcesConfig,
    ) -> Result<DataFrame> {
        let location = self.location(input_root, sources);
        info!(dataset = self.as_str(), %location, "Loading source records");
        read_json_lines(ctx, &location).await
    }
}

/// Reads every JSON-lines file matched by `path` (directory, file or glob).
///
/// Columns are the union of the fields observed across all files. Nothing is
/// materialized here; records are decoded when a downstream write executes.
pub async fn read_json_lines(ctx: &SessionContext, path: &str) -> Result<DataFrame> {
    let options = NdJsonReadOptions::default().file_extension(".json");

    let df = ctx
        .read_json(path.to_string(), options)
        .await
        .map_err(|e| Error::Ingestion(format!("Failed to read JSON records from {}: {}", path, e)))?;

    if df.schema().fields().is_empty() {
        return Err(Error::Ingestion(format!(
            "No JSON records found at {}",
            path
        )));
    }

    debug!(
        path,
        columns = ?df.schema().fields().iter().map(|f| f.name().as_str()).collect::<Vec<_>>(),
        "Inferred source schema"
    );

    Ok(df)
}

/// Classifies an error raised while executing a plan over source records.
///
/// Records are decoded lazily, so a malformed line past the schema inference
/// window only fails once a downstream stage executes. Decode, parse and cast
/// failures and object store read failures are `Ingestion`; anything else
/// stays a `DataFusion` error.
pub fn source_error(err: DataFusionError) -> Error {
    let is_source_failure = match err.find_root() {
        DataFusionError::ArrowError(arrow_err, _) => matches!(
            arrow_err,
            ArrowError::JsonError(_) | ArrowError::ParseError(_) | ArrowError::CastError(_)
        ),
        DataFusionError::ObjectStore(_) => true,
        _ => false,
    };

    if is_source_failure {
        Error::Ingestion(format!("Failed to decode source records: {}", err))
    } else {
        Error::DataFusion(err)
    }
}
