pub mod processor;
pub mod reader;
pub mod schema;
pub mod session;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod testing;

use common::config::{LogFormat, LoggingConfig, Settings};
use common::Result;
use processor::{Pipeline, RunReport};
use tracing::info;

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Calling it twice is harmless; the second subscriber is discarded.
pub fn init_tracing(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let _ = match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Text => registry.with(fmt::layer()).try_init(),
    };
}

pub async fn run_etl_pipeline(config_path: &str) -> Result<RunReport> {
    let settings = Settings::new(config_path)?;
    init_tracing(&settings.logging);
    info!(config = config_path, "Configuration loaded");

    run_with_settings(settings).await
}

pub async fn run_with_settings(settings: Settings) -> Result<RunReport> {
    let pipeline = Pipeline::new(settings)?;
    let report = pipeline.run().await?;

    let total_rows: u64 = report.tables.iter().map(|t| t.rows).sum();
    info!(run_id = %report.run_id, tables = report.tables.len(), total_rows, "Star schema run finished");
    Ok(report)
}
