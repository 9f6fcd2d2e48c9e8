use datafusion::error::DataFusionError;
use thiserror::Error;
use url::ParseError;

pub mod config;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Source records could not be listed, read, parsed or converted.
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// A requested column is absent from the source table.
    #[error("Schema error: {0}")]
    Schema(String),

    /// The destination could not be written.
    #[error("Write error: {0}")]
    Write(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("DataFusion error: {0}")]
    DataFusion(#[from] DataFusionError),

    #[error("Invalid Uri: {0}")]
    InvalidUri(String),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::InvalidUri(format!("URL parse error: {}", err))
    }
}
