use config::{Config, ConfigError};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Root holding `song_data/` and `log_data/`. Local path or `s3://bucket/prefix`.
    pub input_data: String,
    /// Root the star-schema tables are written under.
    pub output_data: String,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub storage: Option<StorageConfig>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    #[serde(default = "default_catalog_glob")]
    pub catalog_glob: String,
    #[serde(default = "default_events_glob")]
    pub events_glob: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            catalog_glob: default_catalog_glob(),
            events_glob: default_events_glob(),
        }
    }
}

/// Credentials for `s3://` roots.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_s3_region")]
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    #[serde(default)]
    pub allow_http: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_concurrent_phases")]
    pub concurrent_phases: bool,
    #[serde(default)]
    pub target_partitions: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrent_phases: default_concurrent_phases(),
            target_partitions: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_catalog_glob() -> String {
    "song_data/*/*/*/*.json".to_string()
}

fn default_events_glob() -> String {
    "log_data/*/*/*.json".to_string()
}

fn default_s3_region() -> String {
    "us-east-1".to_string()
}

fn default_concurrent_phases() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;

        debug!(
            input_data = %settings.input_data,
            output_data = %settings.output_data,
            s3_credentials = settings.storage.is_some(),
            "Loaded pipeline settings"
        );

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etl.toml");
        fs::write(
            &path,
            r#"
input_data = "/data/in"
output_data = "/data/out"
"#,
        )
        .unwrap();

        let settings = Settings::new(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.input_data, "/data/in");
        assert_eq!(settings.output_data, "/data/out");
        assert_eq!(settings.sources.catalog_glob, "song_data/*/*/*/*.json");
        assert_eq!(settings.sources.events_glob, "log_data/*/*/*.json");
        assert!(settings.storage.is_none());
        assert!(settings.pipeline.concurrent_phases);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etl.toml");
        fs::write(
            &path,
            r#"
input_data = "s3a://udacity-dend/"
output_data = "s3://lake/star"

[sources]
catalog_glob = "song_data/A/*/*/*.json"

[storage]
access_key = "AKIA"
secret_key = "secret"
endpoint = "http://localhost:9000"
allow_http = true

[pipeline]
concurrent_phases = false
target_partitions = 4

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let settings = Settings::new(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.sources.catalog_glob, "song_data/A/*/*/*.json");
        assert_eq!(settings.sources.events_glob, "log_data/*/*/*.json");
        let storage = settings.storage.unwrap();
        assert_eq!(storage.region, "us-east-1");
        assert_eq!(storage.endpoint.as_deref(), Some("http://localhost:9000"));
        assert!(storage.allow_http);
        assert!(!settings.pipeline.concurrent_phases);
        assert_eq!(settings.pipeline.target_partitions, Some(4));
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_output_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etl.toml");
        fs::write(&path, "input_data = \"/data/in\"\n").unwrap();

        assert!(Settings::new(path.to_str().unwrap()).is_err());
    }
}
