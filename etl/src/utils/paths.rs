use crate::processor::writer::MARKER_FILE;
use common::{Error, Result};
use url::Url;

/// Builds dataset locations under an input or output root.
///
/// Roots may be local paths or object store URLs. Hadoop-style `s3a://` and
/// `s3n://` schemes are rewritten to `s3://` so DataFusion can resolve the
/// registered object store.
pub struct PathBuilder {
    root: String,
    table: Option<String>,
    file_glob: Option<String>,
}

impl PathBuilder {
    pub fn new(root: &str) -> Self {
        Self {
            root: normalize_scheme(root),
            table: None,
            file_glob: None,
        }
    }

    pub fn with_table(mut self, table: &str) -> Self {
        self.table = Some(table.trim_matches('/').to_string());
        self
    }

    pub fn with_file_glob(mut self, glob: &str) -> Self {
        self.file_glob = Some(glob.trim_start_matches('/').to_string());
        self
    }

    /// Directory of a table. Always ends in `/` so writers treat it as a collection.
    pub fn build_table_path(&self) -> String {
        match &self.table {
            Some(table) => format!("{}/{}/", self.root.trim_end_matches('/'), table),
            None => format!("{}/", self.root.trim_end_matches('/')),
        }
    }

    /// Source location: the root joined with the configured glob, or the root itself.
    pub fn build_source_path(&self) -> String {
        match &self.file_glob {
            Some(glob) => format!("{}/{}", self.root.trim_end_matches('/'), glob),
            None => self.root.clone(),
        }
    }

    pub fn build_marker_path(&self) -> String {
        format!("{}{}", self.build_table_path(), MARKER_FILE)
    }
}

fn normalize_scheme(root: &str) -> String {
    for legacy in ["s3a://", "s3n://"] {
        if let Some(rest) = root.strip_prefix(legacy) {
            return format!("s3://{}", rest);
        }
    }
    root.to_string()
}

/// Returns the bucket of an `s3://` location, `None` for anything else.
pub fn s3_bucket(location: &str) -> Result<Option<String>> {
    let location = normalize_scheme(location);
    if !location.starts_with("s3://") {
        return Ok(None);
    }

    let parsed = Url::parse(&location)?;
    match parsed.host_str() {
        Some(bucket) if !bucket.is_empty() => Ok(Some(bucket.to_string())),
        _ => Err(Error::InvalidUri(format!(
            "S3 location '{}' has no bucket",
            location
        ))),
    }
}
