use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contents of the `_SUCCESS` marker dropped next to a completed table.
///
/// Tables are committed one at a time, so after a failed run the markers tell
/// which tables belong to which run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TableMarker {
    pub run_id: String,
    pub table_name: String,
    pub rows: u64,
    pub partition_by: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-table outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table_name: &'static str,
    pub path: String,
    pub rows: u64,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub tables: Vec<TableReport>,
}

impl RunReport {
    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table_name == name)
    }
}
