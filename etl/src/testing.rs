//! Fixtures shared by the unit tests.

use arrow::compute::concat_batches;
use arrow::json::reader::{infer_json_schema_from_iterator, ReaderBuilder};
use arrow::json::ArrayWriter;
use arrow::record_batch::RecordBatch;
use datafusion::prelude::*;
use serde_json::{json, Map, Value};
use std::io::Cursor;
use std::sync::Arc;

/// Builds an in-memory table from JSON records, inferring the schema the same
/// way the file readers do.
pub fn records_to_df(ctx: &SessionContext, records: &[Value]) -> DataFrame {
    let schema = Arc::new(
        infer_json_schema_from_iterator(records.iter().cloned().map(Ok)).unwrap(),
    );
    let data = records
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n");

    let reader = ReaderBuilder::new(schema.clone())
        .build(Cursor::new(data))
        .unwrap();
    let batches: Vec<RecordBatch> = reader.collect::<Result<_, _>>().unwrap();
    let batch = concat_batches(&schema, &batches).unwrap();

    ctx.read_batch(batch).unwrap()
}

/// Executes `df` and returns its rows as JSON objects (null fields omitted).
pub async fn collect_rows(df: DataFrame) -> Vec<Map<String, Value>> {
    let batches: Vec<RecordBatch> = df
        .collect()
        .await
        .unwrap()
        .into_iter()
        .filter(|batch| batch.num_rows() > 0)
        .collect();
    if batches.is_empty() {
        return Vec::new();
    }

    let mut writer = ArrayWriter::new(Vec::new());
    writer
        .write_batches(&batches.iter().collect::<Vec<_>>())
        .unwrap();
    writer.finish().unwrap();

    serde_json::from_slice(&writer.into_inner()).unwrap()
}

pub fn song(song_id: &str, title: &str, artist_id: &str, artist_name: &str, duration: f64, year: i64) -> Value {
    json!({
        "song_id": song_id,
        "title": title,
        "artist_id": artist_id,
        "artist_name": artist_name,
        "artist_location": "Nowhere, NV",
        "artist_latitude": 36.1,
        "artist_longitude": -115.2,
        "duration": duration,
        "year": year,
        "num_songs": 1
    })
}

pub fn event(page: &str, user_id: &str, level: &str, song: &str, artist: &str, length: f64, ts: i64) -> Value {
    json!({
        "page": page,
        "userId": user_id,
        "firstName": "Lily",
        "lastName": "Koch",
        "gender": "F",
        "level": level,
        "song": song,
        "artist": artist,
        "length": length,
        "ts": ts,
        "sessionId": 818,
        "location": "Chicago-Naperville-Elgin, IL-IN-WI",
        "userAgent": "Mozilla/5.0",
        "auth": "Logged In",
        "itemInSession": 0
    })
}

pub fn str_field<'a>(row: &'a Map<String, Value>, name: &str) -> &'a str {
    row.get(name)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("missing string field {} in {:?}", name, row))
}

pub fn int_field(row: &Map<String, Value>, name: &str) -> i64 {
    row.get(name)
        .and_then(Value::as_i64)
        .unwrap_or_else(|| panic!("missing integer field {} in {:?}", name, row))
}
