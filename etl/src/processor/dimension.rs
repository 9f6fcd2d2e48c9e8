use super::columns::require_columns;
use super::writer::WriteSpec;
use crate::schema::{catalog, events};
use common::{Error, Result};
use datafusion::prelude::*;
use tracing::debug;

/// Declares how a dimension table is cut out of a source table.
#[derive(Debug, Clone, Copy)]
pub struct DimensionSpec {
    pub name: &'static str,
    /// `(source column, output column)` pairs, in output order.
    pub columns: &'static [(&'static str, &'static str)],
    /// Output column rows are deduplicated on.
    pub key: &'static str,
    pub partition_by: &'static [&'static str],
}

impl DimensionSpec {
    pub fn output_columns(&self) -> Vec<&'static str> {
        self.columns.iter().map(|(_, output)| *output).collect()
    }

    pub fn source_columns(&self) -> Vec<&'static str> {
        self.columns.iter().map(|(source, _)| *source).collect()
    }

    pub fn write_spec(&self) -> WriteSpec {
        WriteSpec {
            name: self.name,
            partition_by: self.partition_by,
        }
    }
}

pub const SONGS: DimensionSpec = DimensionSpec {
    name: "songs",
    columns: &[
        (catalog::SONG_ID, "song_id"),
        (catalog::TITLE, "title"),
        (catalog::ARTIST_ID, "artist_id"),
        (catalog::YEAR, "year"),
        (catalog::DURATION, "duration"),
    ],
    key: "song_id",
    partition_by: &["year", "artist_id"],
};

pub const ARTISTS: DimensionSpec = DimensionSpec {
    name: "artists",
    columns: &[
        (catalog::ARTIST_ID, "artist_id"),
        (catalog::ARTIST_NAME, "name"),
        (catalog::ARTIST_LOCATION, "location"),
        (catalog::ARTIST_LATITUDE, "latitude"),
        (catalog::ARTIST_LONGITUDE, "longitude"),
    ],
    key: "artist_id",
    partition_by: &[],
};

/// Expects events already narrowed to song plays.
pub const USERS: DimensionSpec = DimensionSpec {
    name: "users",
    columns: &[
        (events::USER_ID, "user_id"),
        (events::FIRST_NAME, "first_name"),
        (events::LAST_NAME, "last_name"),
        (events::GENDER, "gender"),
        (events::LEVEL, "level"),
    ],
    key: "user_id",
    partition_by: &[],
};

/// Projects `spec.columns` out of `source` and keeps one row per key value.
///
/// Which of several rows sharing a key survives is unspecified.
pub fn extract(source: DataFrame, spec: &DimensionSpec) -> Result<DataFrame> {
    if !spec.output_columns().contains(&spec.key) {
        return Err(Error::Schema(format!(
            "Dedup key {} is not one of the columns of table {}",
            spec.key, spec.name
        )));
    }
    require_columns(&source, spec.name, &spec.source_columns())?;

    let projection: Vec<Expr> = spec
        .columns
        .iter()
        .map(|(source_column, output)| ident(*source_column).alias(*output))
        .collect();
    let output: Vec<Expr> = spec.output_columns().into_iter().map(ident).collect();

    debug!(table = spec.name, key = spec.key, "Extracting dimension");

    let dimension = source
        .select(projection)?
        .distinct_on(vec![ident(spec.key)], output, None)?;

    Ok(dimension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{collect_rows, event, records_to_df, song, str_field};
    use serde_json::json;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_songs_dedup_on_song_id() {
        let ctx = SessionContext::new();
        let catalog = records_to_df(
            &ctx,
            &[
                song("S1", "Test", "A1", "Artist1", 200.0, 2000),
                song("S1", "Test", "A1", "Artist1", 200.0, 2000),
                song("S2", "Other", "A1", "Artist1", 150.5, 0),
            ],
        );

        let rows = collect_rows(extract(catalog, &SONGS).unwrap()).await;
        assert_eq!(rows.len(), 2);

        let ids: HashSet<&str> = rows.iter().map(|r| str_field(r, "song_id")).collect();
        assert_eq!(ids, HashSet::from(["S1", "S2"]));

        let mut columns: Vec<&String> = rows[0].keys().collect();
        columns.sort();
        assert_eq!(columns, vec!["artist_id", "duration", "song_id", "title", "year"]);
    }

    #[tokio::test]
    async fn test_artists_are_renamed() {
        let ctx = SessionContext::new();
        let catalog = records_to_df(
            &ctx,
            &[
                song("S1", "Test", "A1", "Artist1", 200.0, 2000),
                song("S2", "Other", "A1", "Artist1", 150.5, 0),
                song("S3", "Third", "A2", "Artist2", 99.0, 1999),
            ],
        );

        let rows = collect_rows(extract(catalog, &ARTISTS).unwrap()).await;
        assert_eq!(rows.len(), 2);
        let a1 = rows.iter().find(|r| str_field(r, "artist_id") == "A1").unwrap();
        assert_eq!(str_field(a1, "name"), "Artist1");
        assert_eq!(str_field(a1, "location"), "Nowhere, NV");
        assert_eq!(a1["latitude"], json!(36.1));
        assert_eq!(a1["longitude"], json!(-115.2));
    }

    #[tokio::test]
    async fn test_users_one_row_per_user_whatever_the_level() {
        let ctx = SessionContext::new();
        let events = records_to_df(
            &ctx,
            &[
                event("NextSong", "U1", "free", "Test", "Artist1", 200.0, 1541440000000),
                event("NextSong", "U1", "paid", "Test", "Artist1", 200.0, 1541440005000),
                event("NextSong", "U2", "free", "Test", "Artist1", 200.0, 1541440009000),
            ],
        );

        let rows = collect_rows(extract(events, &USERS).unwrap()).await;
        assert_eq!(rows.len(), 2);
        let u1: Vec<_> = rows.iter().filter(|r| str_field(r, "user_id") == "U1").collect();
        assert_eq!(u1.len(), 1);
        assert!(["free", "paid"].contains(&str_field(u1[0], "level")));
    }

    #[tokio::test]
    async fn test_output_keys_are_unique_and_come_from_input() {
        let ctx = SessionContext::new();
        let records: Vec<_> = (0..40)
            .map(|i| {
                let id = format!("S{}", i % 7);
                song(&id, &format!("title {}", i), "A1", "Artist1", i as f64, 2000)
            })
            .collect();
        let catalog = records_to_df(&ctx, &records);

        let rows = collect_rows(extract(catalog, &SONGS).unwrap()).await;
        assert!(rows.len() <= records.len());

        let mut seen = HashSet::new();
        for row in &rows {
            let id = str_field(row, "song_id").to_string();
            assert!(records.iter().any(|r| r["song_id"] == json!(id)));
            assert!(seen.insert(id), "duplicate key in output");
        }
        assert_eq!(seen.len(), 7);
    }

    #[tokio::test]
    async fn test_unknown_column_is_schema_error() {
        let ctx = SessionContext::new();
        let events = records_to_df(&ctx, &[json!({"userId": "U1", "level": "free"})]);

        let result = extract(events, &USERS);
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[tokio::test]
    async fn test_key_outside_projection_is_rejected() {
        let ctx = SessionContext::new();
        let catalog = records_to_df(&ctx, &[song("S1", "Test", "A1", "Artist1", 200.0, 2000)]);
        let spec = DimensionSpec {
            name: "broken",
            columns: &[("title", "title")],
            key: "song_id",
            partition_by: &[],
        };

        assert!(matches!(extract(catalog, &spec), Err(Error::Schema(_))));
    }
}
