use crate::schema::{events, NEXT_SONG_PAGE};
use common::{Error, Result};
use datafusion::common::DFSchema;
use datafusion::prelude::*;

pub fn has_column(schema: &DFSchema, name: &str) -> bool {
    schema.fields().iter().any(|field| field.name() == name)
}

/// Fails with a schema error naming every column of `required` absent from `df`.
pub fn require_columns(df: &DataFrame, table: &str, required: &[&str]) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !has_column(df.schema(), name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Schema(format!(
            "Missing column(s) {:?} required by table {}",
            missing, table
        )))
    }
}

/// Keeps only song-play actions (`page == "NextSong"`).
pub fn filter_song_plays(df: DataFrame) -> Result<DataFrame> {
    require_columns(&df, "events", &[events::PAGE])?;
    Ok(df.filter(ident(events::PAGE).eq(lit(NEXT_SONG_PAGE)))?)
}
