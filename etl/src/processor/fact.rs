use super::columns::{filter_song_plays, require_columns};
use super::temporal::{calendar_part, start_time_expr};
use super::udf::songplay_id_udf;
use super::writer::WriteSpec;
use crate::schema::{catalog, events};
use arrow::datatypes::DataType;
use common::Result;
use datafusion::common::{Column, JoinType};
use datafusion::prelude::*;
use tracing::debug;

pub const SONGPLAYS: WriteSpec = WriteSpec {
    name: "songplays",
    partition_by: &["year", "month"],
};

const EVENTS_ALIAS: &str = "events";
const CATALOG_ALIAS: &str = "catalog";

const EVENT_COLUMNS: &[&str] = &[
    events::PAGE,
    events::TS,
    events::USER_ID,
    events::LEVEL,
    events::SONG,
    events::ARTIST,
    events::LENGTH,
    events::SESSION_ID,
    events::LOCATION,
    events::USER_AGENT,
];

const CATALOG_COLUMNS: &[&str] = &[
    catalog::SONG_ID,
    catalog::TITLE,
    catalog::ARTIST_ID,
    catalog::ARTIST_NAME,
    catalog::DURATION,
];

fn event_col(name: &str) -> Expr {
    Expr::Column(Column::new(Some(EVENTS_ALIAS), name))
}

fn catalog_col(name: &str) -> Expr {
    Expr::Column(Column::new(Some(CATALOG_ALIAS), name))
}

/// An event plays a catalog song iff title, artist name and duration are all equal.
///
/// Length and duration are compared as Float64 so integral and fractional
/// encodings of the same number match. There is no tolerance.
pub fn match_predicate() -> Expr {
    event_col(events::SONG)
        .eq(catalog_col(catalog::TITLE))
        .and(event_col(events::ARTIST).eq(catalog_col(catalog::ARTIST_NAME)))
        .and(
            cast(event_col(events::LENGTH), DataType::Float64)
                .eq(cast(catalog_col(catalog::DURATION), DataType::Float64)),
        )
}

/// Builds the songplays fact table.
///
/// `catalog` should be its own load of the catalog source; it is deduplicated
/// on `song_id` here. Events that match no catalog song, or carry no `ts`,
/// produce no row.
pub fn correlate(events: DataFrame, catalog: DataFrame) -> Result<DataFrame> {
    require_columns(&events, SONGPLAYS.name, EVENT_COLUMNS)?;
    require_columns(&catalog, SONGPLAYS.name, CATALOG_COLUMNS)?;

    let song_plays = filter_song_plays(events)?
        .filter(ident(events::TS).is_not_null())?
        .alias(EVENTS_ALIAS)?;

    let catalog_columns: Vec<Expr> = CATALOG_COLUMNS.iter().copied().map(ident).collect();
    let songs = catalog
        .distinct_on(vec![ident(catalog::SONG_ID)], catalog_columns, None)?
        .alias(CATALOG_ALIAS)?;

    debug!(predicate = %match_predicate(), "Correlating events with catalog");

    let joined = song_plays.join_on(songs, JoinType::Inner, [match_predicate()])?;

    let start_time = start_time_expr(event_col(events::TS));
    let songplays = joined.select(vec![
        songplay_id_udf()
            .call(vec![cast(event_col(events::TS), DataType::Int64)])
            .alias("songplay_id"),
        start_time.clone().alias("start_time"),
        event_col(events::USER_ID).alias("user_id"),
        event_col(events::LEVEL).alias("level"),
        catalog_col(catalog::SONG_ID).alias("song_id"),
        catalog_col(catalog::ARTIST_ID).alias("artist_id"),
        event_col(events::SESSION_ID).alias("session_id"),
        event_col(events::LOCATION).alias("location"),
        event_col(events::USER_AGENT).alias("user_agent"),
        calendar_part("year", start_time.clone()).alias("year"),
        calendar_part("month", start_time).alias("month"),
    ])?;

    Ok(songplays)
}
