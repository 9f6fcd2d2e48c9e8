use super::columns::require_columns;
use super::udf::start_time_udf;
use super::writer::WriteSpec;
use crate::schema::events;
use arrow::datatypes::DataType;
use common::Result;
use datafusion::functions::expr_fn::date_part;
use datafusion::prelude::*;

pub const TIME: WriteSpec = WriteSpec {
    name: "time",
    partition_by: &["year", "month"],
};

/// `start_time` of an epoch-millisecond expression: whole seconds, UTC.
pub fn start_time_expr(ts_ms: Expr) -> Expr {
    start_time_udf().call(vec![cast(ts_ms, DataType::Int64)])
}

/// One calendar field of a `start_time` expression as Int32.
///
/// `week` is the ISO-8601 week number, so the first days of January may
/// belong to week 52 or 53 of the previous year.
pub fn calendar_part(part: &str, start_time: Expr) -> Expr {
    cast(date_part(lit(part), start_time), DataType::Int32)
}

/// Builds the time dimension from song-play events.
///
/// Rows whose `ts` is null have no instant and are dropped.
pub fn decompose(song_plays: DataFrame) -> Result<DataFrame> {
    require_columns(&song_plays, TIME.name, &[events::TS])?;

    let start_time = || ident("start_time");

    let time = song_plays
        .select(vec![start_time_expr(ident(events::TS)).alias("start_time")])?
        .filter(start_time().is_not_null())?
        .distinct()?
        .select(vec![
            start_time(),
            calendar_part("hour", start_time()).alias("hour"),
            calendar_part("day", start_time()).alias("day"),
            calendar_part("week", start_time()).alias("week"),
            calendar_part("month", start_time()).alias("month"),
            calendar_part("year", start_time()).alias("year"),
        ])?;

    Ok(time)
}
