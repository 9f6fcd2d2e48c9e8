use chrono::{DateTime, NaiveDateTime};
use datafusion::arrow::array::{Int64Array, TimestampSecondArray};
use datafusion::arrow::datatypes::{DataType, TimeUnit};
use datafusion::common::DataFusionError;
use datafusion::error::Result;
use datafusion::logical_expr::{create_udf, ColumnarValue, ScalarUDF, Volatility};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub const START_TIME_UDF: &str = "epoch_ms_to_start_time";
pub const SONGPLAY_ID_UDF: &str = "songplay_id";

/// Next surrogate key handed out by `songplay_id`. Shared by every context in the process.
static NEXT_SONGPLAY_ID: AtomicI64 = AtomicI64::new(0);

/// Whole epoch seconds of an epoch-millisecond value, rounded towards negative infinity.
pub fn epoch_seconds(ts_ms: i64) -> i64 {
    ts_ms.div_euclid(1000)
}

/// Calendar instant (UTC) of an epoch-millisecond value, truncated to whole seconds.
pub fn start_time_from_epoch_ms(ts_ms: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(epoch_seconds(ts_ms), 0).map(|dt| dt.naive_utc())
}

/// `epoch_ms_to_start_time(Int64) -> Timestamp(Second)`
pub fn start_time_udf() -> ScalarUDF {
    create_udf(
        START_TIME_UDF,
        vec![DataType::Int64],
        DataType::Timestamp(TimeUnit::Second, None),
        Volatility::Immutable,
        Arc::new(convert_to_start_time),
    )
}

/// `songplay_id(Int64) -> Int64`
///
/// Emits one fresh id per input row. The argument only carries the row count.
/// Ids are unique for the life of the process; nothing is promised about
/// their order or contiguity.
pub fn songplay_id_udf() -> ScalarUDF {
    create_udf(
        SONGPLAY_ID_UDF,
        vec![DataType::Int64],
        DataType::Int64,
        Volatility::Volatile,
        Arc::new(assign_songplay_ids),
    )
}

fn convert_to_start_time(args: &[ColumnarValue]) -> Result<ColumnarValue> {
    let arrays = ColumnarValue::values_to_arrays(args)?;
    let int_array = arrays
        .first()
        .and_then(|array| array.as_any().downcast_ref::<Int64Array>())
        .ok_or_else(|| DataFusionError::Internal("Expected int64 epoch milliseconds".to_string()))?;

    let result: TimestampSecondArray = int_array
        .iter()
        .map(|opt_ts| opt_ts.map(epoch_seconds))
        .collect();

    Ok(ColumnarValue::Array(Arc::new(result)))
}

fn assign_songplay_ids(args: &[ColumnarValue]) -> Result<ColumnarValue> {
    let arrays = ColumnarValue::values_to_arrays(args)?;
    let rows = arrays
        .first()
        .map(|array| array.len())
        .ok_or_else(|| DataFusionError::Internal("songplay_id expects one argument".to_string()))?
        as i64;

    let first = NEXT_SONGPLAY_ID.fetch_add(rows, Ordering::Relaxed);
    let ids = Int64Array::from_iter_values(first..first + rows);

    Ok(ColumnarValue::Array(Arc::new(ids)))
}
