//! Row identifier generation.
//!
//! Each row gets a surrogate key encoding its date and time,
//! `Year * 10^8 + Month * 10^6 + Day * 10^4 + round(100 * Hour)`, so the
//! zero-padded decimal rendering sorts exactly like the underlying
//! (year, month, day, hour) tuple. The table leaves this stage sorted
//! ascending by id with duplicates rejected.

use chrono::NaiveDate;
use log::info;
use polars::prelude::*;

use crate::errors::PipelineError;
use crate::table::{self, DAY, HOUR, MONTH, ROW_ID, YEAR};

fn encode_id(year: i64, month: i64, day: i64, hour: f64) -> i64 {
    year * 100_000_000 + month * 1_000_000 + day * 10_000 + (hour * 100.0).round() as i64
}

/// Append a unique, sortable `row_id` column and sort the table by it.
///
/// Fails with `DuplicateTimestamp` when two rows encode to the same id,
/// which indicates overlapping source records.
pub fn generate_row_ids(df: DataFrame) -> Result<DataFrame, PipelineError> {
    let years = table::f64_values(&df, YEAR)?;
    let months = table::f64_values(&df, MONTH)?;
    let days = table::f64_values(&df, DAY)?;
    let hours = table::f64_values(&df, HOUR)?;

    let mut ids: Vec<f64> = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let y = table::integral_field(years[i], YEAR)?;
        let m = table::integral_field(months[i], MONTH)?;
        let d = table::integral_field(days[i], DAY)?;
        if !(0..=9999).contains(&y) {
            return Err(PipelineError::IntegrityError {
                column: YEAR.to_string(),
                value: y as f64,
                reason: "year outside the encodable range 0-9999".to_string(),
            });
        }
        NaiveDate::from_ymd_opt(y as i32, m as u32, d as u32).ok_or_else(|| {
            PipelineError::IntegrityError {
                column: DAY.to_string(),
                value: d as f64,
                reason: format!("{y:04}-{m:02}-{d:02} is not a valid calendar date"),
            }
        })?;
        let h = hours[i].ok_or_else(|| PipelineError::IntegrityError {
            column: HOUR.to_string(),
            value: f64::NAN,
            reason: "hour is null".to_string(),
        })?;
        if !(0.0..24.0).contains(&h) {
            return Err(PipelineError::IntegrityError {
                column: HOUR.to_string(),
                value: h,
                reason: "fractional hour out of range [0, 24)".to_string(),
            });
        }
        ids.push(encode_id(y, m, d, h) as f64);
    }

    let mut df = df;
    df.with_column(Series::new(ROW_ID, ids))?;
    let df = df.sort(
        [ROW_ID],
        SortMultipleOptions::new().with_order_descending(false),
    )?;

    let sorted: Vec<Option<f64>> = df.column(ROW_ID)?.f64()?.into_iter().collect();
    for pair in sorted.windows(2) {
        if pair[0] == pair[1] {
            if let Some(id) = pair[0] {
                return Err(PipelineError::DuplicateTimestamp { id: id as i64 });
            }
        }
    }

    info!("assigned {} row identifiers", df.height());
    Ok(df)
}
