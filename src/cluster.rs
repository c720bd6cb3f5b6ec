//! Day-pivot transform for clustering daily irradiance curves.
//!
//! Rows are grouped by calendar day and the target readings are spread over
//! fixed intraday slots (48 for 30-minute data). Predictor columns are
//! dropped; the output has one row per day, chronologically ascending.

use chrono::NaiveDate;
use log::info;
use polars::prelude::*;

use crate::errors::PipelineError;
use crate::table::{self, DATE, HOUR};

const MINUTES_PER_DAY: u32 = 1440;

/// Pivot a time-ordered table into a day-by-slot matrix of target values.
///
/// Every day must supply exactly one reading per slot; filtering incomplete
/// days beforehand is the caller's responsibility, and a violation fails
/// with `IncompleteDay` rather than interpolating.
pub fn cluster_transform(
    df: &DataFrame,
    target: &str,
    resolution_minutes: u32,
) -> Result<DataFrame, PipelineError> {
    if resolution_minutes == 0 || MINUTES_PER_DAY % resolution_minutes != 0 {
        return Err(PipelineError::InvalidConfig(format!(
            "resolution of {resolution_minutes} minutes does not divide a day evenly"
        )));
    }
    let slots = (MINUTES_PER_DAY / resolution_minutes) as usize;

    let keys = table::day_keys(df)?;
    let hours = table::f64_values(df, HOUR)?;
    let targets = table::f64_values(df, target)?;

    let mut dates: Vec<f64> = Vec::new();
    let mut slot_cols: Vec<Vec<Option<f64>>> = vec![Vec::new(); slots];

    let mut i = 0usize;
    while i < df.height() {
        let key = keys[i];
        let mut counts = vec![0u32; slots];
        let mut values: Vec<Option<f64>> = vec![None; slots];

        let mut j = i;
        while j < df.height() && keys[j] == key {
            let h = hours[j].ok_or_else(|| PipelineError::IntegrityError {
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
            let slot = (h * slots as f64 / 24.0).floor() as usize;
            counts[slot] += 1;
            values[slot] = targets[j];
            j += 1;
        }

        if counts.iter().any(|&c| c != 1) {
            return Err(PipelineError::IncompleteDay {
                date: decode_date(key),
                readings: j - i,
                expected: slots,
            });
        }

        dates.push(key as f64);
        for (s, v) in values.into_iter().enumerate() {
            slot_cols[s].push(v);
        }
        i = j;
    }

    let width = (slots.max(2) - 1).to_string().len();
    let mut series = Vec::with_capacity(slots + 1);
    series.push(Series::new(DATE, dates));
    for (s, values) in slot_cols.into_iter().enumerate() {
        series.push(Series::new(format!("slot_{s:0width$}").as_str(), values));
    }
    let out = DataFrame::new(series)?;

    info!(
        "pivoted {} rows into {} day(s) of {} slots",
        df.height(),
        out.height(),
        slots
    );
    Ok(out)
}

fn decode_date(key: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(
        (key / 10_000) as i32,
        ((key / 100) % 100) as u32,
        (key % 100) as u32,
    )
    .unwrap_or_default()
}
