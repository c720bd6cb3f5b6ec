//! Sliding-window featurization for supervised learning.
//!
//! Each emitted row carries its own fields plus `n_time_points` blocks of
//! the preceding rows' measurement values, most recent first (`_lag1` is the
//! immediately preceding row). Windows reset at day boundaries: rows with
//! fewer than `n_time_points` same-day predecessors are excluded.

use log::info;
use polars::prelude::*;

use crate::errors::PipelineError;
use crate::table;

pub fn featurize(df: &DataFrame, n_time_points: usize) -> Result<DataFrame, PipelineError> {
    if n_time_points == 0 {
        return Ok(df.clone());
    }

    let keys = table::day_keys(df)?;

    // Contiguous day runs; the table is expected to be time-ordered.
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for i in 0..keys.len() {
        match runs.last_mut() {
            Some(run) if keys[run.0] == keys[i] => run.1 += 1,
            _ => runs.push((i, 1)),
        }
    }

    if let Some(min_len) = runs.iter().map(|&(_, len)| len).min() {
        if n_time_points > min_len {
            return Err(PipelineError::InvalidWindow {
                n_time_points,
                reason: format!("window exceeds the shortest day ({min_len} rows)"),
            });
        }
    }

    let mut kept: Vec<u32> = Vec::new();
    for &(start, len) in &runs {
        for i in (start + n_time_points)..(start + len) {
            kept.push(i as u32);
        }
    }

    let value_cols = table::value_columns(df);
    let mut source: Vec<(String, Vec<Option<f64>>)> = Vec::with_capacity(value_cols.len());
    for name in value_cols {
        let values = table::f64_values(df, &name)?;
        source.push((name, values));
    }

    let mut lagged: Vec<Series> = Vec::with_capacity(n_time_points * source.len());
    for lag in 1..=n_time_points {
        for (name, values) in &source {
            let shifted: Vec<Option<f64>> = kept
                .iter()
                .map(|&i| values[i as usize - lag])
                .collect();
            lagged.push(Series::new(format!("{name}_lag{lag}").as_str(), shifted));
        }
    }

    let base = df.take(&IdxCa::from_vec("idx", kept))?;
    let out = base.hstack(&lagged)?;

    info!(
        "featurized {} rows into {} rows with {} lag columns",
        df.height(),
        out.height(),
        lagged.len()
    );
    Ok(out)
}
