//! Shared helpers for the tabular representation.
//!
//! Every table in the pipeline is a polars `DataFrame` whose columns are all
//! `Float64` (nullable). Missing readings are nulls, never NaN sentinels.

use polars::prelude::*;

use crate::errors::PipelineError;

pub const YEAR: &str = "Year";
pub const MONTH: &str = "Month";
pub const DAY: &str = "Day";
pub const HOUR: &str = "Hour";
pub const MINUTE: &str = "Minute";
pub const ROW_ID: &str = "row_id";
pub const DATE: &str = "date";

/// Columns that locate a row in time rather than describe a measurement.
pub const IDENTITY_COLUMNS: [&str; 5] = [YEAR, MONTH, DAY, HOUR, ROW_ID];

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| *c == name)
}

pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series, PipelineError> {
    df.column(name).map_err(|_| PipelineError::MissingColumn {
        column: name.to_string(),
    })
}

/// Materialize a column as per-row optional values.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, PipelineError> {
    Ok(require_column(df, name)?.f64()?.into_iter().collect())
}

/// Measurement columns: everything except the identity/time fields.
pub fn value_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .filter(|c| !IDENTITY_COLUMNS.contains(c))
        .map(|c| c.to_string())
        .collect()
}

/// Per-row day keys encoded as `Year * 10_000 + Month * 100 + Day`.
///
/// Date fields must be present, non-null and integral; calendar validity is
/// enforced where the caller needs a concrete date.
pub fn day_keys(df: &DataFrame) -> Result<Vec<i64>, PipelineError> {
    let years = f64_values(df, YEAR)?;
    let months = f64_values(df, MONTH)?;
    let days = f64_values(df, DAY)?;

    let mut keys = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let y = integral_field(years[i], YEAR)?;
        let m = integral_field(months[i], MONTH)?;
        let d = integral_field(days[i], DAY)?;
        keys.push(y * 10_000 + m * 100 + d);
    }
    Ok(keys)
}

pub(crate) fn integral_field(value: Option<f64>, column: &str) -> Result<i64, PipelineError> {
    let v = value.ok_or_else(|| PipelineError::IntegrityError {
        column: column.to_string(),
        value: f64::NAN,
        reason: "date field is null".to_string(),
    })?;
    if v.fract() != 0.0 {
        return Err(PipelineError::IntegrityError {
            column: column.to_string(),
            value: v,
            reason: "date field is not an integer".to_string(),
        });
    }
    Ok(v as i64)
}
