//! Column pruning and time recoding.

use log::info;
use polars::prelude::*;

use crate::errors::PipelineError;
use crate::table::{self, HOUR, MINUTE};

/// Drop a fixed set of named columns.
///
/// A removal name that is not present fails with `UnknownColumn`: an absent
/// column is schema drift, not something to paper over. All other columns
/// and all rows pass through unchanged.
pub fn prune_columns(df: DataFrame, removals: &[String]) -> Result<DataFrame, PipelineError> {
    let mut out = df;
    for name in removals {
        if !table::has_column(&out, name) {
            return Err(PipelineError::UnknownColumn {
                column: name.clone(),
            });
        }
        out = out.drop(name)?;
    }
    info!("pruned {} column(s), {} remain", removals.len(), out.width());
    Ok(out)
}

/// Merge the integer `Hour` and `Minute` columns into a fractional hour
/// (`Hour + Minute / 60`), then drop `Minute`.
///
/// Every non-null recoded value must lie in [0, 24).
pub fn recode_time(df: DataFrame) -> Result<DataFrame, PipelineError> {
    table::require_column(&df, HOUR)?;
    table::require_column(&df, MINUTE)?;

    let df = df
        .lazy()
        .with_column((col(HOUR) + col(MINUTE) / lit(60.0)).alias(HOUR))
        .collect()?;
    let df = df.drop(MINUTE)?;

    for value in df.column(HOUR)?.f64()?.into_iter().flatten() {
        if !(0.0..24.0).contains(&value) {
            return Err(PipelineError::IntegrityError {
                column: HOUR.to_string(),
                value,
                reason: "fractional hour out of range [0, 24)".to_string(),
            });
        }
    }
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn removals(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn prune_drops_only_the_named_columns() {
        let df = df! {
            "GHI" => [0.0f64, 1.0],
            "DHI" => [2.0f64, 3.0],
            "DNI" => [4.0f64, 5.0],
            "Temperature" => [6.0f64, 7.0],
        }
        .unwrap();

        let out = prune_columns(df, &removals(&["DHI", "DNI"])).unwrap();
        assert_eq!(out.get_column_names(), &["GHI", "Temperature"]);
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn prune_rejects_unknown_column() {
        let df = df! { "GHI" => [0.0f64] }.unwrap();
        let err = prune_columns(df, &removals(&["Fill_Flag"])).unwrap_err();
        match err {
            PipelineError::UnknownColumn { column } => assert_eq!(column, "Fill_Flag"),
            other => panic!("expected UnknownColumn, got {other:?}"),
        }
    }

    #[test]
    fn prune_is_not_silently_idempotent() {
        let df = df! {
            "GHI" => [0.0f64],
            "DHI" => [1.0f64],
        }
        .unwrap();

        let once = prune_columns(df, &removals(&["DHI"])).unwrap();
        let err = prune_columns(once, &removals(&["DHI"])).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownColumn { .. }));
    }

    #[test]
    fn recode_merges_hour_and_minute() {
        let df = df! {
            "Hour" => [13.0f64, 7.0],
            "Minute" => [30.0f64, 0.0],
            "GHI" => [100.0f64, 200.0],
        }
        .unwrap();

        let out = recode_time(df).unwrap();
        let hours: Vec<Option<f64>> = out.column("Hour").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(hours, vec![Some(13.5), Some(7.0)]);
        assert!(!out.get_column_names().contains(&"Minute"));
        assert!(out.get_column_names().contains(&"GHI"));
    }

    #[test]
    fn recode_handles_non_half_hour_minutes() {
        use approx::assert_relative_eq;

        let df = df! {
            "Hour" => [7.0f64],
            "Minute" => [20.0f64],
        }
        .unwrap();

        let out = recode_time(df).unwrap();
        let hour = out.column("Hour").unwrap().f64().unwrap().get(0).unwrap();
        assert_relative_eq!(hour, 7.0 + 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn recode_requires_both_time_columns() {
        let df = df! { "Hour" => [1.0f64] }.unwrap();
        let err = recode_time(df).unwrap_err();
        match err {
            PipelineError::MissingColumn { column } => assert_eq!(column, "Minute"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn recode_rejects_out_of_range_hours() {
        let df = df! {
            "Hour" => [24.0f64],
            "Minute" => [0.0f64],
        }
        .unwrap();
        let err = recode_time(df).unwrap_err();
        assert!(matches!(err, PipelineError::IntegrityError { .. }));
    }
}
