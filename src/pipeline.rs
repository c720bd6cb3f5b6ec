//! Pipeline orchestration.
//!
//! Composes Reader → Pruner → Recoder → Identifier →
//! {Featurizer | Cluster Transformer} → Splitter, fail-fast: the first
//! failure is surfaced with the stage that produced it, and no partially
//! transformed table ever leaves the pipeline.

use log::info;
use polars::prelude::DataFrame;

use crate::clean;
use crate::cluster;
use crate::config::{PipelineConfig, MODE_CLUSTER};
use crate::errors::{PipelineError, Stage, StageError};
use crate::features;
use crate::io;
use crate::row_id;
use crate::split::{self, SplitTables};

#[derive(Debug)]
pub struct PipelineResult {
    /// The fully processed table (feature table or cluster matrix).
    pub table: DataFrame,
    pub splits: SplitTables,
}

fn at(stage: Stage) -> impl FnOnce(PipelineError) -> StageError {
    move |source| StageError::new(stage, source)
}

/// The ingestion prefix shared by both modes:
/// read, prune, recode time, assign row identifiers.
pub fn read_and_clean(config: &PipelineConfig) -> Result<DataFrame, StageError> {
    config.validate().map_err(at(Stage::Configure))?;

    let df = io::read_table(&config.data_paths).map_err(at(Stage::Read))?;
    let df = clean::prune_columns(df, &config.removed_columns).map_err(at(Stage::Prune))?;
    let df = clean::recode_time(df).map_err(at(Stage::Recode))?;
    let df = row_id::generate_row_ids(df).map_err(at(Stage::Identify))?;
    Ok(df)
}

/// Run the whole pipeline and split the result.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineResult, StageError> {
    let df = read_and_clean(config)?;

    let table = if config.mode == MODE_CLUSTER {
        cluster::cluster_transform(&df, &config.target_column, config.resolution_minutes)
            .map_err(at(Stage::Cluster))?
    } else {
        features::featurize(&df, config.n_time_points).map_err(at(Stage::Featurize))?
    };

    let fractions = config.split.fractions();
    let policy = config.split.policy().map_err(at(Stage::Configure))?;
    let splits = split::split_table(&table, &fractions, &policy).map_err(at(Stage::Split))?;

    info!(
        "pipeline finished: {} x {} {} table",
        table.height(),
        table.width(),
        config.mode
    );
    Ok(PipelineResult { table, splits })
}
