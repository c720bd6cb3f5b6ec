use std::fmt;
use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading config file {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse JSON configuration in {path:?}: {source}")]
    JsonParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Configuration file not found at {path:?}")]
    NotFound { path: PathBuf },
}

/// Failure modes of the preprocessing pipeline. Every variant is terminal:
/// a partially transformed table is never surfaced as complete.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source file not found: {path:?}")]
    SourceNotFound { path: PathBuf },

    #[error("schema mismatch in {path:?}: expected columns {expected:?}, found {found:?}")]
    SchemaMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("cannot drop unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("required column '{column}' is missing")]
    MissingColumn { column: String },

    #[error("duplicate timestamp: two rows encode to row id {id}")]
    DuplicateTimestamp { id: i64 },

    #[error("invalid window of {n_time_points} time points: {reason}")]
    InvalidWindow { n_time_points: usize, reason: String },

    #[error("day {date} supplied {readings} readings, expected exactly {expected}")]
    IncompleteDay {
        date: NaiveDate,
        readings: usize,
        expected: usize,
    },

    #[error("invalid split fractions {fractions:?}: {reason}")]
    InvalidSplit { fractions: Vec<f64>, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration loading failed: {0}")]
    ConfigLoad(#[from] ConfigError),

    #[error("malformed source {path:?}: {reason}")]
    MalformedSource { path: PathBuf, reason: String },

    #[error("invalid numeric value '{value}' in {path:?} at data row {row}, column '{column}'")]
    InvalidNumber {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    #[error("data integrity check failed for column '{column}', value '{value}': {reason}")]
    IntegrityError {
        column: String,
        value: f64,
        reason: String,
    },

    #[error("IO error reading data file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configure,
    Read,
    Prune,
    Recode,
    Identify,
    Featurize,
    Cluster,
    Split,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configure => "configure",
            Stage::Read => "read",
            Stage::Prune => "prune",
            Stage::Recode => "recode",
            Stage::Identify => "identify",
            Stage::Featurize => "featurize",
            Stage::Cluster => "cluster",
            Stage::Split => "split",
        };
        f.write_str(name)
    }
}

/// A pipeline failure attributed to the stage that produced it.
#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

impl StageError {
    pub fn new(stage: Stage, source: PipelineError) -> Self {
        Self { stage, source }
    }
}
