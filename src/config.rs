//! Pipeline configuration.
//!
//! Everything the source kept as module-level constants (removed-column
//! list, file paths) is explicit configuration here, loadable from a JSON
//! file with per-field defaults.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, PipelineError};
use crate::split::{SplitFractions, SplitPolicy};

pub const MODE_FEATURES: &str = "features";
pub const MODE_CLUSTER: &str = "cluster";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PipelineConfig {
    /// Ordered list of source files; rows concatenate in this order.
    pub data_paths: Vec<PathBuf>,
    #[serde(default = "default_removed_columns")]
    pub removed_columns: Vec<String>,
    #[serde(default = "default_target_column")]
    pub target_column: String,
    /// Downstream shape: "features" (lag table) or "cluster" (day matrix).
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_n_time_points")]
    pub n_time_points: usize,
    #[serde(default = "default_resolution_minutes")]
    pub resolution_minutes: u32,
    #[serde(default)]
    pub split: SplitConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SplitConfig {
    #[serde(default = "default_split_policy")]
    pub policy: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_train_fraction")]
    pub train: f64,
    #[serde(default = "default_validation_fraction")]
    pub validation: f64,
    #[serde(default = "default_test_fraction")]
    pub test: f64,
}

fn default_removed_columns() -> Vec<String> {
    [
        "DHI",
        "DNI",
        "Clearsky_DHI",
        "Clearsky_DNI",
        "Clearsky_GHI",
        "Fill_Flag",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_target_column() -> String {
    "GHI".to_string()
}

fn default_mode() -> String {
    MODE_FEATURES.to_string()
}

fn default_n_time_points() -> usize {
    4
}

fn default_resolution_minutes() -> u32 {
    30
}

fn default_split_policy() -> String {
    "chronological".to_string()
}

fn default_seed() -> u64 {
    42
}

fn default_train_fraction() -> f64 {
    0.7
}

fn default_validation_fraction() -> f64 {
    0.15
}

fn default_test_fraction() -> f64 {
    0.15
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            policy: default_split_policy(),
            seed: default_seed(),
            train: default_train_fraction(),
            validation: default_validation_fraction(),
            test: default_test_fraction(),
        }
    }
}

impl SplitConfig {
    pub fn fractions(&self) -> SplitFractions {
        SplitFractions {
            train: self.train,
            validation: self.validation,
            test: self.test,
        }
    }

    pub fn policy(&self) -> Result<SplitPolicy, PipelineError> {
        match self.policy.as_str() {
            "chronological" => Ok(SplitPolicy::Chronological),
            "random" => Ok(SplitPolicy::Random { seed: self.seed }),
            other => Err(PipelineError::InvalidConfig(format!(
                "unknown split policy '{other}'"
            ))),
        }
    }
}

impl PipelineConfig {
    pub fn new(data_paths: Vec<PathBuf>) -> Self {
        Self {
            data_paths,
            removed_columns: default_removed_columns(),
            target_column: default_target_column(),
            mode: default_mode(),
            n_time_points: default_n_time_points(),
            resolution_minutes: default_resolution_minutes(),
            split: SplitConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.data_paths.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "at least one source file is required".to_string(),
            ));
        }
        if self.mode != MODE_FEATURES && self.mode != MODE_CLUSTER {
            return Err(PipelineError::InvalidConfig(format!(
                "unknown mode '{}', expected '{MODE_FEATURES}' or '{MODE_CLUSTER}'",
                self.mode
            )));
        }
        if self.resolution_minutes == 0 || 1440 % self.resolution_minutes != 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "resolution of {} minutes does not divide a day evenly",
                self.resolution_minutes
            )));
        }
        self.split.fractions().validate()?;
        self.split.policy()?;
        Ok(())
    }
}

/// Load a pipeline configuration from a JSON file.
pub fn load_config(path: &PathBuf) -> Result<PipelineConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound { path: path.clone() });
    }
    let file = File::open(path).map_err(|e| ConfigError::IoError {
        path: path.clone(),
        source: e,
    })?;
    let reader = BufReader::new(file);
    let config: PipelineConfig =
        serde_json::from_reader(reader).map_err(|e| ConfigError::JsonParseError {
            path: path.clone(),
            source: e,
        })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_gets_all_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"data_paths": ["data/2016.csv"]}"#).unwrap();

        assert_eq!(config.removed_columns.len(), 6);
        assert_eq!(config.target_column, "GHI");
        assert_eq!(config.mode, MODE_FEATURES);
        assert_eq!(config.resolution_minutes, 30);
        assert_eq!(config.split.train, 0.7);
        config.validate().unwrap();
    }

    #[test]
    fn empty_path_list_is_invalid() {
        let config = PipelineConfig::new(Vec::new());
        assert!(matches!(
            config.validate().unwrap_err(),
            PipelineError::InvalidConfig(_)
        ));
    }

    #[test]
    fn unknown_mode_is_invalid() {
        let mut config = PipelineConfig::new(vec![PathBuf::from("a.csv")]);
        config.mode = "forecast".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            PipelineError::InvalidConfig(_)
        ));
    }

    #[test]
    fn unknown_split_policy_is_invalid() {
        let mut config = PipelineConfig::new(vec![PathBuf::from("a.csv")]);
        config.split.policy = "stratified".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            PipelineError::InvalidConfig(_)
        ));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = load_config(&PathBuf::from("/no/such/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
