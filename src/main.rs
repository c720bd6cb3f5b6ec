use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use solar_pipeline::config::{self, PipelineConfig, MODE_CLUSTER};
use solar_pipeline::io;
use solar_pipeline::pipeline;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Cleaning and reshaping pipeline for solar irradiance time series", long_about = None)]
struct Cli {
    /// JSON pipeline configuration; when set, the shaping flags below are ignored
    #[clap(long, value_parser)]
    config: Option<PathBuf>,

    /// Source CSV files, in concatenation order (repeatable)
    #[clap(long)]
    data: Vec<PathBuf>,

    /// Glob pattern for source files, expanded in lexicographic order
    #[clap(long)]
    data_glob: Option<String>,

    /// Downstream shape: "features" or "cluster"
    #[clap(long, default_value = "features")]
    mode: String,

    /// Window length in rows for featurization
    #[clap(long, default_value_t = 4)]
    n_time_points: usize,

    /// Intraday sampling resolution in minutes
    #[clap(long, default_value_t = 30)]
    resolution_minutes: u32,

    #[clap(long, default_value = "GHI")]
    target_column: String,

    /// "chronological" or "random"
    #[clap(long, default_value = "chronological")]
    split_policy: String,

    #[clap(long, default_value_t = 42)]
    seed: u64,

    #[clap(long, default_value_t = 0.7)]
    train_frac: f64,

    #[clap(long, default_value_t = 0.15)]
    validation_frac: f64,

    #[clap(long, default_value_t = 0.15)]
    test_frac: f64,

    /// Directory for the processed table and its splits
    #[clap(long, default_value = "output")]
    output_dir: PathBuf,
}

fn assemble_config(cli: &Cli) -> Result<PipelineConfig> {
    if let Some(path) = &cli.config {
        let config = config::load_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
        return Ok(config);
    }

    let mut paths = cli.data.clone();
    if let Some(pattern) = &cli.data_glob {
        let entries =
            glob::glob(pattern).with_context(|| format!("invalid glob pattern '{pattern}'"))?;
        for entry in entries {
            paths.push(entry.context("failed to expand glob entry")?);
        }
    }
    if paths.is_empty() {
        bail!("no source files: pass --data, --data-glob or --config");
    }

    let mut config = PipelineConfig::new(paths);
    config.mode = cli.mode.clone();
    config.n_time_points = cli.n_time_points;
    config.resolution_minutes = cli.resolution_minutes;
    config.target_column = cli.target_column.clone();
    config.split.policy = cli.split_policy.clone();
    config.split.seed = cli.seed;
    config.split.train = cli.train_frac;
    config.split.validation = cli.validation_frac;
    config.split.test = cli.test_frac;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    let config = assemble_config(&cli)?;
    info!(
        "processing {} source file(s) in {} mode",
        config.data_paths.len(),
        config.mode
    );

    let result = pipeline::run_pipeline(&config)?;

    std::fs::create_dir_all(&cli.output_dir).with_context(|| {
        format!("failed to create output directory {}", cli.output_dir.display())
    })?;

    let table_name = if config.mode == MODE_CLUSTER {
        "cluster_matrix.csv"
    } else {
        "features.csv"
    };
    io::write_table(&result.table, &cli.output_dir.join(table_name))?;
    io::write_table(&result.splits.train, &cli.output_dir.join("train.csv"))?;
    io::write_table(&result.splits.validation, &cli.output_dir.join("validation.csv"))?;
    io::write_table(&result.splits.test, &cli.output_dir.join("test.csv"))?;

    info!(
        "wrote {} plus splits to {} in {:.2?}",
        table_name,
        cli.output_dir.display(),
        start.elapsed()
    );
    Ok(())
}
