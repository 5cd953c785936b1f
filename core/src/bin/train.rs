//! Offline trainer - fits the classifier and persists its artifacts.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use soilsense_core::trainer::{self, ExtraColumnFill, TrainConfig, TrainError};

#[derive(Parser)]
#[command(name = "train")]
#[command(about = "Fit the soil health classifier and persist its artifact set", long_about = None)]
struct Args {
    /// Historical dataset CSV
    #[arg(short, long)]
    data: PathBuf,

    /// Directory the artifact set is written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Target column header
    #[arg(long, default_value = "health_status")]
    target: String,

    /// Timestamp column header
    #[arg(long, default_value = "timestamp")]
    timestamp: String,

    /// Serve-time fill for train-only columns (zero, mean, reject)
    #[arg(long, default_value = "zero")]
    extra_fill: String,

    /// Number of trees in the forest
    #[arg(long, default_value = "100")]
    trees: usize,

    /// Depth cap per tree (unbounded when omitted)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Base seed for bootstrap sampling and the holdout split
    #[arg(long, default_value = "42")]
    seed: u64,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let extra_fill = match args.extra_fill.as_str() {
        "zero" => ExtraColumnFill::Zero,
        "mean" => ExtraColumnFill::Mean,
        "reject" => ExtraColumnFill::Reject,
        other => {
            log::error!("Unknown --extra-fill '{other}' (expected zero, mean or reject)");
            process::exit(2);
        }
    };

    if let Err(e) = run(&args, extra_fill) {
        log::error!("Training failed: {e}");
        process::exit(1);
    }
}

fn run(args: &Args, extra_fill: ExtraColumnFill) -> Result<(), TrainError> {
    let dataset = trainer::load_csv(&args.data, &args.timestamp, &args.target)?;
    log::info!(
        "Loaded {} rows x {} feature columns from {}",
        dataset.n_rows(),
        dataset.n_columns(),
        args.data.display()
    );
    log::info!("Feature columns: {:?}", dataset.columns);

    let config = TrainConfig {
        n_trees: args.trees,
        max_depth: args.max_depth,
        seed: args.seed,
        extra_fill,
        ..TrainConfig::default()
    };
    let report = trainer::train(&dataset, &config)?;

    let schema = &report.artifacts.scaler.schema;
    log::info!("Label table: {:?}", report.artifacts.encoder.classes());
    if !schema.train_only_columns().is_empty() {
        log::info!(
            "Train-only columns (filled at serve time): {:?}",
            schema.train_only_columns()
        );
    }
    match report.holdout_accuracy {
        Some(accuracy) => log::info!("Held-out accuracy: {accuracy:.2}"),
        None => log::info!("No holdout partition; accuracy not measured"),
    }

    report.artifacts.save(&args.out_dir)?;
    log::info!("Artifact set written to {}", args.out_dir.display());
    Ok(())
}
