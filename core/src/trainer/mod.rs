//! Offline training
//!
//! Orchestrates one fit: encode the target, capture the feature schema,
//! fit the scaler over the full matrix, hold a tenth of the rows out for a
//! diagnostic accuracy check, fit the forest, and hand back the matched
//! artifact set. Persistence is the caller's last step, so no error path
//! leaves a partial set on disk.

pub mod dataset;

pub use dataset::{load_csv, Dataset, DatasetError};

use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

use crate::artifacts::{ArtifactError, ArtifactSet, ModelArtifact, ScalerArtifact};
use crate::model::{ModelError, RandomForestClassifier};
use crate::preprocessing::{LabelEncoder, LabelError, MinMaxScaler, ScaleError};
use crate::reading::READING_FIELDS;
use crate::schema::{ColumnSpec, FeatureSchema, FillPolicy, SchemaError};

/// Serve-time policy assigned to every dataset column that is not one of
/// the reading fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraColumnFill {
    /// Fill with 0.0.
    Zero,
    /// Fill with the column mean observed in the training set.
    Mean,
    /// Refuse to predict while the column is in the schema.
    Reject,
}

#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Trees in the forest.
    pub n_trees: usize,
    /// Depth cap per tree; `None` grows to purity.
    pub max_depth: Option<usize>,
    /// Base seed for bootstrap sampling and the holdout shuffle.
    pub seed: u64,
    /// Fraction of rows held out for the diagnostic accuracy check.
    pub holdout: f32,
    pub extra_fill: ExtraColumnFill,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            seed: 42,
            holdout: 0.1,
            extra_fill: ExtraColumnFill::Zero,
        }
    }
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Label(#[from] LabelError),
    #[error(transparent)]
    Scale(#[from] ScaleError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Outcome of one training run.
#[derive(Debug)]
pub struct TrainReport {
    pub artifacts: ArtifactSet,
    /// `None` when the dataset was too small to hold rows out.
    pub holdout_accuracy: Option<f32>,
    pub n_rows: usize,
}

/// Fit the full artifact set from a parsed dataset.
pub fn train(dataset: &Dataset, config: &TrainConfig) -> Result<TrainReport, TrainError> {
    let encoder = LabelEncoder::fit(&dataset.labels)?;
    let y: Vec<usize> = dataset
        .labels
        .iter()
        .map(|label| encoder.encode(label))
        .collect::<Result<_, _>>()?;

    let schema = build_schema(dataset, config.extra_fill);
    schema.validate()?;

    let mut scaler = MinMaxScaler::new();
    let scaled = scaler.fit_transform(&dataset.features)?;

    let mut forest = match config.max_depth {
        Some(depth) => RandomForestClassifier::new(config.n_trees)
            .with_random_state(config.seed)
            .with_max_depth(depth),
        None => RandomForestClassifier::new(config.n_trees).with_random_state(config.seed),
    };

    let (train_idx, test_idx) = split_indices(scaled.nrows(), config.holdout, config.seed);
    let holdout_accuracy = if test_idx.is_empty() {
        log::warn!("Dataset too small for a holdout split; fitting on all rows");
        forest.fit(&scaled, &y)?;
        None
    } else {
        let (x_train, y_train) = take_rows(&scaled, &y, &train_idx);
        let (x_test, y_test) = take_rows(&scaled, &y, &test_idx);
        forest.fit(&x_train, &y_train)?;
        Some(forest.score(&x_test, &y_test)?)
    };

    let artifacts = ArtifactSet {
        model: ModelArtifact {
            forest,
            schema_hash: schema.layout_hash(),
            n_classes: encoder.len(),
            trained_at: chrono::Utc::now().timestamp(),
        },
        scaler: ScalerArtifact { scaler, schema },
        encoder,
    };

    Ok(TrainReport {
        artifacts,
        holdout_accuracy,
        n_rows: dataset.n_rows(),
    })
}

/// Columns named like a reading field are served from the reading; every
/// other column is recorded by name with the configured fill policy.
fn build_schema(dataset: &Dataset, extra_fill: ExtraColumnFill) -> FeatureSchema {
    let columns = dataset
        .columns
        .iter()
        .enumerate()
        .map(|(j, name)| {
            if READING_FIELDS.contains(&name.as_str()) {
                ColumnSpec::reading(name)
            } else {
                let policy = match extra_fill {
                    ExtraColumnFill::Zero => FillPolicy::Constant(0.0),
                    ExtraColumnFill::Mean => FillPolicy::Mean(column_mean(&dataset.features, j)),
                    ExtraColumnFill::Reject => FillPolicy::Reject,
                };
                ColumnSpec::fill(name, policy)
            }
        })
        .collect();
    FeatureSchema::new(columns)
}

fn column_mean(x: &Array2<f32>, column: usize) -> f32 {
    let n = x.nrows();
    if n == 0 {
        return 0.0;
    }
    x.column(column).sum() / n as f32
}

/// Deterministic shuffled split. Returns an empty test partition when the
/// dataset cannot spare any row.
fn split_indices(n_samples: usize, holdout: f32, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let n_test = (n_samples as f32 * holdout).round() as usize;
    if n_test == 0 || n_test >= n_samples {
        return ((0..n_samples).collect(), Vec::new());
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_train = n_samples - n_test;
    let test = indices.split_off(n_train);
    (indices, test)
}

fn take_rows(x: &Array2<f32>, y: &[usize], indices: &[usize]) -> (Array2<f32>, Vec<usize>) {
    let rows = x.select(Axis(0), indices);
    let labels = indices.iter().map(|&i| y[i]).collect();
    (rows, labels)
}

// ============================================================================
// TESTS
// ============================================================================
