//! Random forest
//!
//! Bagged CART trees with majority voting. Bootstrap sampling is seeded
//! per tree from a base seed, so a fit is reproducible end to end and a
//! fitted forest predicts deterministically.

use std::collections::BTreeMap;

use ndarray::{Array2, Axis};
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTreeClassifier, ModelError};

/// Ensemble classifier over bootstrap-sampled decision trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTreeClassifier>,
    n_estimators: usize,
    max_depth: Option<usize>,
    random_state: Option<u64>,
    n_features: Option<usize>,
}

impl RandomForestClassifier {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            random_state: None,
            n_features: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Number of columns the forest was fit on.
    pub fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    /// Fit every tree on its own bootstrap sample of the rows.
    pub fn fit(&mut self, x: &Array2<f32>, y: &[usize]) -> Result<(), ModelError> {
        if x.nrows() != y.len() {
            return Err(ModelError::LengthMismatch {
                x_rows: x.nrows(),
                y_len: y.len(),
            });
        }
        if x.nrows() == 0 {
            return Err(ModelError::EmptyFit);
        }

        self.trees = Vec::with_capacity(self.n_estimators);
        self.n_features = Some(x.ncols());

        for i in 0..self.n_estimators {
            let seed = self.random_state.map(|s| s + i as u64);
            let indices = bootstrap_sample(x.nrows(), seed);

            let bootstrap_x = x.select(Axis(0), &indices);
            let bootstrap_y: Vec<usize> = indices.iter().map(|&idx| y[idx]).collect();

            let mut tree = match self.max_depth {
                Some(depth) => DecisionTreeClassifier::new().with_max_depth(depth),
                None => DecisionTreeClassifier::new(),
            };
            tree.fit(&bootstrap_x, &bootstrap_y)?;
            self.trees.push(tree);
        }

        Ok(())
    }

    /// Majority vote over all trees for one sample. Ties break to the
    /// smallest class code.
    pub fn predict_row(&self, values: &[f32]) -> Result<usize, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }

        let mut votes: BTreeMap<usize, usize> = BTreeMap::new();
        for tree in &self.trees {
            *votes.entry(tree.predict_row(values)?).or_insert(0) += 1;
        }

        let mut best_class = 0;
        let mut best_count = 0;
        for (class, count) in votes {
            if count > best_count {
                best_count = count;
                best_class = class;
            }
        }
        Ok(best_class)
    }

    /// Predict every row of a matrix.
    pub fn predict(&self, x: &Array2<f32>) -> Result<Vec<usize>, ModelError> {
        let mut predictions = Vec::with_capacity(x.nrows());
        let mut row_buf = Vec::with_capacity(x.ncols());
        for row in x.rows() {
            row_buf.clear();
            row_buf.extend(row.iter().copied());
            predictions.push(self.predict_row(&row_buf)?);
        }
        Ok(predictions)
    }

    /// Fraction of correct predictions on labeled data.
    pub fn score(&self, x: &Array2<f32>, y: &[usize]) -> Result<f32, ModelError> {
        let predictions = self.predict(x)?;
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(pred, label)| pred == label)
            .count();
        Ok(correct as f32 / y.len().max(1) as f32)
    }
}

/// Sample `n_samples` row indices with replacement.
fn bootstrap_sample(n_samples: usize, seed: Option<u64>) -> Vec<usize> {
    let dist = Uniform::from(0..n_samples);
    let mut indices = Vec::with_capacity(n_samples);

    if let Some(seed) = seed {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        for _ in 0..n_samples {
            indices.push(dist.sample(&mut rng));
        }
    } else {
        let mut rng = rand::thread_rng();
        for _ in 0..n_samples {
            indices.push(dist.sample(&mut rng));
        }
    }

    indices
}

// ============================================================================
// TESTS
// ============================================================================
