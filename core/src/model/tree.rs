//! CART decision tree
//!
//! Gini-impurity splits with midpoint thresholds, grown depth-first over
//! index slices so bootstrap samples never copy the feature matrix twice.

use std::collections::HashMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model is not fitted")]
    NotFitted,
    #[error("cannot fit on zero samples")]
    EmptyFit,
    #[error("feature matrix has {x_rows} rows but target has {y_len} labels")]
    LengthMismatch { x_rows: usize, y_len: usize },
    #[error("feature width mismatch: model was fit on {expected} columns, input has {actual}")]
    WidthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        class: usize,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Single decision tree classifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    root: Option<TreeNode>,
    max_depth: Option<usize>,
    n_features: Option<usize>,
}

impl DecisionTreeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    /// Grow the tree on `x` (n_samples x n_features) and integer labels.
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

        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.n_features = Some(x.ncols());
        self.root = Some(grow(x, y, &indices, 0, self.max_depth));
        Ok(())
    }

    /// Predict the class of one sample.
    pub fn predict_row(&self, values: &[f32]) -> Result<usize, ModelError> {
        let expected = self.n_features.ok_or(ModelError::NotFitted)?;
        if values.len() != expected {
            return Err(ModelError::WidthMismatch {
                expected,
                actual: values.len(),
            });
        }

        let mut node = self.root.as_ref().ok_or(ModelError::NotFitted)?;
        loop {
            match node {
                TreeNode::Leaf { class, .. } => return Ok(*class),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if values[*feature] <= *threshold { left } else { right };
                }
            }
        }
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
}

// ============================================================================
// TREE GROWING
// ============================================================================

fn grow(
    x: &Array2<f32>,
    y: &[usize],
    indices: &[usize],
    depth: usize,
    max_depth: Option<usize>,
) -> TreeNode {
    let n_samples = indices.len();

    // Pure node
    if indices.iter().all(|&i| y[i] == y[indices[0]]) {
        return TreeNode::Leaf {
            class: y[indices[0]],
            n_samples,
        };
    }

    // Depth stop
    if max_depth.is_some_and(|d| depth >= d) {
        return TreeNode::Leaf {
            class: majority_class(y, indices),
            n_samples,
        };
    }

    let Some((feature, threshold)) = best_split(x, y, indices) else {
        return TreeNode::Leaf {
            class: majority_class(y, indices),
            n_samples,
        };
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| x[[i, feature]] <= threshold);

    if left_idx.is_empty() || right_idx.is_empty() {
        return TreeNode::Leaf {
            class: majority_class(y, indices),
            n_samples,
        };
    }

    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(grow(x, y, &left_idx, depth + 1, max_depth)),
        right: Box::new(grow(x, y, &right_idx, depth + 1, max_depth)),
    }
}

/// Most frequent class among the given rows. Ties break to the smallest
/// class code so a fitted tree predicts deterministically.
fn majority_class(y: &[usize], indices: &[usize]) -> usize {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for &i in indices {
        *counts.entry(y[i]).or_insert(0) += 1;
    }

    // Class-ascending scan; strict improvement keeps the smallest class
    // on ties.
    let mut ordered: Vec<(usize, usize)> = counts.into_iter().collect();
    ordered.sort_unstable();

    let mut best_class = 0;
    let mut best_count = 0;
    for (class, count) in ordered {
        if count > best_count {
            best_count = count;
            best_class = class;
        }
    }
    best_class
}

fn gini_from_counts(counts: &HashMap<usize, usize>, n: f32) -> f32 {
    let mut gini = 1.0;
    for &count in counts.values() {
        let p = count as f32 / n;
        gini -= p * p;
    }
    gini
}

/// Best (feature, midpoint threshold) across all columns by Gini gain.
///
/// Each column is scanned once over sorted values with incrementally
/// maintained left/right class counts.
fn best_split(x: &Array2<f32>, y: &[usize], indices: &[usize]) -> Option<(usize, f32)> {
    let n = indices.len();
    if n < 2 {
        return None;
    }

    let mut parent_counts: HashMap<usize, usize> = HashMap::new();
    for &i in indices {
        *parent_counts.entry(y[i]).or_insert(0) += 1;
    }
    let parent_gini = gini_from_counts(&parent_counts, n as f32);

    let mut best: Option<(usize, f32)> = None;
    let mut best_gain = 0.0;

    for feature in 0..x.ncols() {
        let mut ordered: Vec<(f32, usize)> =
            indices.iter().map(|&i| (x[[i, feature]], y[i])).collect();
        ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_counts: HashMap<usize, usize> = HashMap::new();
        let mut right_counts = parent_counts.clone();

        for k in 0..n - 1 {
            let (value, label) = ordered[k];
            *left_counts.entry(label).or_insert(0) += 1;
            if let Some(count) = right_counts.get_mut(&label) {
                *count -= 1;
                if *count == 0 {
                    right_counts.remove(&label);
                }
            }

            // No threshold exists between equal values.
            if value == ordered[k + 1].0 {
                continue;
            }

            let n_left = (k + 1) as f32;
            let n_right = (n - k - 1) as f32;
            let weighted = (n_left / n as f32) * gini_from_counts(&left_counts, n_left)
                + (n_right / n as f32) * gini_from_counts(&right_counts, n_right);
            let gain = parent_gini - weighted;

            if gain > best_gain {
                best_gain = gain;
                best = Some((feature, (value + ordered[k + 1].0) / 2.0));
            }
        }
    }

    best
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_and_predict_separable_data() {
        let x = array![[0.0, 0.0], [0.1, 0.2], [5.0, 5.1], [5.2, 4.9]];
        let y = vec![0, 0, 1, 1];

        let mut tree = DecisionTreeClassifier::new();
        tree.fit(&x, &y).unwrap();

        assert!(tree.is_fitted());
        assert_eq!(tree.predict_row(&[0.05, 0.1]).unwrap(), 0);
        assert_eq!(tree.predict_row(&[5.1, 5.0]).unwrap(), 1);
    }

    #[test]
    fn test_single_class_becomes_a_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = vec![4, 4, 4];

        let mut tree = DecisionTreeClassifier::new();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict_row(&[99.0]).unwrap(), 4);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = vec![0, 1, 0, 1];

        let mut tree = DecisionTreeClassifier::new().with_max_depth(0);
        tree.fit(&x, &y).unwrap();
        // Depth 0 forces a single majority leaf; ties break to class 0.
        assert_eq!(tree.predict_row(&[0.5]).unwrap(), 0);
        assert_eq!(tree.predict_row(&[3.0]).unwrap(), 0);
    }

    #[test]
    fn test_width_mismatch_on_predict() {
        let x = array![[0.0, 1.0], [2.0, 3.0]];
        let y = vec![0, 1];

        let mut tree = DecisionTreeClassifier::new();
        tree.fit(&x, &y).unwrap();
        assert!(matches!(
            tree.predict_row(&[1.0]),
            Err(ModelError::WidthMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_unfitted_predict_is_an_error() {
        let tree = DecisionTreeClassifier::new();
        assert!(matches!(tree.predict_row(&[1.0]), Err(ModelError::NotFitted)));
    }

    #[test]
    fn test_length_mismatch_on_fit() {
        let x = array![[0.0], [1.0]];
        let y = vec![0];

        let mut tree = DecisionTreeClassifier::new();
        assert!(matches!(
            tree.fit(&x, &y),
            Err(ModelError::LengthMismatch { x_rows: 2, y_len: 1 })
        ));
    }
}
