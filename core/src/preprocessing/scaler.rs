//! Min-max feature scaling
//!
//! Per-column affine map to [0, 1] using the minima and maxima observed at
//! fit time. Serving never re-fits and never clips: a value outside the
//! training range legitimately maps outside [0, 1].

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScaleError {
    #[error("scaler is not fitted")]
    NotFitted,
    #[error("feature width mismatch: scaler was fit on {expected} columns, input has {actual}")]
    WidthMismatch { expected: usize, actual: usize },
    #[error("cannot fit scaler on an empty matrix")]
    EmptyFit,
}

/// Fitted per-column min/max normalization.
///
/// The fitted state is two plain vectors so the artifact round-trips
/// through bincode without depending on array-library serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: Option<Vec<f32>>,
    data_max: Option<Vec<f32>>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.data_min.is_some()
    }

    /// Number of columns the scaler was fit on.
    pub fn width(&self) -> Option<usize> {
        self.data_min.as_ref().map(Vec::len)
    }

    /// Per-column minima observed at fit time.
    pub fn data_min(&self) -> Option<&[f32]> {
        self.data_min.as_deref()
    }

    /// Per-column maxima observed at fit time.
    pub fn data_max(&self) -> Option<&[f32]> {
        self.data_max.as_deref()
    }

    /// Record the min and max of every column.
    pub fn fit(&mut self, x: &Array2<f32>) -> Result<(), ScaleError> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(ScaleError::EmptyFit);
        }

        let mut data_min = vec![f32::INFINITY; x.ncols()];
        let mut data_max = vec![f32::NEG_INFINITY; x.ncols()];

        for row in x.rows() {
            for (j, &val) in row.iter().enumerate() {
                if val < data_min[j] {
                    data_min[j] = val;
                }
                if val > data_max[j] {
                    data_max[j] = val;
                }
            }
        }

        self.data_min = Some(data_min);
        self.data_max = Some(data_max);
        Ok(())
    }

    /// Scale a matrix column-wise with the fitted parameters.
    pub fn transform(&self, x: &Array2<f32>) -> Result<Array2<f32>, ScaleError> {
        let (data_min, data_max) = self.fitted()?;
        if x.ncols() != data_min.len() {
            return Err(ScaleError::WidthMismatch {
                expected: data_min.len(),
                actual: x.ncols(),
            });
        }

        let mut scaled = x.clone();
        for mut row in scaled.rows_mut() {
            for (j, val) in row.iter_mut().enumerate() {
                *val = scale_one(*val, data_min[j], data_max[j]);
            }
        }
        Ok(scaled)
    }

    /// Scale a single serve-time vector.
    pub fn transform_row(&self, values: &[f32]) -> Result<Vec<f32>, ScaleError> {
        let (data_min, data_max) = self.fitted()?;
        if values.len() != data_min.len() {
            return Err(ScaleError::WidthMismatch {
                expected: data_min.len(),
                actual: values.len(),
            });
        }

        Ok(values
            .iter()
            .enumerate()
            .map(|(j, &val)| scale_one(val, data_min[j], data_max[j]))
            .collect())
    }

    pub fn fit_transform(&mut self, x: &Array2<f32>) -> Result<Array2<f32>, ScaleError> {
        self.fit(x)?;
        self.transform(x)
    }

    fn fitted(&self) -> Result<(&[f32], &[f32]), ScaleError> {
        match (&self.data_min, &self.data_max) {
            (Some(min), Some(max)) => Ok((min, max)),
            _ => Err(ScaleError::NotFitted),
        }
    }
}

/// A degenerate column (max == min) maps to 0.0 rather than dividing by
/// the zero range.
fn scale_one(val: f32, min: f32, max: f32) -> f32 {
    let range = max - min;
    if range.abs() > 1e-10 {
        (val - min) / range
    } else {
        0.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn fitted() -> MinMaxScaler {
        let mut scaler = MinMaxScaler::new();
        let x = array![[0.0, 10.0, 5.0], [5.0, 20.0, 5.0], [10.0, 30.0, 5.0]];
        scaler.fit(&x).unwrap();
        scaler
    }

    #[test]
    fn test_minimum_scales_to_zero_and_maximum_to_one() {
        let scaler = fitted();
        let lo = scaler.transform_row(&[0.0, 10.0, 5.0]).unwrap();
        let hi = scaler.transform_row(&[10.0, 30.0, 5.0]).unwrap();
        assert!(lo.iter().all(|&v| v.abs() < 1e-6));
        // Degenerate third column stays at 0.0 even at its "maximum".
        assert!((hi[0] - 1.0).abs() < 1e-6);
        assert!((hi[1] - 1.0).abs() < 1e-6);
        assert_eq!(hi[2], 0.0);
    }

    #[test]
    fn test_midpoint_scales_to_half() {
        let scaler = fitted();
        let mid = scaler.transform_row(&[5.0, 20.0, 5.0]).unwrap();
        assert!((mid[0] - 0.5).abs() < 1e-6);
        assert!((mid[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_is_not_clipped() {
        let scaler = fitted();
        let out = scaler.transform_row(&[20.0, 0.0, 5.0]).unwrap();
        assert!(out[0] > 1.0);
        assert!(out[1] < 0.0);
    }

    #[test]
    fn test_width_mismatch_is_an_error() {
        let scaler = fitted();
        let err = scaler.transform_row(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            ScaleError::WidthMismatch { expected: 3, actual: 2 }
        ));
    }

    #[test]
    fn test_unfitted_transform_is_an_error() {
        let scaler = MinMaxScaler::new();
        assert!(matches!(
            scaler.transform_row(&[1.0]),
            Err(ScaleError::NotFitted)
        ));
    }

    #[test]
    fn test_empty_fit_is_an_error() {
        let mut scaler = MinMaxScaler::new();
        let empty = Array2::<f32>::zeros((0, 3));
        assert!(matches!(scaler.fit(&empty), Err(ScaleError::EmptyFit)));
    }

    #[test]
    fn test_fit_transform_matrix() {
        let mut scaler = MinMaxScaler::new();
        let x = array![[1.0, 100.0], [3.0, 200.0]];
        let scaled = scaler.fit_transform(&x).unwrap();
        assert_eq!(scaled[[0, 0]], 0.0);
        assert_eq!(scaled[[1, 0]], 1.0);
        assert_eq!(scaled[[0, 1]], 0.0);
        assert_eq!(scaled[[1, 1]], 1.0);
    }
}
