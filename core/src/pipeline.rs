//! Prediction pipeline
//!
//! One immutable context, one pure operation: a reading goes through
//! BuildVector -> Scale -> Classify -> Decode and comes back as a label or
//! a per-request error. Nothing here mutates after construction, so a
//! single [`Predictor`] behind an `Arc` serves concurrent requests with no
//! locking.

use std::path::Path;

use thiserror::Error;

use crate::artifacts::{ArtifactError, ArtifactSet};
use crate::model::ModelError;
use crate::preprocessing::{LabelError, ScaleError};
use crate::reading::SensorReading;
use crate::schema::{FeatureSchema, SchemaError};

/// Per-request pipeline failure. Messages are surfaced to the caller
/// verbatim; none of them is fatal to the process.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Scale(#[from] ScaleError),
    #[error(transparent)]
    Classify(#[from] ModelError),
    #[error(transparent)]
    Decode(#[from] LabelError),
}

/// Loaded artifact set plus the prediction contract over it.
#[derive(Debug, Clone)]
pub struct Predictor {
    artifacts: ArtifactSet,
}

impl Predictor {
    /// Wrap an already-validated artifact set.
    pub fn from_artifacts(artifacts: ArtifactSet) -> Result<Self, ArtifactError> {
        artifacts.validate()?;
        Ok(Self { artifacts })
    }

    /// Load and validate the matched set from `dir`. Failure here is a
    /// startup-fatal condition for callers.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        Ok(Self {
            artifacts: ArtifactSet::load(dir)?,
        })
    }

    /// Column layout the artifacts were fit on.
    pub fn schema(&self) -> &FeatureSchema {
        &self.artifacts.scaler.schema
    }

    /// Known health-status labels, in code order.
    pub fn labels(&self) -> &[String] {
        self.artifacts.encoder.classes()
    }

    /// Unix timestamp of the training run.
    pub fn trained_at(&self) -> i64 {
        self.artifacts.model.trained_at
    }

    /// Classify one reading.
    ///
    /// Pure: the same reading against the same artifacts always yields the
    /// same label.
    pub fn predict(&self, reading: &SensorReading) -> Result<String, PredictError> {
        let vector = self.artifacts.scaler.schema.build_vector(reading)?;
        let scaled = self.artifacts.scaler.scaler.transform_row(&vector)?;
        let code = self.artifacts.model.forest.predict_row(&scaled)?;
        let label = self.artifacts.encoder.decode(code)?;
        Ok(label.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{ModelArtifact, ScalerArtifact};
    use crate::model::RandomForestClassifier;
    use crate::preprocessing::{LabelEncoder, MinMaxScaler};
    use crate::reading::READING_FIELDS;
    use crate::schema::{ColumnSpec, FillPolicy};
    use ndarray::Array2;

    fn reading(moisture: f32) -> SensorReading {
        SensorReading {
            moisture,
            temperature: 20.0,
            humidity: 50.0,
            light: 500.0,
            ph: 6.5,
            nitrogen: 10.0,
            phosphorus: 10.0,
            potassium: 10.0,
            conductivity: 1.0,
            hour: 12,
            day: 15,
            month: 6,
        }
    }

    /// Fit a 15-column set (12 reading columns + 3 train-only fillers)
    /// where low moisture means "Stressed" and high moisture "Healthy".
    fn predictor(extra_policy: FillPolicy) -> Predictor {
        let mut columns: Vec<ColumnSpec> =
            READING_FIELDS.iter().map(|f| ColumnSpec::reading(f)).collect();
        columns.push(ColumnSpec::fill("chlorophyll", extra_policy));
        columns.push(ColumnSpec::fill("stem_width", FillPolicy::Constant(0.0)));
        columns.push(ColumnSpec::fill("sap_flow", FillPolicy::Constant(0.0)));
        let schema = FeatureSchema::new(columns);

        let mut rows = Vec::new();
        let mut y = Vec::new();
        for i in 0..10 {
            let moisture = if i < 5 { 5.0 + i as f32 } else { 60.0 + i as f32 };
            let mut row = reading(moisture).values().to_vec();
            row.extend([0.0, 0.0, 0.0]);
            rows.extend(row);
            y.push(if i < 5 { 1 } else { 0 });
        }
        let x = Array2::from_shape_vec((10, schema.width()), rows).unwrap();

        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        let mut forest = RandomForestClassifier::new(11).with_random_state(42);
        forest.fit(&scaled, &y).unwrap();

        let encoder = LabelEncoder::fit(&["Healthy", "Stressed"]).unwrap();

        Predictor::from_artifacts(ArtifactSet {
            model: ModelArtifact {
                forest,
                schema_hash: schema.layout_hash(),
                n_classes: encoder.len(),
                trained_at: 0,
            },
            scaler: ScalerArtifact { scaler, schema },
            encoder,
        })
        .unwrap()
    }

    #[test]
    fn test_predict_returns_a_known_label() {
        let predictor = predictor(FillPolicy::Constant(0.0));
        let label = predictor.predict(&reading(70.0)).unwrap();
        assert!(predictor.labels().contains(&label));
        assert_eq!(label, "Healthy");
        assert_eq!(predictor.predict(&reading(6.0)).unwrap(), "Stressed");
    }

    #[test]
    fn test_predict_is_idempotent() {
        let predictor = predictor(FillPolicy::Constant(0.0));
        let sample = reading(33.3);
        assert_eq!(
            predictor.predict(&sample).unwrap(),
            predictor.predict(&sample).unwrap()
        );
    }

    #[test]
    fn test_reject_policy_surfaces_a_schema_error() {
        let predictor = predictor(FillPolicy::Reject);
        let err = predictor.predict(&reading(30.0)).unwrap_err();
        assert!(matches!(err, PredictError::Schema(SchemaError::RejectedColumn(_))));
        assert!(err.to_string().contains("chlorophyll"));
    }

    #[test]
    fn test_mismatched_artifacts_do_not_construct() {
        let good = predictor(FillPolicy::Constant(0.0));
        let mut artifacts = good.artifacts.clone();
        artifacts.model.schema_hash ^= 1;
        assert!(Predictor::from_artifacts(artifacts).is_err());
    }
}
