//! Artifact persistence
//!
//! The trainer produces three independently loadable bincode files; the
//! predictor loads them once at startup as a matched set. The model
//! artifact records the schema layout hash and class count it was fit
//! against, so a mixed set fails loudly at load time instead of silently
//! predicting garbage.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::RandomForestClassifier;
use crate::preprocessing::{LabelEncoder, MinMaxScaler};
use crate::schema::{FeatureSchema, SchemaError};

/// Fixed artifact filenames, colocated with the serving process.
pub const MODEL_FILE: &str = "soil_health_model.bin";
pub const SCALER_FILE: &str = "scaler.bin";
pub const ENCODER_FILE: &str = "label_encoder.bin";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("artifact {path} is corrupt: {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },
    #[error(
        "artifact set mismatch: model was fit on schema {model_hash:08x} \
         but the scaler carries schema {schema_hash:08x}"
    )]
    SchemaMismatch { model_hash: u32, schema_hash: u32 },
    #[error(
        "artifact set mismatch: scaler was fit on {scaler_width} columns \
         but its schema describes {schema_width}"
    )]
    WidthMismatch {
        schema_width: usize,
        scaler_width: usize,
    },
    #[error(
        "artifact set mismatch: model was fit on {model_width} columns \
         but the schema describes {schema_width}"
    )]
    ModelWidthMismatch {
        schema_width: usize,
        model_width: usize,
    },
    #[error(
        "artifact set mismatch: model distinguishes {n_classes} classes \
         but the label encoder only knows {encoder_classes}"
    )]
    ClassCountMismatch {
        n_classes: usize,
        encoder_classes: usize,
    },
    #[error("invalid schema in scaler artifact: {0}")]
    Schema(#[from] SchemaError),
}

// ============================================================================
// ARTIFACT PAYLOADS
// ============================================================================

/// `soil_health_model.bin` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub forest: RandomForestClassifier,
    /// Layout hash of the schema the forest was fit on.
    pub schema_hash: u32,
    /// Number of classes in the encoded target at fit time.
    pub n_classes: usize,
    /// Unix timestamp of the fit.
    pub trained_at: i64,
}

/// `scaler.bin` payload: fitted parameters plus the column layout they
/// were fit on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub scaler: MinMaxScaler,
    pub schema: FeatureSchema,
}

// ============================================================================
// MATCHED SET
// ============================================================================

/// The three fitted artifacts, produced together by one training run.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub model: ModelArtifact,
    pub scaler: ScalerArtifact,
    pub encoder: LabelEncoder,
}

impl ArtifactSet {
    /// Write all three files to `dir`.
    ///
    /// Every payload is serialized before the first byte is written, so a
    /// serialization failure leaves no partial set behind.
    pub fn save(&self, dir: &Path) -> Result<(), ArtifactError> {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|source| ArtifactError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let files = [
            (dir.join(MODEL_FILE), encode(dir.join(MODEL_FILE), &self.model)?),
            (dir.join(SCALER_FILE), encode(dir.join(SCALER_FILE), &self.scaler)?),
            (
                dir.join(ENCODER_FILE),
                encode(dir.join(ENCODER_FILE), &self.encoder)?,
            ),
        ];

        for (path, bytes) in files {
            fs::write(&path, bytes).map_err(|source| ArtifactError::Io { path, source })?;
        }
        Ok(())
    }

    /// Load and cross-validate the set from `dir`.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let set = Self {
            model: read_artifact(dir.join(MODEL_FILE))?,
            scaler: read_artifact(dir.join(SCALER_FILE))?,
            encoder: read_artifact(dir.join(ENCODER_FILE))?,
        };
        set.validate()?;
        Ok(set)
    }

    /// Confirm the three artifacts came from one fit.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        self.scaler.schema.validate()?;

        let schema_hash = self.scaler.schema.layout_hash();
        if self.model.schema_hash != schema_hash {
            return Err(ArtifactError::SchemaMismatch {
                model_hash: self.model.schema_hash,
                schema_hash,
            });
        }

        let schema_width = self.scaler.schema.width();
        if self.scaler.scaler.width() != Some(schema_width) {
            return Err(ArtifactError::WidthMismatch {
                schema_width,
                scaler_width: self.scaler.scaler.width().unwrap_or(0),
            });
        }

        if self.model.forest.n_features() != Some(schema_width) {
            return Err(ArtifactError::ModelWidthMismatch {
                schema_width,
                model_width: self.model.forest.n_features().unwrap_or(0),
            });
        }

        if self.model.n_classes > self.encoder.len() {
            return Err(ArtifactError::ClassCountMismatch {
                n_classes: self.model.n_classes,
                encoder_classes: self.encoder.len(),
            });
        }

        Ok(())
    }
}

fn encode<T: Serialize>(path: PathBuf, value: &T) -> Result<Vec<u8>, ArtifactError> {
    bincode::serialize(value).map_err(|source| ArtifactError::Codec { path, source })
}

fn read_artifact<T: DeserializeOwned>(path: PathBuf) -> Result<T, ArtifactError> {
    let bytes = fs::read(&path).map_err(|source| ArtifactError::Io {
        path: path.clone(),
        source,
    })?;
    bincode::deserialize(&bytes).map_err(|source| ArtifactError::Codec { path, source })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSpec, FillPolicy};
    use ndarray::array;
    use tempfile::tempdir;

    fn fitted_set() -> ArtifactSet {
        let schema = FeatureSchema::new(vec![
            ColumnSpec::reading("moisture"),
            ColumnSpec::reading("ph"),
            ColumnSpec::fill("signal", FillPolicy::Constant(0.0)),
        ]);

        let x = array![[1.0, 5.0, 0.0], [3.0, 7.0, 0.0], [9.0, 6.0, 0.0]];
        let y = vec![0, 1, 1];

        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        let mut forest = RandomForestClassifier::new(3).with_random_state(42);
        forest.fit(&scaled, &y).unwrap();

        let encoder = LabelEncoder::fit(&["Healthy", "Stressed"]).unwrap();

        ArtifactSet {
            model: ModelArtifact {
                forest,
                schema_hash: schema.layout_hash(),
                n_classes: encoder.len(),
                trained_at: 1_700_000_000,
            },
            scaler: ScalerArtifact { scaler, schema },
            encoder,
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let set = fitted_set();
        set.save(dir.path()).unwrap();

        for file in [MODEL_FILE, SCALER_FILE, ENCODER_FILE] {
            assert!(dir.path().join(file).exists());
        }

        let loaded = ArtifactSet::load(dir.path()).unwrap();
        assert_eq!(loaded.scaler.schema, set.scaler.schema);
        assert_eq!(loaded.encoder, set.encoder);
        assert_eq!(loaded.model.trained_at, set.model.trained_at);
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let dir = tempdir().unwrap();
        let set = fitted_set();
        set.save(dir.path()).unwrap();
        fs::remove_file(dir.path().join(ENCODER_FILE)).unwrap();

        assert!(matches!(
            ArtifactSet::load(dir.path()),
            Err(ArtifactError::Io { .. })
        ));
    }

    #[test]
    fn test_corrupt_file_is_a_load_error() {
        let dir = tempdir().unwrap();
        let set = fitted_set();
        set.save(dir.path()).unwrap();
        fs::write(dir.path().join(MODEL_FILE), b"not a model").unwrap();

        assert!(matches!(
            ArtifactSet::load(dir.path()),
            Err(ArtifactError::Codec { .. })
        ));
    }

    #[test]
    fn test_mixed_set_fails_validation() {
        let mut set = fitted_set();
        // Pretend the model came from a different layout.
        set.model.schema_hash ^= 0xFFFF;
        assert!(matches!(
            set.validate(),
            Err(ArtifactError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_class_count_mismatch_fails_validation() {
        let mut set = fitted_set();
        set.model.n_classes = set.encoder.len() + 1;
        assert!(matches!(
            set.validate(),
            Err(ArtifactError::ClassCountMismatch { .. })
        ));
    }

    #[test]
    fn test_schema_scaler_width_mismatch_fails_validation() {
        let mut set = fitted_set();
        set.scaler
            .schema
            .columns
            .push(ColumnSpec::fill("extra", FillPolicy::Constant(1.0)));
        set.model.schema_hash = set.scaler.schema.layout_hash();
        assert!(matches!(
            set.validate(),
            Err(ArtifactError::WidthMismatch { .. })
        ));
    }
}
