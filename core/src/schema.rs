//! Feature Schema - the train-time/serve-time column contract
//!
//! The scaler and model are fit on a feature matrix whose column names,
//! order and serve-time sourcing are captured here and persisted with the
//! scaler artifact. At serve time the same schema rebuilds the vector, so
//! the width and order the model saw at fit time cannot drift silently.
//!
//! Columns that exist only in the training dataset carry an explicit fill
//! policy instead of a hard-coded filler constant. Their meaning is never
//! guessed: the trainer records them under their dataset header names.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reading::{SensorReading, READING_FIELDS};

/// Current schema encoding version.
/// MUST be incremented when the layout rules change.
pub const SCHEMA_VERSION: u8 = 1;

// ============================================================================
// COLUMN SOURCING
// ============================================================================

/// How a train-only column is valued at serve time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FillPolicy {
    /// Fixed constant recorded at training time.
    Constant(f32),
    /// Column mean observed in the training set, resolved at fit time.
    Mean(f32),
    /// The column cannot be reconstructed online; predicting rejects.
    Reject,
}

/// Where a column's serve-time value comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnSource {
    /// Supplied by the like-named [`SensorReading`] field.
    Reading,
    /// Train-only column, filled per policy.
    Fill(FillPolicy),
}

/// One column of the fitted feature matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub source: ColumnSource,
}

impl ColumnSpec {
    /// Column backed by a reading field of the same name.
    pub fn reading(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: ColumnSource::Reading,
        }
    }

    /// Train-only column with an explicit fill policy.
    pub fn fill(name: &str, policy: FillPolicy) -> Self {
        Self {
            name: name.to_string(),
            source: ColumnSource::Fill(policy),
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema column '{0}' is marked as a reading field but no such field exists")]
    UnknownReadingField(String),
    #[error("column '{0}' is unsupported at serve time (fill policy: reject)")]
    RejectedColumn(String),
    #[error("schema has no columns")]
    Empty,
}

/// Ordered column layout the scaler and model were fit on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: u8,
    pub columns: Vec<ColumnSpec>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            columns,
        }
    }

    /// Number of feature columns the fitted artifacts expect.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// CRC32 over version, column names and source tags.
    ///
    /// Fill values are excluded: the hash pins the layout, while the
    /// concrete fill constants travel with the scaler artifact they were
    /// fit with.
    pub fn layout_hash(&self) -> u32 {
        let mut hasher = Hasher::new();
        hasher.update(&[self.version]);
        for col in &self.columns {
            hasher.update(col.name.as_bytes());
            let tag: u8 = match col.source {
                ColumnSource::Reading => 1,
                ColumnSource::Fill(FillPolicy::Constant(_)) => 2,
                ColumnSource::Fill(FillPolicy::Mean(_)) => 3,
                ColumnSource::Fill(FillPolicy::Reject) => 4,
            };
            hasher.update(&[0, tag]);
        }
        hasher.finalize()
    }

    /// Check internal consistency: every `Reading` column must name one of
    /// the serve-time fields.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.columns.is_empty() {
            return Err(SchemaError::Empty);
        }
        for col in &self.columns {
            if matches!(col.source, ColumnSource::Reading)
                && !READING_FIELDS.contains(&col.name.as_str())
            {
                return Err(SchemaError::UnknownReadingField(col.name.clone()));
            }
        }
        Ok(())
    }

    /// Build the serve-time feature vector in fit order.
    ///
    /// Fails fast instead of padding or truncating: an unknown reading
    /// column or a reject-policy column aborts the whole vector.
    pub fn build_vector(&self, reading: &SensorReading) -> Result<Vec<f32>, SchemaError> {
        let mut values = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            let value = match &col.source {
                ColumnSource::Reading => reading
                    .value_of(&col.name)
                    .ok_or_else(|| SchemaError::UnknownReadingField(col.name.clone()))?,
                ColumnSource::Fill(FillPolicy::Constant(v)) => *v,
                ColumnSource::Fill(FillPolicy::Mean(m)) => *m,
                ColumnSource::Fill(FillPolicy::Reject) => {
                    return Err(SchemaError::RejectedColumn(col.name.clone()));
                }
            };
            values.push(value);
        }
        Ok(values)
    }

    /// Names of train-only columns, for logs and the model-info surface.
    pub fn train_only_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| matches!(c.source, ColumnSource::Fill(_)))
            .map(|c| c.name.as_str())
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
