//! SoilSense Core - Training and Inference Pipeline
//!
//! Two halves that never run at the same time:
//!
//! - [`trainer`] fits the label encoder, the min-max scaler and the random
//!   forest from a historical CSV and persists them as a matched artifact
//!   set.
//! - [`pipeline::Predictor`] loads that set once and classifies individual
//!   sensor readings, replaying the exact preprocessing the artifacts were
//!   fit with.
//!
//! The artifact files are the only interface between the two. The column
//! layout both sides must agree on lives in [`schema::FeatureSchema`],
//! which is persisted alongside the scaler and hash-checked against the
//! model at load time.

pub mod artifacts;
pub mod model;
pub mod pipeline;
pub mod preprocessing;
pub mod reading;
pub mod schema;
pub mod trainer;

// Re-export common types
pub use artifacts::{ArtifactError, ArtifactSet};
pub use pipeline::{PredictError, Predictor};
pub use reading::SensorReading;
pub use schema::{ColumnSource, ColumnSpec, FeatureSchema, FillPolicy};
