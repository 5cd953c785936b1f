//! Preprocessing artifacts fitted offline and replayed online.

pub mod encoder;
pub mod scaler;

// Re-export common types
pub use encoder::{LabelEncoder, LabelError};
pub use scaler::{MinMaxScaler, ScaleError};
