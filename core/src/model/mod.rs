//! Classification model

pub mod forest;
pub mod tree;

// Re-export common types
pub use forest::RandomForestClassifier;
pub use tree::{DecisionTreeClassifier, ModelError};
