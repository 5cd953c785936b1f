//! Label encoding
//!
//! Bijection between health-status strings and integer codes, fit once
//! offline. Codes follow sorted label order; the table is persisted
//! verbatim and is never re-derived or extended online. A label or code
//! outside the table is always an error, never a silent default.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("label '{0}' was not present in the training set")]
    UnknownLabel(String),
    #[error("label code {code} is outside the encoder table ({n_classes} classes)")]
    CodeOutOfRange { code: usize, n_classes: usize },
    #[error("cannot fit encoder on an empty target column")]
    EmptyFit,
}

/// Fitted label table. Index in `classes` is the code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit over a target column: distinct labels in sorted order.
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Result<Self, LabelError> {
        if labels.is_empty() {
            return Err(LabelError::EmptyFit);
        }

        let classes: Vec<String> = labels
            .iter()
            .map(|l| l.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(Self { classes })
    }

    pub fn encode(&self, label: &str) -> Result<usize, LabelError> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| LabelError::UnknownLabel(label.to_string()))
    }

    pub fn decode(&self, code: usize) -> Result<&str, LabelError> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(LabelError::CodeOutOfRange {
                code,
                n_classes: self.classes.len(),
            })
    }

    /// The fitted label table, in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
