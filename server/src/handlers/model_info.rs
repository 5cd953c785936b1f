//! Loaded-model status handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Summary of the artifact set the server is currently serving.
#[derive(Serialize)]
pub struct ModelInfoResponse {
    pub feature_width: usize,
    pub labels: Vec<String>,
    /// Columns the model was fit on that no reading supplies; filled per
    /// the persisted policy on every request.
    pub train_only_columns: Vec<String>,
    pub trained_at: i64,
}

pub async fn get(State(state): State<AppState>) -> Json<ModelInfoResponse> {
    let predictor = &state.predictor;
    Json(ModelInfoResponse {
        feature_width: predictor.schema().width(),
        labels: predictor.labels().to_vec(),
        train_only_columns: predictor
            .schema()
            .train_only_columns()
            .iter()
            .map(|c| c.to_string())
            .collect(),
        trained_at: predictor.trained_at(),
    })
}
