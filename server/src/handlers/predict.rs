//! Prediction handler

use axum::{extract::State, Json};
use serde::Serialize;
use soilsense_core::SensorReading;

use crate::{AppState, AppResult};

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub soil_health: String,
}

/// Classify one sensor reading.
///
/// Malformed bodies never get here: the `Json` extractor rejects them at
/// the boundary. Pipeline failures answer this request only.
pub async fn predict(
    State(state): State<AppState>,
    Json(reading): Json<SensorReading>,
) -> AppResult<Json<PredictResponse>> {
    let soil_health = state.predictor.predict(&reading)?;

    tracing::debug!("Classified reading as '{}'", soil_health);

    Ok(Json(PredictResponse { soil_health }))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use axum::response::IntoResponse;
    use ndarray::Array2;
    use std::sync::Arc;

    use soilsense_core::trainer::{self, Dataset, ExtraColumnFill, TrainConfig};
    use soilsense_core::{reading::READING_FIELDS, Predictor};

    fn reading(moisture: f32) -> SensorReading {
        SensorReading {
            moisture,
            temperature: 20.0,
            humidity: 50.0,
            light: 400.0,
            ph: 6.5,
            nitrogen: 10.0,
            phosphorus: 8.0,
            potassium: 12.0,
            conductivity: 1.0,
            hour: 9,
            day: 20,
            month: 4,
        }
    }

    /// Train a tiny in-memory artifact set: low moisture is "Stressed".
    fn state(extra_fill: ExtraColumnFill) -> AppState {
        let mut columns: Vec<String> =
            READING_FIELDS.iter().map(|f| f.to_string()).collect();
        columns.push("sap_flow".to_string());
        let width = columns.len();

        let mut values = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let stressed = i % 2 == 0;
            let moisture = if stressed { 5.0 + i as f32 * 0.1 } else { 60.0 + i as f32 };
            values.extend([
                moisture, 20.0, 50.0, 400.0, 6.5, 10.0, 8.0, 12.0, 1.0, 9.0, 20.0, 4.0, 0.7,
            ]);
            labels.push(if stressed { "Stressed".to_string() } else { "Healthy".to_string() });
        }

        let dataset = Dataset {
            columns,
            features: Array2::from_shape_vec((20, width), values).unwrap(),
            labels,
        };
        let config = TrainConfig {
            n_trees: 15,
            extra_fill,
            ..TrainConfig::default()
        };
        let report = trainer::train(&dataset, &config).unwrap();
        let predictor = Predictor::from_artifacts(report.artifacts).unwrap();

        AppState {
            predictor: Arc::new(predictor),
        }
    }

    #[tokio::test]
    async fn predict_returns_the_documented_success_shape() {
        let state = state(ExtraColumnFill::Zero);
        let Json(response) = predict(State(state), Json(reading(65.0))).await.unwrap();
        assert_eq!(response.soil_health, "Healthy");
    }

    #[tokio::test]
    async fn predict_twice_is_identical() {
        let state = state(ExtraColumnFill::Zero);
        let a = predict(State(state.clone()), Json(reading(33.0))).await.unwrap();
        let b = predict(State(state), Json(reading(33.0))).await.unwrap();
        assert_eq!(a.0.soil_health, b.0.soil_health);
    }

    #[tokio::test]
    async fn rejected_column_becomes_the_documented_error_shape() {
        let state = state(ExtraColumnFill::Reject);
        let err = predict(State(state), Json(reading(30.0))).await.unwrap_err();
        assert!(matches!(err, AppError::BadReading(_)));

        let response = err.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().contains("sap_flow"));
    }
}
