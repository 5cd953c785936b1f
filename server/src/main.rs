//! SoilSense Prediction Server
//!
//! Serves the classifier fitted by the offline trainer. The three artifact
//! files are loaded once at startup into an immutable predictor; every
//! request replays the same build -> scale -> classify -> decode pipeline
//! against that shared read-only state, so requests need no coordination.
//!
//! ```text
//! trainer ──> soil_health_model.bin ──┐
//!             scaler.bin             ──┼──> Predictor ──> POST /predict
//!             label_encoder.bin      ──┘
//! ```

mod config;
mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use soilsense_core::Predictor;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soilsense_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("SoilSense prediction server starting...");
    tracing::info!("Artifact directory: {}", config.artifact_dir.display());

    // Artifacts are a hard startup prerequisite: no listener without them.
    let predictor = match Predictor::load(&config.artifact_dir) {
        Ok(predictor) => predictor,
        Err(e) => {
            tracing::error!("Failed to load artifact set: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Model loaded: {} feature columns, labels {:?}",
        predictor.schema().width(),
        predictor.labels()
    );

    // Build application state
    let state = AppState {
        predictor: Arc::new(predictor),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/model", get(handlers::model_info::get))
        .route("/predict", post(handlers::predict::predict))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
