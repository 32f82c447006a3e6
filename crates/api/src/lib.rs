//! Image Classification API Server
//!
//! Accepts image uploads over HTTP, runs them through the loaded classifier and
//! returns the top-5 labels with their probabilities.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use inference_engine::InferenceEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use ranking::LabelSet;
use tensor_codec::{DecodeLimits, NormalizationProfile, TensorCodec};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

mod classifier;
mod error;
mod routes;
mod settings;
mod telemetry;

pub use classifier::{Classifier, RequestStage};
pub use error::{ApiError, FailureResponse, StartupError};
pub use routes::health::HealthResponse;
pub use routes::predict::{PredictionResponse, FILE_FIELD};
pub use settings::{default_labels, mock_logits, BackendKind, ServerConfig, DEFAULT_LABELS};
pub use telemetry::{init_logging, install_recorder};

/// Application state shared across handlers. Read-only after startup.
pub struct AppState {
    /// Classification pipeline around the loaded model
    pub classifier: Arc<Classifier>,
    /// Deadline for one classification
    pub request_timeout: Duration,
    /// Maximum request body size
    pub max_upload_bytes: usize,
    /// Prometheus handle, when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create application state around a ready classifier
    pub fn new(
        classifier: Classifier,
        config: &ServerConfig,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            classifier: Arc::new(classifier),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            max_upload_bytes: config.max_upload_bytes,
            metrics,
        }
    }
}

/// Load labels and model, warm the model up and assemble the application state
pub fn build_state(
    config: &ServerConfig,
    metrics: Option<PrometheusHandle>,
) -> Result<AppState, StartupError> {
    config.validate()?;

    let labels = match &config.labels_path {
        Some(path) => LabelSet::from_path(path)?,
        None => default_labels(),
    };

    let profile = NormalizationProfile::default();
    let engine = match config.backend {
        BackendKind::Onnx => InferenceEngine::load(&config.model_path, profile, labels.len())?,
        BackendKind::Mock => {
            warn!("Using mock backend, predictions are fixed");
            InferenceEngine::mock(mock_logits(labels.len()), profile)?
        }
    };

    let codec = TensorCodec::new(profile).with_limits(DecodeLimits {
        max_dimension: config.max_image_dimension,
    });
    let classifier = Classifier::new(codec, engine, labels)?;

    info!(
        "Classifier ready: backend '{}', {} labels",
        classifier.engine().backend_name(),
        classifier.labels().len()
    );
    Ok(AppState::new(classifier, config, metrics))
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/predict", post(routes::predict::predict))
        .route("/health", get(routes::health::health));

    if state.metrics.is_some() {
        router = router.route("/metrics", get(routes::health::metrics));
    }

    router
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the server. The model is loaded and warmed up before the listener is bound.
pub async fn run_server(config: ServerConfig) -> Result<(), StartupError> {
    let metrics = if config.metrics {
        Some(install_recorder()?)
    } else {
        None
    };

    let state = build_state(&config, metrics)?;
    let app = create_router(Arc::new(state));

    let addr = config.bind_addr();
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
