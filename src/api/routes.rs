use axum::{
    error_handling::HandleErrorLayer,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    BoxError, Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::engine::ThresholdInfo;
use crate::orchestrator::Orchestrator;

use super::request::{parse_threshold_update, BatchRequest};
use super::response::{
    BatchResponse, ErrorResponse, HealthResponse, SampleResponse, ThresholdUpdateResponse,
};

/// Upper bound on any single request, batches included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state.
pub struct AppState {
    /// Prediction pipeline (owns the threshold store and metrics)
    pub orchestrator: Orchestrator,

    /// Application start time
    pub start_time: Instant,

    /// Application version
    pub version: String,

    /// Maximum transactions per batch request
    pub max_batch_size: usize,

    /// Latency budget in milliseconds
    pub latency_budget_ms: u64,
}

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/detect-fraud", post(handle_detect_fraud))
        .route("/api/batch-detect", post(handle_batch_detect))
        .route("/api/model-info", get(handle_model_info))
        .route("/api/update-thresholds", post(handle_update_thresholds))
        .route("/api/thresholds", get(handle_thresholds))
        .route("/api/sample-transaction", get(handle_sample_transaction))
        .route("/metrics", get(handle_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new())
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(REQUEST_TIMEOUT),
        )
        .with_state(state)
}

/// Handle single fraud detection requests.
async fn handle_detect_fraud(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Response {
    let start = Instant::now();
    let orchestrator = state.orchestrator.clone();

    // Scoring is CPU-bound; keep it off the async workers
    let response =
        match tokio::task::spawn_blocking(move || orchestrator.predict_fraud(&payload)).await {
            Ok(Ok(prediction)) => (StatusCode::OK, Json(prediction)).into_response(),
            Ok(Err(e)) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::validation(e.to_string())),
            )
                .into_response(),
            Err(e) => {
                error!(error = %e, "Detection worker failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::error("Internal server error")),
                )
                    .into_response()
            }
        };

    // Check latency budget
    let elapsed = start.elapsed();
    if elapsed.as_millis() > state.latency_budget_ms as u128 {
        warn!(
            latency_ms = elapsed.as_millis(),
            budget_ms = state.latency_budget_ms,
            "Detection latency exceeded budget"
        );
    }

    response
}

/// Handle batch detection requests.
async fn handle_batch_detect(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Response {
    let batch = match BatchRequest::from_value(body, state.max_batch_size) {
        Ok(batch) => batch,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(e)).into_response(),
    };

    let start = Instant::now();
    let total = batch.len();
    let orchestrator = state.orchestrator.clone();

    let results =
        match tokio::task::spawn_blocking(move || orchestrator.batch_predict(batch.transactions))
            .await
        {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "Batch worker failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::error("Internal server error")),
                )
                    .into_response();
            }
        };

    let completed = results.iter().filter(|r| r.is_completed()).count();
    info!(
        total,
        completed,
        failed = total - completed,
        latency_ms = start.elapsed().as_millis(),
        "Batch detection completed"
    );

    (StatusCode::OK, Json(BatchResponse::new(results))).into_response()
}

/// Collaborator and threshold details.
async fn handle_model_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.orchestrator.model_info())
}

/// Apply a partial threshold update.
async fn handle_update_thresholds(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Response {
    let update = match parse_threshold_update(body) {
        Ok(update) => update,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(e)).into_response(),
    };

    match state.orchestrator.update_thresholds(&update) {
        Ok(snapshot) => (
            StatusCode::OK,
            Json(ThresholdUpdateResponse::new(ThresholdInfo::from(
                snapshot.as_ref(),
            ))),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::error(format!("Invalid threshold values: {}", e))),
        )
            .into_response(),
    }
}

/// Current threshold snapshot.
async fn handle_thresholds(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.orchestrator.engine().get_threshold_info())
}

async fn handle_sample_transaction(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(SampleResponse::new(state.orchestrator.sample_transaction()))
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.orchestrator.engine().store().snapshot();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        policy_version: snapshot.policy_version.clone(),
        threshold_revision: snapshot.revision,
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Metrics endpoint (Prometheus format).
async fn handle_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let metrics = format!(
        r#"# HELP fraudr_uptime_seconds Application uptime in seconds
# TYPE fraudr_uptime_seconds counter
fraudr_uptime_seconds {}

{}"#,
        state.start_time.elapsed().as_secs(),
        state.orchestrator.metrics().to_prometheus(),
    );

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        metrics,
    )
}

async fn handle_middleware_error(err: BoxError) -> (StatusCode, Json<ErrorResponse>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("Request timed out");
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(ErrorResponse::error("Request timed out")),
        )
    } else {
        error!(error = %err, "Unhandled middleware error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::error("Internal server error")),
        )
    }
}
