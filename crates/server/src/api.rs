//! HTTP API: form page, JSON prediction endpoint, health checks and
//! Prometheus metrics

use crate::form::{render_page, Outcome, PageInfo, SERVICE_ERROR_TEXT};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use predictor_lib::{
    features::coerce_inputs,
    health::{HealthRegistry, HealthResponse},
    observability::{ServiceMetrics, StructuredLogger},
    InferenceError, InferenceHandler, PredictionResult, DECISION_THRESHOLD, FEATURE_NAMES,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub handler: InferenceHandler,
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
    pub page: PageInfo,
}

impl AppState {
    pub fn new(
        handler: InferenceHandler,
        health_registry: HealthRegistry,
        metrics: ServiceMetrics,
        logger: StructuredLogger,
        page: PageInfo,
    ) -> Self {
        Self {
            handler,
            health_registry,
            metrics,
            logger,
            page,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub title: String,
    pub description: String,
    pub features: Vec<&'static str>,
    pub threshold: f64,
    pub classifier_backend: String,
    pub attributor_backend: String,
}

/// Errors returned by the prediction endpoints
#[derive(Debug)]
pub enum ApiError {
    Inference(InferenceError),
    /// Request body is not JSON at all
    InvalidBody(JsonRejection),
    Internal(String),
}

impl ApiError {
    /// Text safe to show to the requester
    fn public_message(&self) -> String {
        match self {
            ApiError::Inference(err) if err.is_input_error() => err.to_string(),
            ApiError::InvalidBody(rejection) => rejection.body_text(),
            _ => "prediction failed".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ApiError::Inference(err) if err.is_input_error() => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.kind())
            }
            ApiError::Inference(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.kind()),
            ApiError::InvalidBody(rejection) => (rejection.status(), "invalid_body"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        let body = ErrorResponse {
            error: error.to_string(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Run one inference off the async runtime and record its outcome
async fn run_inference(state: &AppState, inputs: Vec<Value>) -> Result<PredictionResult, ApiError> {
    let handler = state.handler.clone();
    let start = Instant::now();

    let (finite_inputs, outcome) = tokio::task::spawn_blocking(move || {
        match coerce_inputs(&inputs) {
            Ok(features) => (features.is_finite(), handler.handle_features(&features)),
            Err(err) => (true, Err(err)),
        }
    })
    .await
    .map_err(|e| ApiError::Internal(format!("inference task failed: {}", e)))?;

    match outcome {
        Ok(result) => {
            let elapsed = start.elapsed();
            state.metrics.observe_inference_latency(elapsed.as_secs_f64());
            state.metrics.inc_predictions(result.label.as_str());
            state.logger.log_prediction(
                result.label.as_str(),
                result.probability,
                elapsed.as_secs_f64() * 1000.0,
            );
            state.health_registry.record_success().await;
            Ok(result)
        }
        Err(err) => {
            if let Some(service) = err.service() {
                let details = err.to_string();
                state.metrics.inc_service_errors(service.as_str());
                state.logger.log_service_failure(service.as_str(), &details);
                if finite_inputs {
                    state
                        .health_registry
                        .record_service_failure(service, details)
                        .await;
                } else {
                    debug!(service = %service, "Non-finite input, component health unchanged");
                }
            } else {
                state.metrics.inc_rejected(err.kind());
                state.logger.log_rejected(err.kind(), &err.to_string());
            }
            Err(ApiError::Inference(err))
        }
    }
}

/// Positional inputs from a `{"inputs": [...]}` body
///
/// A missing key yields no inputs and a scalar yields one, so a malformed
/// body surfaces as a shape error rather than a deserialization failure.
pub fn request_inputs(body: Value) -> Vec<Value> {
    match body {
        Value::Object(mut fields) => match fields.remove("inputs") {
            Some(Value::Array(inputs)) => inputs,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![other],
        },
        _ => Vec::new(),
    }
}

/// JSON prediction endpoint
async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        state.metrics.inc_rejected("invalid_body");
        state.logger.log_rejected("invalid_body", &rejection.body_text());
        ApiError::InvalidBody(rejection)
    })?;
    run_inference(&state, request_inputs(body)).await.map(Json)
}

/// Empty form page
async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_page(&state.page, &HashMap::new(), None))
}

/// Form submission; re-renders the page with the outputs
async fn submit_form(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    // Missing fields shrink the input list and surface as a shape error
    let inputs: Vec<Value> = FEATURE_NAMES
        .iter()
        .filter_map(|name| fields.get(*name).map(|v| Value::String(v.clone())))
        .collect();

    match run_inference(&state, inputs).await {
        Ok(result) => (
            StatusCode::OK,
            Html(render_page(&state.page, &fields, Some(Outcome::Prediction(&result)))),
        ),
        Err(err) => {
            let (status, message) = match &err {
                ApiError::Inference(e) if e.is_input_error() => {
                    (StatusCode::UNPROCESSABLE_ENTITY, err.public_message())
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, SERVICE_ERROR_TEXT.to_string()),
            };
            (
                status,
                Html(render_page(&state.page, &fields, Some(Outcome::Error(message)))),
            )
        }
    }
}

/// Form schema for API clients
async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        title: state.page.title.clone(),
        description: state.page.description.clone(),
        features: FEATURE_NAMES.to_vec(),
        threshold: DECISION_THRESHOLD,
        classifier_backend: state.handler.classifier_backend().to_string(),
        attributor_backend: state.handler.attributor_backend().to_string(),
    })
}

/// Health check response; degraded models still serve, so always 200
async fn healthz(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(state.health_registry.health().await)
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit_form))
        .route("/api/predict", post(predict))
        .route("/api/info", get(info))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn serve(
    addr: &str,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
