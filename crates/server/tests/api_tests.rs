//! Integration tests for the service HTTP endpoints

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use failure_predictor::{
    api::{create_router, AppState},
    config::ServerConfig,
    form::{PageInfo, SERVICE_ERROR_TEXT},
    initialize,
};
use predictor_lib::{
    health::{components, HealthRegistry},
    predictor::LogisticClassifier,
    Attributor, Classifier, Explanation, FeatureVector, InferenceHandler, ServiceMetrics,
    StructuredLogger, FEATURE_NAMES,
};
use std::sync::Arc;
use tower::ServiceExt;

struct FixedClassifier(f64);

impl Classifier for FixedClassifier {
    fn predict_probability(&self, _features: &FeatureVector) -> Result<f64> {
        Ok(self.0)
    }

    fn backend(&self) -> &str {
        "fixed"
    }
}

struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn predict_probability(&self, _features: &FeatureVector) -> Result<f64> {
        anyhow::bail!("internal numerical error")
    }

    fn backend(&self) -> &str {
        "failing"
    }
}

/// Contribution of each feature is a tenth of its value
struct ScaledAttributor;

impl Attributor for ScaledAttributor {
    fn explain(&self, features: &FeatureVector) -> Result<Explanation> {
        Ok(Explanation {
            contributions: features.to_array().iter().map(|v| v / 10.0).collect(),
            base_value: Some(-2.0),
        })
    }

    fn backend(&self) -> &str {
        "scaled"
    }
}

async fn setup_app(classifier: Arc<dyn Classifier>) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::CLASSIFIER).await;
    health_registry.register(components::ATTRIBUTOR).await;

    let state = Arc::new(AppState::new(
        InferenceHandler::new(classifier, Arc::new(ScaledAttributor)),
        health_registry,
        ServiceMetrics::new(),
        StructuredLogger::new("test"),
        PageInfo {
            title: "Machine Failure Prediction".to_string(),
            description:
                "Enter sensor readings to predict machine failure and see SHAP explanation."
                    .to_string(),
        },
    ));
    (create_router(state.clone()), state)
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn form_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

/// Urlencoded form with one field per feature
fn form_body(values: [&str; 7]) -> String {
    FEATURE_NAMES
        .iter()
        .zip(values)
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&")
}

const SCENARIO_FIELDS: [&str; 7] = ["1500", "40", "10", "60000", "400", "15000", "600000"];

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

fn scenario() -> serde_json::Value {
    serde_json::json!({ "inputs": [1500, 40, 10, 60000, 400, 15000, 600000] })
}

#[tokio::test]
async fn test_predict_returns_label_probability_and_attributions() {
    let (app, _state) = setup_app(Arc::new(FixedClassifier(0.83))).await;

    let response = app.oneshot(json_request("/api/predict", scenario())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result = body_json(response).await;
    assert_eq!(result["label"], "Failure");
    assert_eq!(result["probability"], 0.83);
    assert_eq!(result["base_value"], -2.0);

    let attributions = result["attributions"].as_object().unwrap();
    assert_eq!(attributions.len(), 7);
    for name in FEATURE_NAMES {
        assert!(attributions.contains_key(name), "missing {}", name);
    }
    assert_eq!(attributions["rotational_speed_scaled"], 150.0);
}

#[tokio::test]
async fn test_predict_probability_at_threshold_is_no_failure() {
    let (app, _state) = setup_app(Arc::new(FixedClassifier(0.5))).await;

    let response = app.oneshot(json_request("/api/predict", scenario())).await.unwrap();
    let result = body_json(response).await;

    assert_eq!(result["label"], "No Failure");
}

#[tokio::test]
async fn test_predict_accepts_numeric_strings() {
    let (app, _state) = setup_app(Arc::new(FixedClassifier(0.1))).await;
    let body = serde_json::json!({ "inputs": SCENARIO_FIELDS });

    let response = app.oneshot(json_request("/api/predict", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_predict_wrong_count_is_shape_error() {
    let (app, _state) = setup_app(Arc::new(FixedClassifier(0.1))).await;

    let six = serde_json::json!([1, 2, 3, 4, 5, 6]);
    let eight = serde_json::json!([1, 2, 3, 4, 5, 6, 7, 8]);
    for inputs in [six, eight] {
        let body = serde_json::json!({ "inputs": inputs });
        let response = app
            .clone()
            .oneshot(json_request("/api/predict", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"], "shape_error");
    }
}

#[tokio::test]
async fn test_predict_text_input_is_type_error() {
    let (app, _state) = setup_app(Arc::new(FixedClassifier(0.1))).await;
    let body = serde_json::json!({ "inputs": [1500, "forty", 10, 60000, 400, 15000, 600000] });

    let response = app.oneshot(json_request("/api/predict", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let error = body_json(response).await;
    assert_eq!(error["error"], "type_error");
    assert!(error["message"].as_str().unwrap().contains("torque_scaled"));
}

#[tokio::test]
async fn test_service_failure_is_generic_500_and_degrades_health() {
    let (app, state) = setup_app(Arc::new(FailingClassifier)).await;

    let response = app
        .clone()
        .oneshot(json_request("/api/predict", scenario()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error = body_json(response).await;
    assert_eq!(error["error"], "service_error");
    assert_eq!(error["message"], "prediction failed");

    let health = state.health_registry.health().await;
    assert_eq!(
        health.components[components::CLASSIFIER].status,
        predictor_lib::ComponentStatus::Degraded
    );

    // Degraded still reports 200 (operational)
    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "degraded");
}

#[tokio::test]
async fn test_index_lists_all_inputs() {
    let (app, _state) = setup_app(Arc::new(FixedClassifier(0.1))).await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Machine Failure Prediction"));
    for name in FEATURE_NAMES {
        assert!(html.contains(&format!("name=\"{}\"", name)));
    }
}

#[tokio::test]
async fn test_form_submission_renders_outputs() {
    let (app, _state) = setup_app(Arc::new(FixedClassifier(0.2))).await;
    let response = app
        .oneshot(form_request(form_body(SCENARIO_FIELDS)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("No Failure"));
    assert!(html.contains("Failure Probability"));
    assert!(html.contains("<td>torque_x_rotspeed_x_toolwear_scaled</td>"));
    assert!(html.contains("value=\"1500\""));
}

#[tokio::test]
async fn test_form_missing_field_shows_error() {
    let (app, _state) = setup_app(Arc::new(FixedClassifier(0.2))).await;

    let body = "rotational_speed_scaled=1500&torque_scaled=40".to_string();
    let response = app.oneshot(form_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_text(response).await;
    assert!(html.contains("expected 7 input features, got 2"));
}

#[tokio::test]
async fn test_form_text_field_shows_type_error() {
    let (app, _state) = setup_app(Arc::new(FixedClassifier(0.2))).await;
    let mut fields = SCENARIO_FIELDS;
    fields[1] = "abc";

    let response = app.oneshot(form_request(form_body(fields))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_text(response).await;
    assert!(html.contains("input 1 (torque_scaled) is not numeric"));
    assert!(!html.contains("Failure Probability</label>"));
}

#[tokio::test]
async fn test_form_service_failure_shows_generic_message() {
    let (app, _state) = setup_app(Arc::new(FailingClassifier)).await;

    let response = app
        .oneshot(form_request(form_body(SCENARIO_FIELDS)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let html = body_text(response).await;
    assert!(html.contains(SERVICE_ERROR_TEXT));
    assert!(!html.contains("internal numerical error"));
}

#[tokio::test]
async fn test_predict_malformed_inputs_return_json_errors() {
    let (app, _state) = setup_app(Arc::new(FixedClassifier(0.2))).await;

    let response = app
        .clone()
        .oneshot(json_request("/api/predict", serde_json::json!({ "inputs": 7 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error = body_json(response).await;
    assert_eq!(error["error"], "shape_error");
    assert_eq!(error["message"], "expected 7 input features, got 1");

    let body = serde_json::json!({ "values": [1, 2, 3, 4, 5, 6, 7] });
    let response = app
        .clone()
        .oneshot(json_request("/api/predict", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error = body_json(response).await;
    assert_eq!(error["error"], "shape_error");
    assert_eq!(error["message"], "expected 7 input features, got 0");

    let request = Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_body");
}

#[tokio::test]
async fn test_non_finite_input_does_not_degrade_health() {
    let classifier = LogisticClassifier::new(0.0, [1.0; 7]);
    let (app, state) = setup_app(Arc::new(classifier)).await;
    let body = serde_json::json!({ "inputs": ["NaN", "0", "0", "0", "0", "0", "0"] });

    let response = app.oneshot(json_request("/api/predict", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "service_error");

    assert_eq!(
        state.health_registry.status_of(components::CLASSIFIER).await,
        Some(predictor_lib::ComponentStatus::Healthy)
    );
}

#[tokio::test]
async fn test_info_describes_form() {
    let (app, _state) = setup_app(Arc::new(FixedClassifier(0.2))).await;

    let response = app.oneshot(get("/api/info")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let info = body_json(response).await;
    assert_eq!(info["features"].as_array().unwrap().len(), 7);
    assert_eq!(info["features"][2], "tool_wear_minutes");
    assert_eq!(info["threshold"], 0.5);
    assert_eq!(info["classifier_backend"], "fixed");
}

#[tokio::test]
async fn test_readyz_follows_ready_flag() {
    let (app, state) = setup_app(Arc::new(FixedClassifier(0.2))).await;

    let response = app.clone().oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["ready"], false);

    state.health_registry.set_ready(true).await;

    let response = app.oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state) = setup_app(Arc::new(FixedClassifier(0.9))).await;

    let response = app
        .clone()
        .oneshot(json_request("/api/predict", scenario()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let metrics_text = body_text(response).await;
    assert!(metrics_text.contains("failure_predictor_inference_latency_seconds_bucket"));
    assert!(metrics_text.contains("failure_predictor_predictions_total"));
}

#[tokio::test]
async fn test_startup_fails_without_artifacts() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = ServerConfig {
        classifier_path: dir.path().join("model.onnx"),
        explainer_path: dir.path().join("shap_explainer.onnx"),
        ..ServerConfig::default()
    };

    let result = initialize(&config, StructuredLogger::new("test")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_startup_with_linear_artifacts_serves_predictions() {
    let dir = tempfile::TempDir::new().unwrap();
    let classifier_path = dir.path().join("model.json");
    let explainer_path = dir.path().join("explainer.json");
    let artifact = serde_json::json!({
        "intercept": -4.0,
        "coefficients": [0.002, 0.03, 0.01, 0.0, 0.0, 0.0, 0.0],
        "feature_means": [1500.0, 40.0, 100.0, 0.0, 0.0, 0.0, 0.0],
    });
    std::fs::write(&classifier_path, artifact.to_string()).unwrap();
    std::fs::write(&explainer_path, artifact.to_string()).unwrap();

    let config = ServerConfig {
        classifier_path,
        explainer_path,
        ..ServerConfig::default()
    };
    let state = initialize(&config, StructuredLogger::new("test")).await.unwrap();
    let app = create_router(state);

    let response = app.oneshot(json_request("/api/predict", scenario())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result = body_json(response).await;
    let probability = result["probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&probability));
    assert_eq!(result["label"] == "Failure", probability > 0.5);
    assert_eq!(result["attributions"].as_object().unwrap().len(), 7);
}
