//! Observability infrastructure for the prediction service
//!
//! Provides:
//! - Prometheus metrics (inference latency, predictions by label, rejected
//!   requests, model service errors, loaded backends)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter_vec, GaugeVec, Histogram,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    inference_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    rejected_requests_total: IntCounterVec,
    service_errors_total: IntCounterVec,
    model_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            inference_latency_seconds: register_histogram!(
                "failure_predictor_inference_latency_seconds",
                "Time spent classifying and explaining one request",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register inference_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "failure_predictor_predictions_total",
                "Predictions served, by label",
                &["label"]
            )
            .expect("Failed to register predictions_total"),

            rejected_requests_total: register_int_counter_vec!(
                "failure_predictor_rejected_requests_total",
                "Requests rejected for invalid input, by reason",
                &["reason"]
            )
            .expect("Failed to register rejected_requests_total"),

            service_errors_total: register_int_counter_vec!(
                "failure_predictor_service_errors_total",
                "Failures raised by the loaded models, by service",
                &["service"]
            )
            .expect("Failed to register service_errors_total"),

            model_info: register_gauge_vec!(
                "failure_predictor_model_info",
                "Backends of the currently loaded classifier and explainer",
                &["classifier", "attributor"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_inference_latency(&self, duration_secs: f64) {
        self.inner().inference_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, label: &str) {
        self.inner().predictions_total.with_label_values(&[label]).inc();
    }

    pub fn inc_rejected(&self, reason: &str) {
        self.inner().rejected_requests_total.with_label_values(&[reason]).inc();
    }

    pub fn inc_service_errors(&self, service: &str) {
        self.inner().service_errors_total.with_label_values(&[service]).inc();
    }

    /// Update loaded backend info
    pub fn set_model_info(&self, classifier: &str, attributor: &str) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[classifier, attributor])
            .set(1.0);
    }
}

/// Structured logger for service events
///
/// Provides consistent JSON-formatted logging for startup, predictions and
/// failures.
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, listen_addr: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            listen_addr = %listen_addr,
            "Failure prediction service started"
        );
    }

    pub fn log_artifacts_loaded(
        &self,
        classifier_path: &str,
        classifier_backend: &str,
        explainer_path: &str,
        attributor_backend: &str,
    ) {
        info!(
            event = "artifacts_loaded",
            service = %self.service,
            classifier_path = %classifier_path,
            classifier_backend = %classifier_backend,
            explainer_path = %explainer_path,
            attributor_backend = %attributor_backend,
            "Model artifacts loaded"
        );
    }

    pub fn log_prediction(&self, label: &str, probability: f64, latency_ms: f64) {
        info!(
            event = "prediction_served",
            service = %self.service,
            label = %label,
            probability = probability,
            latency_ms = latency_ms,
            "Served failure prediction"
        );
    }

    /// Log a request rejected for malformed input
    pub fn log_rejected(&self, reason: &str, details: &str) {
        warn!(
            event = "prediction_rejected",
            service = %self.service,
            reason = %reason,
            details = %details,
            "Rejected prediction request"
        );
    }

    /// Log a failure raised by one of the models
    pub fn log_service_failure(&self, model_service: &str, details: &str) {
        error!(
            event = "prediction_failed",
            service = %self.service,
            model_service = %model_service,
            details = %details,
            "Model service failed during prediction"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Failure prediction service shutting down"
        );
    }
}
