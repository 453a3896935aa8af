//! Library for machine failure prediction with per-feature explanations
//!
//! This crate provides:
//! - The fixed seven-feature input model and prediction result
//! - Classifier and explainer services backed by ONNX (tract) or linear JSON artifacts
//! - The inference handler (validate, classify, threshold, explain)
//! - Health checks and observability

pub mod error;
pub mod features;
pub mod handler;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

pub use error::{InferenceError, ServiceKind};
pub use handler::{label_for, InferenceHandler, DECISION_THRESHOLD};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use predictor::{Attributor, Classifier, Explanation, ModelArtifacts};
