//! Failure prediction service
//!
//! Hosts the inference handler behind a web form and a JSON API, with
//! health probes and Prometheus metrics.

pub mod api;
pub mod config;
pub mod form;

use anyhow::{Context, Result};
use predictor_lib::{
    health::{components, HealthRegistry},
    InferenceHandler, ModelArtifacts, ServiceMetrics, StructuredLogger,
};
use std::sync::Arc;

/// Load both artifacts and assemble the shared state.
///
/// A missing or unreadable artifact is returned as an error; the caller
/// aborts startup rather than serving without a model.
pub async fn initialize(
    config: &config::ServerConfig,
    logger: StructuredLogger,
) -> Result<Arc<api::AppState>> {
    let artifacts = ModelArtifacts::load(&config.classifier_path, &config.explainer_path)
        .context("Failed to load model artifacts")?;
    let handler = InferenceHandler::from_artifacts(&artifacts);

    logger.log_artifacts_loaded(
        &config.classifier_path.display().to_string(),
        handler.classifier_backend(),
        &config.explainer_path.display().to_string(),
        handler.attributor_backend(),
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::CLASSIFIER).await;
    health_registry.register(components::ATTRIBUTOR).await;

    let metrics = ServiceMetrics::new();
    metrics.set_model_info(handler.classifier_backend(), handler.attributor_backend());

    let page = form::PageInfo {
        title: config.title.clone(),
        description: config.description.clone(),
    };

    Ok(Arc::new(api::AppState::new(
        handler,
        health_registry,
        metrics,
        logger,
        page,
    )))
}
