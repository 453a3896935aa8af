//! Inference handler: validate, classify, threshold, explain, respond
//!
//! Stateless and synchronous. Both model calls receive the same single-row
//! feature vector, so label, probability and attributions always describe
//! the same input. Failures from either model are propagated unchanged;
//! there is no default prediction and no partial result.

use crate::error::InferenceError;
use crate::features::coerce_inputs;
use crate::models::{
    FeatureVector, PredictionLabel, PredictionResult, FEATURE_NAMES, NUM_FEATURES,
};
use crate::predictor::{Attributor, Classifier, ModelArtifacts};
use serde_json::Value;
use std::sync::Arc;

/// Fixed decision boundary; a probability must be strictly greater to flag failure
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Map a failure probability to its label
pub fn label_for(probability: f64) -> PredictionLabel {
    if probability > DECISION_THRESHOLD {
        PredictionLabel::Failure
    } else {
        PredictionLabel::NoFailure
    }
}

/// Request handler over the two read-only model services
#[derive(Clone)]
pub struct InferenceHandler {
    classifier: Arc<dyn Classifier>,
    attributor: Arc<dyn Attributor>,
}

impl InferenceHandler {
    pub fn new(classifier: Arc<dyn Classifier>, attributor: Arc<dyn Attributor>) -> Self {
        Self {
            classifier,
            attributor,
        }
    }

    pub fn from_artifacts(artifacts: &ModelArtifacts) -> Self {
        Self::new(artifacts.classifier.clone(), artifacts.attributor.clone())
    }

    /// Handle one request of positional raw values
    pub fn handle(&self, raw_inputs: &[Value]) -> Result<PredictionResult, InferenceError> {
        let features = coerce_inputs(raw_inputs)?;
        self.handle_features(&features)
    }

    /// Handle an already shaped feature vector
    pub fn handle_features(
        &self,
        features: &FeatureVector,
    ) -> Result<PredictionResult, InferenceError> {
        let probability = self
            .classifier
            .predict_probability(features)
            .map_err(InferenceError::classifier)?;
        // NaN fails the range check as well
        if !(0.0..=1.0).contains(&probability) {
            return Err(InferenceError::classifier(anyhow::anyhow!(
                "probability {} outside [0, 1]",
                probability
            )));
        }
        let label = label_for(probability);

        let explanation = self
            .attributor
            .explain(features)
            .map_err(InferenceError::attributor)?;
        if explanation.contributions.len() != NUM_FEATURES {
            return Err(InferenceError::attributor(anyhow::anyhow!(
                "expected {} contributions, got {}",
                NUM_FEATURES,
                explanation.contributions.len()
            )));
        }

        let attributions = FEATURE_NAMES
            .iter()
            .zip(&explanation.contributions)
            .map(|(name, value)| (name.to_string(), *value))
            .collect();

        Ok(PredictionResult {
            label,
            probability,
            attributions,
            base_value: explanation.base_value,
        })
    }

    pub fn classifier_backend(&self) -> &str {
        self.classifier.backend()
    }

    pub fn attributor_backend(&self) -> &str {
        self.attributor.backend()
    }
}
