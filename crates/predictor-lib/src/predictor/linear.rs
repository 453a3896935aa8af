//! Logistic linear models stored as JSON
//!
//! A single artifact layout serves both roles. As a classifier it yields
//! `sigmoid(intercept + w·x)`. As an explainer it yields exact linear SHAP
//! values in log-odds space against an independent background described by
//! `feature_means`:
//!
//! ```text
//! phi[i]     = w[i] * (x[i] - mean[i])
//! base_value = intercept + w·mean
//! base_value + sum(phi) == intercept + w·x
//! ```

use super::{Attributor, Classifier, Explanation};
use crate::models::{FeatureVector, FEATURE_NAMES, NUM_FEATURES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk representation of a linear model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    /// Background means, required when the artifact is used as an explainer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_means: Option<Vec<f64>>,
    /// Declared training column order, checked against `FEATURE_NAMES`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl LinearArtifact {
    /// Parse and validate a JSON artifact
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let artifact: Self =
            serde_json::from_slice(bytes).context("Failed to parse linear model JSON")?;
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<()> {
        if !self.intercept.is_finite() {
            anyhow::bail!("Intercept must be finite, got {}", self.intercept);
        }
        fixed_width("coefficients", &self.coefficients)?;
        if let Some(means) = &self.feature_means {
            fixed_width("feature_means", means)?;
        }
        if let Some(names) = &self.feature_names {
            if names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
                anyhow::bail!(
                    "Artifact feature order {:?} does not match expected {:?}",
                    names,
                    FEATURE_NAMES
                );
            }
        }
        Ok(())
    }
}

fn fixed_width(field: &str, values: &[f64]) -> Result<[f64; NUM_FEATURES]> {
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        anyhow::bail!("{} contains a non-finite value {}", field, bad);
    }
    <[f64; NUM_FEATURES]>::try_from(values).map_err(|_| {
        anyhow::anyhow!(
            "{} has {} entries, expected {}",
            field,
            values.len(),
            NUM_FEATURES
        )
    })
}

fn dot(weights: &[f64; NUM_FEATURES], values: &[f64; NUM_FEATURES]) -> f64 {
    weights.iter().zip(values).map(|(w, x)| w * x).sum()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Logistic regression classifier
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    intercept: f64,
    coefficients: [f64; NUM_FEATURES],
}

impl LogisticClassifier {
    pub fn new(intercept: f64, coefficients: [f64; NUM_FEATURES]) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }

    pub fn from_artifact(artifact: &LinearArtifact) -> Result<Self> {
        artifact.validate()?;
        Ok(Self::new(
            artifact.intercept,
            fixed_width("coefficients", &artifact.coefficients)?,
        ))
    }

    /// Raw linear score (log-odds of failure)
    pub fn logit(&self, features: &FeatureVector) -> f64 {
        self.intercept + dot(&self.coefficients, &features.to_array())
    }
}

impl Classifier for LogisticClassifier {
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64> {
        Ok(sigmoid(self.logit(features)))
    }

    fn backend(&self) -> &str {
        "linear"
    }
}

/// Exact SHAP values for a linear model under feature independence
#[derive(Debug, Clone)]
pub struct LinearAttributor {
    coefficients: [f64; NUM_FEATURES],
    feature_means: [f64; NUM_FEATURES],
    base_value: f64,
}

impl LinearAttributor {
    pub fn new(
        intercept: f64,
        coefficients: [f64; NUM_FEATURES],
        feature_means: [f64; NUM_FEATURES],
    ) -> Self {
        let base_value = intercept + dot(&coefficients, &feature_means);
        Self {
            coefficients,
            feature_means,
            base_value,
        }
    }

    pub fn from_artifact(artifact: &LinearArtifact) -> Result<Self> {
        artifact.validate()?;
        let means = artifact
            .feature_means
            .as_deref()
            .context("Linear explainer artifact requires feature_means")?;
        Ok(Self::new(
            artifact.intercept,
            fixed_width("coefficients", &artifact.coefficients)?,
            fixed_width("feature_means", means)?,
        ))
    }
}

impl Attributor for LinearAttributor {
    fn explain(&self, features: &FeatureVector) -> Result<Explanation> {
        let contributions = self
            .coefficients
            .iter()
            .zip(self.feature_means)
            .zip(features.to_array())
            .map(|((w, mean), x)| w * (x - mean))
            .collect();
        Ok(Explanation {
            contributions,
            base_value: Some(self.base_value),
        })
    }

    fn backend(&self) -> &str {
        "linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COEFFICIENTS: [f64; NUM_FEATURES] = [0.002, 0.05, 0.01, 0.0, -0.001, 0.0, 0.000_001];
    const MEANS: [f64; NUM_FEATURES] = [1500.0, 40.0, 100.0, 60000.0, 4000.0, 150000.0, 6e6];

    fn sample() -> FeatureVector {
        FeatureVector::from_array([1500.0, 40.0, 10.0, 60000.0, 400.0, 15000.0, 600000.0])
    }

    #[test]
    fn test_probability_is_sigmoid_of_logit() {
        let classifier = LogisticClassifier::new(-5.0, COEFFICIENTS);
        let features = sample();
        let p = classifier.predict_probability(&features).unwrap();
        let expected = 1.0 / (1.0 + (-classifier.logit(&features)).exp());
        assert!((p - expected).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_zero_model_is_even_odds() {
        let classifier = LogisticClassifier::new(0.0, [0.0; NUM_FEATURES]);
        assert_eq!(classifier.predict_probability(&sample()).unwrap(), 0.5);
    }

    #[test]
    fn test_extreme_scores_stay_in_range() {
        let classifier = LogisticClassifier::new(0.0, [1.0; NUM_FEATURES]);
        let huge = FeatureVector::from_array([1e6; NUM_FEATURES]);
        let tiny = FeatureVector::from_array([-1e6; NUM_FEATURES]);
        assert_eq!(classifier.predict_probability(&huge).unwrap(), 1.0);
        assert_eq!(classifier.predict_probability(&tiny).unwrap(), 0.0);
    }

    #[test]
    fn test_shap_values_are_additive() {
        let intercept = -3.0;
        let classifier = LogisticClassifier::new(intercept, COEFFICIENTS);
        let explainer = LinearAttributor::new(intercept, COEFFICIENTS, MEANS);
        let features = sample();

        let explanation = explainer.explain(&features).unwrap();
        let total: f64 = explanation.contributions.iter().sum();
        let base = explanation.base_value.unwrap();

        assert_eq!(explanation.contributions.len(), NUM_FEATURES);
        assert!((base + total - classifier.logit(&features)).abs() < 1e-9);
    }

    #[test]
    fn test_feature_at_mean_contributes_nothing() {
        let explainer = LinearAttributor::new(0.0, COEFFICIENTS, MEANS);
        let explanation = explainer.explain(&sample()).unwrap();
        // rotational speed and torque sit exactly at the background mean
        assert_eq!(explanation.contributions[0], 0.0);
        assert_eq!(explanation.contributions[1], 0.0);
        assert!(explanation.contributions[2] < 0.0);
    }

    #[test]
    fn test_artifact_parsing() {
        let json = serde_json::json!({
            "intercept": -1.0,
            "coefficients": COEFFICIENTS,
            "feature_means": MEANS,
            "feature_names": FEATURE_NAMES,
        });
        let artifact = LinearArtifact::from_json(json.to_string().as_bytes()).unwrap();
        assert!(LogisticClassifier::from_artifact(&artifact).is_ok());
        assert!(LinearAttributor::from_artifact(&artifact).is_ok());
    }

    #[test]
    fn test_artifact_wrong_width_rejected() {
        let json = serde_json::json!({ "intercept": 0.0, "coefficients": [1.0, 2.0] });
        let err = LinearArtifact::from_json(json.to_string().as_bytes()).unwrap_err();
        assert!(err.to_string().contains("coefficients has 2 entries"));
    }

    #[test]
    fn test_artifact_feature_order_checked() {
        let mut names: Vec<&str> = FEATURE_NAMES.to_vec();
        names.swap(0, 1);
        let json = serde_json::json!({
            "intercept": 0.0,
            "coefficients": COEFFICIENTS,
            "feature_names": names,
        });
        assert!(LinearArtifact::from_json(json.to_string().as_bytes()).is_err());
    }

    #[test]
    fn test_explainer_requires_means() {
        let artifact = LinearArtifact {
            intercept: 0.0,
            coefficients: COEFFICIENTS.to_vec(),
            feature_means: None,
            feature_names: None,
        };
        assert!(LogisticClassifier::from_artifact(&artifact).is_ok());
        assert!(LinearAttributor::from_artifact(&artifact).is_err());
    }
}
