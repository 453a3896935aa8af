//! Model services behind the inference handler
//!
//! The classifier and explainer are opaque artifacts. Each backend adapts one
//! serialization format to the two capability traits below.

mod inference;
mod linear;
mod loader;

pub use inference::{OnnxAttributor, OnnxClassifier};
pub use linear::{LinearArtifact, LinearAttributor, LogisticClassifier};
pub use loader::{load_attributor, load_classifier, ArtifactFormat, ModelArtifacts};

use crate::models::FeatureVector;
use anyhow::Result;

/// Additive local explanation for a single instance
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    /// One signed contribution per feature, in `FEATURE_NAMES` order
    pub contributions: Vec<f64>,
    /// Expected model output the contributions are relative to
    pub base_value: Option<f64>,
}

/// Trait for binary failure classifiers
pub trait Classifier: Send + Sync {
    /// Probability of the positive ("Failure") class
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64>;

    /// Short backend name for logs and metrics
    fn backend(&self) -> &str;
}

/// Trait for per-feature attribution models
pub trait Attributor: Send + Sync {
    /// Explain a single instance
    fn explain(&self, features: &FeatureVector) -> Result<Explanation>;

    /// Short backend name for logs and metrics
    fn backend(&self) -> &str;
}
