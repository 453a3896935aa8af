//! One-shot artifact loading at process start
//!
//! Each artifact is read once, with no retry, fallback or integrity check.
//! Any failure is returned to the caller, which treats it as fatal.

use super::{
    Attributor, Classifier, LinearArtifact, LinearAttributor, LogisticClassifier, OnnxAttributor,
    OnnxClassifier,
};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Serialization format of a model artifact, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// ONNX graph executed with tract
    Onnx,
    /// Logistic linear model in JSON
    LinearJson,
}

impl ArtifactFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("onnx") => Ok(ArtifactFormat::Onnx),
            Some("json") => Ok(ArtifactFormat::LinearJson),
            _ => anyhow::bail!(
                "Unsupported artifact format for {} (expected .onnx or .json)",
                path.display()
            ),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactFormat::Onnx => "onnx",
            ArtifactFormat::LinearJson => "linear",
        }
    }
}

fn read_linear(path: &Path) -> Result<LinearArtifact> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read linear artifact {}", path.display()))?;
    LinearArtifact::from_json(&bytes)
        .with_context(|| format!("Invalid linear artifact {}", path.display()))
}

/// Load the classifier artifact
pub fn load_classifier(path: &Path) -> Result<Arc<dyn Classifier>> {
    let classifier: Arc<dyn Classifier> = match ArtifactFormat::from_path(path)? {
        ArtifactFormat::Onnx => Arc::new(OnnxClassifier::load(path)?),
        ArtifactFormat::LinearJson => {
            Arc::new(LogisticClassifier::from_artifact(&read_linear(path)?)?)
        }
    };
    info!(path = %path.display(), backend = classifier.backend(), "Classifier loaded");
    Ok(classifier)
}

/// Load the attribution (explainer) artifact
pub fn load_attributor(path: &Path) -> Result<Arc<dyn Attributor>> {
    let attributor: Arc<dyn Attributor> = match ArtifactFormat::from_path(path)? {
        ArtifactFormat::Onnx => Arc::new(OnnxAttributor::load(path)?),
        ArtifactFormat::LinearJson => {
            let artifact = read_linear(path)?;
            Arc::new(
                LinearAttributor::from_artifact(&artifact)
                    .with_context(|| format!("Invalid explainer artifact {}", path.display()))?,
            )
        }
    };
    info!(path = %path.display(), backend = attributor.backend(), "Attributor loaded");
    Ok(attributor)
}

/// Immutable handles to both loaded models, shared for the process lifetime
#[derive(Clone)]
pub struct ModelArtifacts {
    pub classifier: Arc<dyn Classifier>,
    pub attributor: Arc<dyn Attributor>,
}

impl ModelArtifacts {
    pub fn new(classifier: Arc<dyn Classifier>, attributor: Arc<dyn Attributor>) -> Self {
        Self {
            classifier,
            attributor,
        }
    }

    /// Load both artifacts; either failing aborts startup
    pub fn load(
        classifier_path: impl AsRef<Path>,
        explainer_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let classifier = load_classifier(classifier_path.as_ref())
            .context("Failed to load classifier artifact")?;
        let attributor = load_attributor(explainer_path.as_ref())
            .context("Failed to load explainer artifact")?;
        Ok(Self::new(classifier, attributor))
    }
}

impl std::fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("classifier", &self.classifier.backend())
            .field("attributor", &self.attributor.backend())
            .finish()
    }
}
