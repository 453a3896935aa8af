//! ONNX inference using tract
//!
//! Runs exported classifier and explainer graphs with a fixed `f32 [1, 7]`
//! input. Classifier graphs may expose several outputs (sklearn exports a
//! label tensor next to the probabilities); the first floating-point output
//! of a usable size is taken.

use super::{Attributor, Classifier, Explanation};
use crate::models::{FeatureVector, NUM_FEATURES};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Load and optimize an ONNX model from bytes
fn load_model(model_bytes: &[u8]) -> Result<TractModel> {
    let model = tract_onnx::onnx()
        .model_for_read(&mut std::io::Cursor::new(model_bytes))
        .context("Failed to parse ONNX model")?
        .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())
        .context("Failed to set input shape")?
        .into_optimized()
        .context("Failed to optimize model")?
        .into_runnable()
        .context("Failed to create runnable model")?;
    Ok(model)
}

fn read_model(path: &Path) -> Result<TractModel> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read ONNX artifact {}", path.display()))?;
    load_model(&bytes).with_context(|| format!("Invalid ONNX artifact {}", path.display()))
}

/// Convert feature vector to tensor input
fn features_to_tensor(features: &FeatureVector) -> Result<Tensor> {
    let data: Vec<f32> = features.to_array().iter().map(|v| *v as f32).collect();
    let array = tract_ndarray::Array2::from_shape_vec((1, NUM_FEATURES), data)?;
    Ok(array.into())
}

fn run(model: &TractModel, features: &FeatureVector, what: &str) -> Result<TVec<TValue>> {
    let start = Instant::now();
    let input = features_to_tensor(features)?;
    let outputs = model.run(tvec!(input.into()))?;

    let elapsed = start.elapsed();
    if elapsed.as_millis() > MAX_INFERENCE_MS {
        warn!(
            model = what,
            elapsed_ms = elapsed.as_millis(),
            "Inference exceeded {}ms target",
            MAX_INFERENCE_MS
        );
    } else {
        debug!(model = what, elapsed_us = elapsed.as_micros(), "Inference completed");
    }
    Ok(outputs)
}

/// Flatten a floating-point tensor, or `None` for other datum types
fn float_values(output: &Tensor) -> Option<Vec<f64>> {
    if output.datum_type() == f32::datum_type() {
        let view = output.to_array_view::<f32>().ok()?;
        Some(view.iter().map(|v| *v as f64).collect())
    } else if output.datum_type() == f64::datum_type() {
        let view = output.to_array_view::<f64>().ok()?;
        Some(view.iter().copied().collect())
    } else {
        None
    }
}

/// Pick the positive-class probability out of the model outputs
fn positive_class_probability(outputs: &[TValue]) -> Result<f64> {
    for output in outputs {
        match float_values(output).as_deref() {
            Some([_, positive]) => return Ok(*positive),
            Some([probability]) => return Ok(*probability),
            _ => continue,
        }
    }
    anyhow::bail!(
        "None of the {} model outputs holds a class probability (expected 1 or 2 float values)",
        outputs.len()
    )
}

/// Pick per-feature contributions (optionally followed by the bias term)
fn contributions(outputs: &[TValue]) -> Result<Explanation> {
    for output in outputs {
        let Some(mut values) = float_values(output) else {
            continue;
        };
        if values.len() == NUM_FEATURES {
            return Ok(Explanation {
                contributions: values,
                base_value: None,
            });
        }
        if values.len() == NUM_FEATURES + 1 {
            let base_value = values.pop();
            return Ok(Explanation {
                contributions: values,
                base_value,
            });
        }
    }
    anyhow::bail!(
        "None of the {} explainer outputs holds {} or {} contributions",
        outputs.len(),
        NUM_FEATURES,
        NUM_FEATURES + 1
    )
}

/// ONNX-based classifier using tract for lightweight inference
pub struct OnnxClassifier {
    model: TractModel,
}

impl OnnxClassifier {
    /// Load a classifier graph from disk
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            model: read_model(path)?,
        })
    }

    /// Create a classifier from model bytes
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            model: load_model(model_bytes)?,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64> {
        let outputs = run(&self.model, features, "classifier")?;
        positive_class_probability(&outputs)
    }

    fn backend(&self) -> &str {
        "onnx"
    }
}

/// ONNX-based explainer, e.g. a tree ensemble exported with contribution outputs
pub struct OnnxAttributor {
    model: TractModel,
}

impl OnnxAttributor {
    /// Load an explainer graph from disk
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            model: read_model(path)?,
        })
    }

    /// Create an explainer from model bytes
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            model: load_model(model_bytes)?,
        })
    }
}

impl Attributor for OnnxAttributor {
    fn explain(&self, features: &FeatureVector) -> Result<Explanation> {
        let outputs = run(&self.model, features, "attributor")?;
        contributions(&outputs)
    }

    fn backend(&self) -> &str {
        "onnx"
    }
}
