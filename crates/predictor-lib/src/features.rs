//! Shape adaptation from raw request values to a feature vector
//!
//! Inputs arrive either as JSON numbers (API) or as text (form fields), so
//! both are accepted as long as they read as a float. No range validation is
//! applied: negative or out-of-domain values pass through untouched.

use crate::error::InferenceError;
use crate::models::{FeatureVector, FEATURE_NAMES, NUM_FEATURES};
use serde_json::Value;

/// Bind exactly `NUM_FEATURES` positional values to the fixed feature names
pub fn coerce_inputs(raw: &[Value]) -> Result<FeatureVector, InferenceError> {
    if raw.len() != NUM_FEATURES {
        return Err(InferenceError::Shape {
            expected: NUM_FEATURES,
            actual: raw.len(),
        });
    }

    let mut values = [0.0; NUM_FEATURES];
    for (index, (slot, value)) in values.iter_mut().zip(raw).enumerate() {
        *slot = coerce_value(value).ok_or_else(|| InferenceError::Type {
            index,
            feature: FEATURE_NAMES[index],
            value: value.to_string(),
        })?;
    }

    Ok(FeatureVector::from_array(values))
}

fn coerce_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
