//! Core data models for the failure predictor

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of input features expected by both artifacts
pub const NUM_FEATURES: usize = 7;

/// Feature names in the order the classifier and explainer were fit against.
///
/// Reordering these silently corrupts predictions; nothing at runtime can
/// detect it beyond the feature count.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "rotational_speed_scaled",
    "torque_scaled",
    "tool_wear_minutes",
    "torque_x_rotspeed_scaled",
    "torque_x_toolwear_scaled",
    "rotspeed_x_toolwear_scaled",
    "torque_x_rotspeed_x_toolwear_scaled",
];

/// Single-row feature vector for inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub rotational_speed_scaled: f64,
    pub torque_scaled: f64,
    pub tool_wear_minutes: f64,
    pub torque_x_rotspeed_scaled: f64,
    pub torque_x_toolwear_scaled: f64,
    pub rotspeed_x_toolwear_scaled: f64,
    pub torque_x_rotspeed_x_toolwear_scaled: f64,
}

impl FeatureVector {
    /// Bind positional values to the fixed feature names
    pub fn from_array(values: [f64; NUM_FEATURES]) -> Self {
        let [
            rotational_speed_scaled,
            torque_scaled,
            tool_wear_minutes,
            torque_x_rotspeed_scaled,
            torque_x_toolwear_scaled,
            rotspeed_x_toolwear_scaled,
            torque_x_rotspeed_x_toolwear_scaled,
        ] = values;
        Self {
            rotational_speed_scaled,
            torque_scaled,
            tool_wear_minutes,
            torque_x_rotspeed_scaled,
            torque_x_toolwear_scaled,
            rotspeed_x_toolwear_scaled,
            torque_x_rotspeed_x_toolwear_scaled,
        }
    }

    /// Values in `FEATURE_NAMES` order
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.rotational_speed_scaled,
            self.torque_scaled,
            self.tool_wear_minutes,
            self.torque_x_rotspeed_scaled,
            self.torque_x_toolwear_scaled,
            self.rotspeed_x_toolwear_scaled,
            self.torque_x_rotspeed_x_toolwear_scaled,
        ]
    }

    /// (name, value) pairs in model order
    pub fn named_values(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(self.to_array())
    }

    /// True when no value is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Binary decision derived from the failure probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionLabel {
    #[serde(rename = "Failure")]
    Failure,
    #[serde(rename = "No Failure")]
    NoFailure,
}

impl PredictionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionLabel::Failure => "Failure",
            PredictionLabel::NoFailure => "No Failure",
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of one inference request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: PredictionLabel,
    /// Probability of the "Failure" class
    pub probability: f64,
    /// Signed contribution per feature, keyed by feature name
    pub attributions: BTreeMap<String, f64>,
    /// Explainer expected value, when the attribution artifact reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_value: Option<f64>,
}

impl PredictionResult {
    /// Attributions in model feature order rather than key order
    pub fn ordered_attributions(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES
            .iter()
            .filter_map(|name| self.attributions.get(*name).map(|value| (*name, *value)))
            .collect()
    }
}
