//! Error taxonomy for inference requests

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which loaded artifact raised a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Classifier,
    Attributor,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Classifier => "classifier",
            ServiceKind::Attributor => "attributor",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the inference handler
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Wrong number of input features
    #[error("expected {expected} input features, got {actual}")]
    Shape { expected: usize, actual: usize },

    /// An input could not be interpreted as a number
    #[error("input {index} ({feature}) is not numeric: {value}")]
    Type {
        index: usize,
        feature: &'static str,
        value: String,
    },

    /// Failure inside one of the loaded models, propagated as-is
    #[error("{service} failed: {source:#}")]
    Service {
        service: ServiceKind,
        #[source]
        source: anyhow::Error,
    },
}

impl InferenceError {
    pub fn classifier(source: anyhow::Error) -> Self {
        InferenceError::Service {
            service: ServiceKind::Classifier,
            source,
        }
    }

    pub fn attributor(source: anyhow::Error) -> Self {
        InferenceError::Service {
            service: ServiceKind::Attributor,
            source,
        }
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceError::Shape { .. } => "shape_error",
            InferenceError::Type { .. } => "type_error",
            InferenceError::Service { .. } => "service_error",
        }
    }

    /// True for errors caused by the caller's input
    pub fn is_input_error(&self) -> bool {
        matches!(self, InferenceError::Shape { .. } | InferenceError::Type { .. })
    }

    /// The failing service, for service errors
    pub fn service(&self) -> Option<ServiceKind> {
        match self {
            InferenceError::Service { service, .. } => Some(*service),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let shape = InferenceError::Shape {
            expected: 7,
            actual: 6,
        };
        assert_eq!(shape.kind(), "shape_error");
        assert!(shape.is_input_error());
        assert_eq!(shape.to_string(), "expected 7 input features, got 6");

        let service = InferenceError::attributor(anyhow::anyhow!("explainer exploded"));
        assert_eq!(service.kind(), "service_error");
        assert!(!service.is_input_error());
        assert_eq!(service.service(), Some(ServiceKind::Attributor));
        assert!(service.to_string().contains("explainer exploded"));
    }

    #[test]
    fn test_service_error_keeps_source() {
        let err = InferenceError::classifier(anyhow::anyhow!("bad tensor"));
        let source = std::error::Error::source(&err).expect("source should be kept");
        assert_eq!(source.to_string(), "bad tensor");
    }
}
