//! Service configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable prefix, e.g. `PREDICTOR_PORT=8080`
pub const ENV_PREFIX: &str = "PREDICTOR";

/// Optional config file name (`predictor.toml`, `predictor.yaml`, ...)
pub const CONFIG_FILE: &str = "predictor";

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP port for the form, API and probes
    #[serde(default = "default_port")]
    pub port: u16,

    /// Classifier artifact (`.onnx` or linear `.json`)
    #[serde(default = "default_classifier_path")]
    pub classifier_path: PathBuf,

    /// Explainer artifact (`.onnx` or linear `.json`)
    #[serde(default = "default_explainer_path")]
    pub explainer_path: PathBuf,

    /// Form page title
    #[serde(default = "default_title")]
    pub title: String,

    /// Form page description
    #[serde(default = "default_description")]
    pub description: String,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7860
}

fn default_classifier_path() -> PathBuf {
    PathBuf::from("model.onnx")
}

fn default_explainer_path() -> PathBuf {
    PathBuf::from("shap_explainer.onnx")
}

fn default_title() -> String {
    "Machine Failure Prediction".to_string()
}

fn default_description() -> String {
    "Enter sensor readings to predict machine failure and see SHAP explanation.".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            classifier_path: default_classifier_path(),
            explainer_path: default_explainer_path(),
            title: default_title(),
            description: default_description(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the optional config file and environment
    pub fn load() -> Result<Self> {
        Self::from_sources(
            config::File::with_name(CONFIG_FILE).required(false),
            config::Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        )
    }

    /// Build from explicit sources; environment overrides the file
    pub fn from_sources(
        file: config::File<config::FileSourceFile, config::FileFormat>,
        env: config::Environment,
    ) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(file)
            .add_source(env)
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid predictor configuration")
    }

    /// `host:port` to listen on
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
