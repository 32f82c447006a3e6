//! Server configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `CLASSIFIER_*` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use ranking::LabelSet;
use serde::{Deserialize, Serialize};

use crate::StartupError;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "CLASSIFIER_CONFIG";

/// Configuration file read when `CLASSIFIER_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "classifier.toml";

/// Labels of the bundled dog breed model, in training order
pub const DEFAULT_LABELS: [&str; 10] = [
    "Beagle",
    "Boxer",
    "Bulldog",
    "Dachshund",
    "German_Shepherd",
    "Golden_Retriever",
    "Labrador_Retriever",
    "Poodle",
    "Rottweiler",
    "Yorkshire_Terrier",
];

/// Which inference backend to load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// ONNX model file executed with tract
    #[default]
    Onnx,
    /// Fixed logits, no model file needed
    Mock,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Path to the ONNX model
    pub model_path: PathBuf,
    /// Inference backend
    pub backend: BackendKind,
    /// Label file, one label per line; the bundled labels are used when unset
    pub labels_path: Option<PathBuf>,
    /// Deadline for decode + inference + ranking (milliseconds)
    pub request_timeout_ms: u64,
    /// Maximum request body size (bytes)
    pub max_upload_bytes: usize,
    /// Maximum decoded image width or height (pixels)
    pub max_image_dimension: u32,
    /// Log level filter
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Install the Prometheus exporter and serve `/metrics`
    pub metrics: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            model_path: PathBuf::from("models/onnx_model.onnx"),
            backend: BackendKind::Onnx,
            labels_path: None,
            request_timeout_ms: 30_000,
            max_upload_bytes: 10 * 1024 * 1024,
            max_image_dimension: 8192,
            log_level: "info".to_string(),
            log_json: false,
            metrics: true,
        }
    }
}

impl ServerConfig {
    /// Load from the file named by `CLASSIFIER_CONFIG` (or `classifier.toml`) and the
    /// environment
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(path)
    }

    /// Load from a specific file and the environment. A missing file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("CLASSIFIER").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Reject limits that would fail every request
    pub fn validate(&self) -> Result<(), StartupError> {
        if self.request_timeout_ms == 0 {
            return Err(StartupError::InvalidConfig(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(StartupError::InvalidConfig(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_image_dimension == 0 {
            return Err(StartupError::InvalidConfig(
                "max_image_dimension must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The bundled label set
pub fn default_labels() -> LabelSet {
    // Constant input, the checks cannot fail
    LabelSet::new(DEFAULT_LABELS)
        .unwrap_or_else(|e| unreachable!("bundled labels are valid: {}", e))
}

/// Logits served by the mock backend: `[2.0, 1.0, 0.1, ...]` over `n` classes
pub fn mock_logits(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| match i {
            0 => 2.0,
            1 => 1.0,
            _ => 0.1,
        })
        .collect()
}
