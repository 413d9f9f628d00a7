//! Error types for the inspection engine.
//!
//! This module defines the errors that can occur while building an inspector
//! or inspecting a frame, including input validation errors, configuration
//! errors, and model-backend failures. It also provides utility constructors
//! for creating these errors with appropriate context.

use std::path::PathBuf;

use thiserror::Error;

use super::config::ConfigError;

/// Enum representing the errors surfaced by the inspection engine.
#[derive(Error, Debug)]
pub enum InspectError {
    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error indicating the configured model artifact does not exist.
    #[error("model artifact not found: {path}")]
    ModelArtifactMissing {
        /// The path that was checked.
        path: PathBuf,
    },

    /// Error indicating the inference runtime is absent or failed to start.
    #[error("model runtime unavailable: {message}")]
    ModelRuntimeUnavailable {
        /// A message describing what is missing.
        message: String,
    },

    /// Error occurred during a model forward pass.
    #[error("inference")]
    Inference(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Error from the ONNX Runtime session.
    #[cfg(feature = "onnx")]
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl InspectError {
    /// Creates an `InvalidInput` error with the given message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        InspectError::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a `ConfigError` with the given message.
    pub fn config_error(message: impl Into<String>) -> Self {
        InspectError::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a `ModelRuntimeUnavailable` error with the given message.
    pub fn runtime_unavailable(message: impl Into<String>) -> Self {
        InspectError::ModelRuntimeUnavailable {
            message: message.into(),
        }
    }
}

/// Conversion from configuration errors.
///
/// A missing model path keeps its dedicated variant; everything else is
/// reported as a configuration error.
impl From<ConfigError> for InspectError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ModelPathNotFound { path } => {
                InspectError::ModelArtifactMissing { path }
            }
            other => InspectError::ConfigError {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_path_keeps_its_variant() {
        let err = InspectError::from(ConfigError::ModelPathNotFound {
            path: PathBuf::from("/tmp/missing.onnx"),
        });
        assert!(matches!(err, InspectError::ModelArtifactMissing { .. }));
    }

    #[test]
    fn other_config_errors_become_config_variant() {
        let err = InspectError::from(ConfigError::InvalidConfig {
            message: "bad threshold".to_string(),
        });
        match err {
            InspectError::ConfigError { message } => assert!(message.contains("bad threshold")),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
