//! Inspection backends.
//!
//! Both engines answer the same question, does this frame show a defective
//! part, through the [`Inspector`] trait. The rule-based engine derives its
//! verdict from deterministic image processing; the model-based engine wraps
//! a classification network behind the `onnx` feature.

mod rule_based;

#[cfg(feature = "onnx")]
mod model_based;

pub use rule_based::RuleInspector;

#[cfg(feature = "onnx")]
pub use model_based::OnnxInspector;

use image::RgbImage;

use crate::core::config::{ConfigValidator, EngineConfig, EngineKind};
use crate::core::errors::InspectError;
use crate::domain::InferenceResult;

/// A frame-level defect inspector.
///
/// Implementations are stateless with respect to frames: inspecting the same
/// frame twice yields identical results, and a single instance may be shared
/// across threads.
pub trait Inspector: Send + Sync {
    /// Inspects one frame and reports the verdict with any findings.
    fn inspect(&self, frame: &RgbImage) -> Result<InferenceResult, InspectError>;

    /// The backend this inspector runs.
    fn kind(&self) -> EngineKind;
}

/// Builds the inspector selected by the configuration.
///
/// The configuration is validated first, so a model-based selection fails on
/// a missing artifact before any runtime is touched.
pub fn build_inspector(config: &EngineConfig) -> Result<Box<dyn Inspector>, InspectError> {
    config.validate()?;
    match config.kind {
        EngineKind::RuleBased => Ok(Box::new(RuleInspector::new(config.rule.clone())?)),
        EngineKind::ModelBased => build_model_inspector(config),
    }
}

#[cfg(feature = "onnx")]
fn build_model_inspector(config: &EngineConfig) -> Result<Box<dyn Inspector>, InspectError> {
    let path = config.model_path.as_ref().ok_or_else(|| {
        InspectError::invalid_input("model-based engine requires a model path")
    })?;
    Ok(Box::new(OnnxInspector::new(path)?))
}

#[cfg(not(feature = "onnx"))]
fn build_model_inspector(_config: &EngineConfig) -> Result<Box<dyn Inspector>, InspectError> {
    Err(InspectError::runtime_unavailable(
        "model-based engine requires the `onnx` feature",
    ))
}
