//! Configuration for the inspection engine.
//!
//! This module provides the error type and validation trait used by all
//! configuration structures, the per-detector threshold groups of the
//! rule-based engine, and the engine-selection configuration consumed by the
//! inspector factory.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error indicating that a model path does not exist.
    #[error("model path does not exist: {path}")]
    ModelPathNotFound { path: PathBuf },

    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Error indicating that validation failed.
    #[error("validation failed: {message}")]
    ValidationFailed { message: String },
}

/// A trait for validating configuration parameters.
///
/// This trait provides methods for validating the parameters used by the
/// inspection engine, such as threshold windows, model paths, and image
/// dimensions.
pub trait ConfigValidator {
    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// A Result indicating success or a ConfigError if validation fails.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Returns the default configuration.
    fn get_defaults() -> Self
    where
        Self: Sized;

    /// Validates a model path.
    ///
    /// This method checks that the model path exists and is a file.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the model file.
    fn validate_model_path(&self, path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ModelPathNotFound {
                path: path.to_path_buf(),
            });
        }

        if !path.is_file() {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "Model path must be a file, not a directory: {}",
                    path.display()
                ),
            });
        }

        Ok(())
    }

    /// Validates image dimensions.
    ///
    /// This method checks that both dimensions are greater than 0.
    ///
    /// # Arguments
    ///
    /// * `width` - The image width in pixels.
    /// * `height` - The image height in pixels.
    fn validate_image_dimensions(&self, width: u32, height: u32) -> Result<(), ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "Image dimensions must be greater than 0, got {}x{}",
                    width, height
                ),
            });
        }
        Ok(())
    }

    /// Validates that an f64 value is positive and finite.
    ///
    /// # Arguments
    ///
    /// * `value` - The value to validate.
    /// * `field_name` - The name of the field being validated.
    fn validate_positive_f64(&self, value: f64, field_name: &str) -> Result<(), ConfigError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::InvalidConfig {
                message: format!("{} must be greater than 0.0, got {}", field_name, value),
            });
        }
        Ok(())
    }

    /// Validates an area window.
    ///
    /// This method checks that the lower bound is non-negative and strictly
    /// below the upper bound.
    ///
    /// # Arguments
    ///
    /// * `min` - The lower bound of the window.
    /// * `max` - The upper bound of the window.
    /// * `field_name` - The name of the window being validated.
    fn validate_area_window(&self, min: f64, max: f64, field_name: &str) -> Result<(), ConfigError> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || max <= min {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "{} must satisfy 0 <= min < max, got [{}, {}]",
                    field_name, min, max
                ),
            });
        }
        Ok(())
    }
}

/// Thresholds for the hole displacement check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoleShiftConfig {
    /// Contour area window (exclusive on both ends).
    pub area_min: f64,
    pub area_max: f64,
    /// Minimum circularity for a contour to count as a hole.
    pub circularity_min: f64,
    /// Minimum center displacement as a fraction of the image diagonal.
    pub shift_ratio_min: f64,
}

impl Default for HoleShiftConfig {
    fn default() -> Self {
        Self {
            area_min: 100.0,
            area_max: 5000.0,
            circularity_min: 0.60,
            shift_ratio_min: 0.15,
        }
    }
}

/// Thresholds for the ovality check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OvalityConfig {
    pub area_min: f64,
    pub area_max: f64,
    /// Minimum relative axis difference of the fitted ellipse.
    pub eccentricity_min: f64,
}

impl Default for OvalityConfig {
    fn default() -> Self {
        Self {
            area_min: 200.0,
            area_max: 10000.0,
            eccentricity_min: 0.35,
        }
    }
}

/// Thresholds for the flash check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashConfig {
    pub area_min: f64,
    pub area_max: f64,
    /// Minimum bounding-box aspect ratio (long side over short side).
    pub aspect_ratio_min: f64,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            area_min: 80.0,
            area_max: 4000.0,
            aspect_ratio_min: 5.0,
        }
    }
}

/// Thresholds for the burr check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurrConfig {
    pub area_min: f64,
    pub area_max: f64,
    /// Minimum squared-perimeter-to-area ratio.
    pub spikiness_min: f64,
}

impl Default for BurrConfig {
    fn default() -> Self {
        Self {
            area_min: 30.0,
            area_max: 2000.0,
            spikiness_min: 250.0,
        }
    }
}

/// Parameters for the line-segment crack detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrackConfig {
    /// Minimum accumulator votes before a candidate line is traced.
    pub accumulator_threshold: u32,
    /// Minimum axis-aligned extent of an accepted segment, in pixels.
    pub min_line_length: u32,
    /// Maximum run of missing pixels bridged while tracing, in pixels.
    pub max_line_gap: u32,
}

impl Default for CrackConfig {
    fn default() -> Self {
        Self {
            accumulator_threshold: 50,
            min_line_length: 40,
            max_line_gap: 10,
        }
    }
}

/// Thresholds for the surface texture scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// A block is anomalous when its deviation exceeds the global deviation
    /// times this factor.
    pub stddev_factor: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self { stddev_factor: 1.8 }
    }
}

/// Complete threshold set for the rule-based engine, one group per detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub hole_shift: HoleShiftConfig,
    pub ovality: OvalityConfig,
    pub flash: FlashConfig,
    pub burr: BurrConfig,
    pub crack: CrackConfig,
    pub surface: SurfaceConfig,
}

impl ConfigValidator for RuleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_area_window(
            self.hole_shift.area_min,
            self.hole_shift.area_max,
            "hole_shift area window",
        )?;
        self.validate_positive_f64(self.hole_shift.circularity_min, "hole_shift.circularity_min")?;
        self.validate_positive_f64(self.hole_shift.shift_ratio_min, "hole_shift.shift_ratio_min")?;

        self.validate_area_window(
            self.ovality.area_min,
            self.ovality.area_max,
            "ovality area window",
        )?;
        self.validate_positive_f64(self.ovality.eccentricity_min, "ovality.eccentricity_min")?;

        self.validate_area_window(self.flash.area_min, self.flash.area_max, "flash area window")?;
        self.validate_positive_f64(self.flash.aspect_ratio_min, "flash.aspect_ratio_min")?;

        self.validate_area_window(self.burr.area_min, self.burr.area_max, "burr area window")?;
        self.validate_positive_f64(self.burr.spikiness_min, "burr.spikiness_min")?;

        if self.crack.accumulator_threshold == 0 || self.crack.min_line_length == 0 {
            return Err(ConfigError::InvalidConfig {
                message: "crack detector thresholds must be greater than 0".to_string(),
            });
        }

        self.validate_positive_f64(self.surface.stddev_factor, "surface.stddev_factor")?;

        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Which inspection backend to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// Deterministic geometry and texture rules.
    #[default]
    RuleBased,
    /// Classification model forward pass.
    ModelBased,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuleBased => "rule-based",
            Self::ModelBased => "model-based",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rule-based" => Ok(Self::RuleBased),
            "model-based" => Ok(Self::ModelBased),
            other => Err(ConfigError::InvalidConfig {
                message: format!("unknown engine kind: {other}"),
            }),
        }
    }
}

/// Configuration consumed by the inspector factory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Backend selection.
    pub kind: EngineKind,
    /// Thresholds for the rule-based engine.
    pub rule: RuleConfig,
    /// Model artifact location, required by the model-based engine.
    pub model_path: Option<PathBuf>,
}

impl ConfigValidator for EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.rule.validate()?;
        if self.kind == EngineKind::ModelBased {
            match &self.model_path {
                Some(path) => self.validate_model_path(path)?,
                None => {
                    return Err(ConfigError::InvalidConfig {
                        message: "model-based engine requires a model path".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_detectors() {
        let config = RuleConfig::get_defaults();
        assert_eq!(config.hole_shift.area_min, 100.0);
        assert_eq!(config.hole_shift.area_max, 5000.0);
        assert_eq!(config.hole_shift.circularity_min, 0.60);
        assert_eq!(config.hole_shift.shift_ratio_min, 0.15);
        assert_eq!(config.ovality.area_min, 200.0);
        assert_eq!(config.ovality.eccentricity_min, 0.35);
        assert_eq!(config.flash.aspect_ratio_min, 5.0);
        assert_eq!(config.burr.spikiness_min, 250.0);
        assert_eq!(config.crack.accumulator_threshold, 50);
        assert_eq!(config.crack.min_line_length, 40);
        assert_eq!(config.crack.max_line_gap, 10);
        assert_eq!(config.surface.stddev_factor, 1.8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_area_window() {
        let mut config = RuleConfig::default();
        config.burr.area_min = 3000.0;
        config.burr.area_max = 100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_factor() {
        let mut config = RuleConfig::default();
        config.surface.stddev_factor = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_engine_kind() {
        assert_eq!("rule-based".parse::<EngineKind>().unwrap(), EngineKind::RuleBased);
        assert_eq!(
            "model-based".parse::<EngineKind>().unwrap(),
            EngineKind::ModelBased
        );
        assert!("neural".parse::<EngineKind>().is_err());
        assert_eq!(EngineKind::RuleBased.to_string(), "rule-based");
    }

    #[test]
    fn model_engine_requires_a_path() {
        let config = EngineConfig {
            kind: EngineKind::ModelBased,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn missing_model_file_is_reported() {
        let config = EngineConfig {
            kind: EngineKind::ModelBased,
            model_path: Some(PathBuf::from("/nonexistent/model.onnx")),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ModelPathNotFound { .. })
        ));
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"kind": "rule-based", "rule": {"crack": {"min_line_length": 60}}}"#,
        )
        .unwrap();
        assert_eq!(config.kind, EngineKind::RuleBased);
        assert_eq!(config.rule.crack.min_line_length, 60);
        assert_eq!(config.rule.crack.accumulator_threshold, 50);
        assert_eq!(config.rule.burr.spikiness_min, 250.0);
        assert!(config.model_path.is_none());
    }

    #[test]
    fn default_engine_is_rule_based() {
        let config = EngineConfig::get_defaults();
        assert_eq!(config.kind, EngineKind::RuleBased);
        assert!(config.model_path.is_none());
        assert!(config.validate().is_ok());
    }
}
