//! Aggregated outcome of inspecting one frame.

use serde::{Deserialize, Serialize};

use super::defect::Defect;

/// Verdict for a single frame.
///
/// `passed` holds exactly when `defects` is empty. `confidence` is 1.0 for a
/// passing frame and the maximum defect score otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub passed: bool,
    pub defects: Vec<Defect>,
    pub confidence: f64,
}

impl InferenceResult {
    /// Aggregates detector output in detection order.
    pub fn from_defects(defects: Vec<Defect>) -> Self {
        let passed = defects.is_empty();
        let confidence = if passed {
            1.0
        } else {
            defects.iter().map(|d| d.score).fold(0.0, f64::max)
        };
        Self {
            passed,
            defects,
            confidence,
        }
    }

    /// Passing result with an explicit confidence, for backends that score
    /// the pass class directly.
    pub fn pass(confidence: f64) -> Self {
        Self {
            passed: true,
            defects: Vec::new(),
            confidence,
        }
    }

    /// Human-readable verdict label.
    pub fn verdict(&self) -> &'static str {
        if self.passed {
            "pass"
        } else {
            "fail"
        }
    }
}
