//! # Mold Inspect
//!
//! A Rust library for automated visual inspection of molded parts. Given a
//! frame from the inspection camera, it reports whether the part passes and,
//! if not, which defects were found and where.
//!
//! ## Features
//!
//! - Deterministic rule-based engine built on classic image processing
//! - Six defect categories: hole shift, ovality, flash, burr, crack, and
//!   surface marks
//! - Per-detector thresholds with serde-friendly configuration
//! - Optional ONNX classification backend behind the `onnx` feature
//! - Serializable verdicts suitable for line integration
//!
//! ## Components
//!
//! - **Preprocessing**: Grayscale conversion, Gaussian smoothing, adaptive
//!   thresholding, and edge extraction
//! - **Shape rules**: Contour classification for holes, ovality, flash, and
//!   burrs
//! - **Crack detection**: Probabilistic line-segment search in the edge map
//! - **Surface scan**: Block-wise texture deviation against the frame-wide
//!   statistics
//!
//! ## Modules
//!
//! * [`core`] - Configuration, validation, and error handling
//! * [`domain`] - Defect taxonomy and the frame verdict
//! * [`inspectors`] - Inspection backends and the factory that selects them
//! * [`processors`] - Image processing building blocks
//! * [`utils`] - Frame loading helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mold_inspect::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let inspector = build_inspector(&EngineConfig::default())?;
//! let frame = load_image(Path::new("frames/part_0012.png"))?;
//! let result = inspector.inspect(&frame)?;
//! println!("{}: {} defect(s)", result.verdict(), result.defects.len());
//! # Ok(())
//! # }
//! ```
//!
//! ### JSON Configuration
//!
//! Threshold groups deserialize with defaults, so a configuration file only
//! names what it overrides:
//!
//! ```rust
//! use mold_inspect::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config: EngineConfig = serde_json::from_str(r#"
//! {
//!   "kind": "rule-based",
//!   "rule": { "crack": { "min_line_length": 60 } }
//! }
//! "#)?;
//! let inspector = build_inspector(&config)?;
//! assert_eq!(inspector.kind(), EngineKind::RuleBased);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod inspectors;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use mold_inspect::prelude::*;
/// ```
///
/// Included items cover the common flow: configure an engine, build an
/// inspector, feed it frames, and read the verdict. For the individual
/// processing stages, import from [`crate::processors`] directly.
pub mod prelude {
    // Engine selection and thresholds (essential)
    pub use crate::core::{ConfigValidator, EngineConfig, EngineKind, RuleConfig};

    // Error handling and logging (essential)
    pub use crate::core::{init_tracing, InspectError};

    // Verdicts and findings (essential)
    pub use crate::domain::{BBox, Defect, DefectKind, DefectMeta, InferenceResult};

    // Backends (essential)
    pub use crate::inspectors::{build_inspector, Inspector, RuleInspector};

    // Frame loading (minimal)
    pub use crate::utils::{frame_from_raw, load_image};
}
