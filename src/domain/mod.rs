//! Domain types shared across inspection backends.
//!
//! This module groups the defect taxonomy and the aggregated frame verdict
//! that every inspection engine produces, independent of how the findings
//! were obtained.

pub mod defect;
pub mod report;

pub use defect::{BBox, Defect, DefectKind, DefectMeta};
pub use report::InferenceResult;

pub(crate) use defect::round_dp;
