//! Defect taxonomy and the wire representation of a single finding.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Defect categories recognized by the inspection pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    /// Circular feature displaced from the expected image center.
    HoleShift,
    /// Contour that should be round but fits an elongated ellipse.
    Ovality,
    /// Thin material protrusion along a parting line.
    Flash,
    /// Small contour with a jagged, high-perimeter outline.
    Burr,
    /// Straight high-contrast line segment.
    Crack,
    /// Localized texture deviation on an otherwise uniform surface.
    SurfaceMarks,
}

impl DefectKind {
    /// Maps a classification-model output index to a defect kind.
    ///
    /// Index 0 is the pass class and has no kind; indices outside the
    /// known range return `None`.
    pub fn from_class_index(index: usize) -> Option<Self> {
        match index {
            1 => Some(Self::Ovality),
            2 => Some(Self::Burr),
            3 => Some(Self::Flash),
            4 => Some(Self::HoleShift),
            5 => Some(Self::Crack),
            6 => Some(Self::SurfaceMarks),
            _ => None,
        }
    }

    /// Stable snake_case name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HoleShift => "hole_shift",
            Self::Ovality => "ovality",
            Self::Flash => "flash",
            Self::Burr => "burr",
            Self::Crack => "crack",
            Self::SurfaceMarks => "surface_marks",
        }
    }
}

impl fmt::Display for DefectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned bounding box in pixel coordinates.
///
/// Serializes as the 4-element array `[x, y, w, h]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct BBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BBox {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Box center in floating-point pixel coordinates.
    pub fn center(&self) -> (f64, f64) {
        (
            f64::from(self.x) + f64::from(self.w) / 2.0,
            f64::from(self.y) + f64::from(self.h) / 2.0,
        )
    }
}

impl From<[u32; 4]> for BBox {
    fn from(v: [u32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [u32; 4] {
    fn from(b: BBox) -> Self {
        [b.x, b.y, b.w, b.h]
    }
}

/// Per-kind numeric measurements attached to a defect.
///
/// Each variant carries the fixed key set for its kind and serializes as a
/// plain JSON map of numbers. `Empty` is used by backends that do not
/// localize their findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefectMeta {
    HoleShift {
        area: i64,
        circularity: f64,
        shift_ratio: f64,
    },
    SurfaceMarks {
        local_std: f64,
        global_std: f64,
    },
    Ovality {
        eccentricity: f64,
    },
    Flash {
        aspect_ratio: f64,
    },
    Burr {
        spikiness: f64,
    },
    Crack {
        length_px: f64,
    },
    Empty {},
}

/// A single scored finding.
///
/// Scores are clamped to `[0, 1]` by the emitting detector and rounded to
/// three decimals here, so the in-memory value always equals the serialized
/// one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defect {
    #[serde(rename = "type")]
    pub kind: DefectKind,
    pub bbox: BBox,
    pub score: f64,
    pub meta: DefectMeta,
}

impl Defect {
    pub fn new(kind: DefectKind, bbox: BBox, score: f64, meta: DefectMeta) -> Self {
        Self {
            kind,
            bbox,
            score: round_dp(score, 3),
            meta,
        }
    }
}

/// Rounds to `decimals` fractional digits, half away from zero.
pub(crate) fn round_dp(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn score_is_rounded_to_three_decimals() {
        let d = Defect::new(
            DefectKind::Crack,
            BBox::new(0, 0, 10, 10),
            0.123_456,
            DefectMeta::Crack { length_px: 40.0 },
        );
        assert_eq!(d.score, 0.123);

        let d = Defect::new(
            DefectKind::Crack,
            BBox::new(0, 0, 10, 10),
            0.999_9,
            DefectMeta::Crack { length_px: 40.0 },
        );
        assert_eq!(d.score, 1.0);
    }

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(
            serde_json::to_value(DefectKind::HoleShift).unwrap(),
            json!("hole_shift")
        );
        assert_eq!(
            serde_json::to_value(DefectKind::SurfaceMarks).unwrap(),
            json!("surface_marks")
        );
        assert_eq!(DefectKind::Ovality.to_string(), "ovality");
    }

    #[test]
    fn bbox_serializes_as_array() {
        let b = BBox::new(1, 2, 3, 4);
        assert_eq!(serde_json::to_value(b).unwrap(), json!([1, 2, 3, 4]));
        let back: BBox = serde_json::from_value(json!([5, 6, 7, 8])).unwrap();
        assert_eq!(back, BBox::new(5, 6, 7, 8));
    }

    #[test]
    fn defect_wire_shape_is_flat() {
        let d = Defect::new(
            DefectKind::HoleShift,
            BBox::new(300, 310, 20, 22),
            0.4,
            DefectMeta::HoleShift {
                area: 314,
                circularity: 0.905,
                shift_ratio: 0.4,
            },
        );
        assert_eq!(
            serde_json::to_value(&d).unwrap(),
            json!({
                "type": "hole_shift",
                "bbox": [300, 310, 20, 22],
                "score": 0.4,
                "meta": {"area": 314, "circularity": 0.905, "shift_ratio": 0.4}
            })
        );
    }

    #[test]
    fn empty_meta_serializes_as_empty_map() {
        let d = Defect::new(
            DefectKind::Burr,
            BBox::new(0, 0, 0, 0),
            0.7,
            DefectMeta::Empty {},
        );
        assert_eq!(
            serde_json::to_value(&d).unwrap(),
            json!({"type": "burr", "bbox": [0, 0, 0, 0], "score": 0.7, "meta": {}})
        );
    }

    #[test]
    fn class_indices_map_to_kinds() {
        assert_eq!(DefectKind::from_class_index(0), None);
        assert_eq!(DefectKind::from_class_index(1), Some(DefectKind::Ovality));
        assert_eq!(DefectKind::from_class_index(4), Some(DefectKind::HoleShift));
        assert_eq!(
            DefectKind::from_class_index(6),
            Some(DefectKind::SurfaceMarks)
        );
        assert_eq!(DefectKind::from_class_index(7), None);
    }

    #[test]
    fn round_dp_handles_common_cases() {
        assert_eq!(round_dp(1.23456, 3), 1.235);
        assert_eq!(round_dp(12.3449, 2), 12.34);
        assert_eq!(round_dp(99.96, 1), 100.0);
    }
}
