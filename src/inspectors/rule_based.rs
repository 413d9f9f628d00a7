//! Deterministic rule-based inspection engine.
//!
//! A frame is reduced to three intermediate views (binary map, edge map, and
//! the raw grayscale), and each detector reads the view it needs: contour
//! classifiers score shapes found in the binary map, the line detector traces
//! cracks in the edge map, and the texture scan works on unsmoothed gray
//! values. Findings are aggregated into a single frame verdict.

use image::RgbImage;
use tracing::debug;

use crate::core::config::{ConfigValidator, EngineKind, RuleConfig};
use crate::core::errors::InspectError;
use crate::domain::{round_dp, BBox, Defect, DefectKind, DefectMeta, InferenceResult};
use crate::processors::{
    adaptive_threshold, canny_edges, detect_line_segments, extract_contours, fit_ellipse,
    gaussian_blur, image_center, image_diagonal, scan_texture, to_grayscale, ContourFeature,
    BLOCK_SIZE,
};

use super::Inspector;

/// Rule-based defect inspector.
///
/// Holds the validated threshold set and derives every verdict from it
/// deterministically: the same frame always yields the same result.
#[derive(Debug, Clone)]
pub struct RuleInspector {
    config: RuleConfig,
}

impl RuleInspector {
    /// Creates an inspector after validating the thresholds.
    ///
    /// # Arguments
    ///
    /// * `config` - Threshold set for all rule detectors.
    pub fn new(config: RuleConfig) -> Result<Self, InspectError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Classifies one contour against the shape rules.
    ///
    /// Rules are tried in a fixed order: hole displacement, ovality, flash,
    /// burr. The first match wins. A contour circular enough to be the hole
    /// is consumed by the hole rule whether or not it has drifted, so a
    /// well-seated hole never reaches the later rules.
    fn classify_contour(
        &self,
        contour: &ContourFeature,
        center: (f64, f64),
        diagonal: f64,
    ) -> Option<Defect> {
        let area = contour.area;
        let perimeter = contour.perimeter;
        let bbox = contour.bbox;

        let hole = &self.config.hole_shift;
        if area > hole.area_min && area < hole.area_max && perimeter > 0.0 {
            let circularity = 4.0 * std::f64::consts::PI * area / (perimeter * perimeter);
            if circularity > hole.circularity_min {
                let (cx, cy) = bbox.center();
                let shift_ratio = (cx - center.0).hypot(cy - center.1) / diagonal;
                if shift_ratio > hole.shift_ratio_min {
                    return Some(Defect::new(
                        DefectKind::HoleShift,
                        bbox,
                        shift_ratio.min(1.0),
                        DefectMeta::HoleShift {
                            area: area as i64,
                            circularity: round_dp(circularity, 3),
                            shift_ratio: round_dp(shift_ratio, 3),
                        },
                    ));
                }
                return None;
            }
        }

        let oval = &self.config.ovality;
        if contour.points.len() >= 5 && area > oval.area_min && area < oval.area_max {
            if let Some(ellipse) = fit_ellipse(&contour.points) {
                if ellipse.major > 0.0 {
                    let eccentricity = (ellipse.major - ellipse.minor).abs() / ellipse.major;
                    if eccentricity > oval.eccentricity_min {
                        return Some(Defect::new(
                            DefectKind::Ovality,
                            bbox,
                            eccentricity.min(1.0),
                            DefectMeta::Ovality {
                                eccentricity: round_dp(eccentricity, 3),
                            },
                        ));
                    }
                }
            }
        }

        let flash = &self.config.flash;
        let short = f64::from(bbox.w.min(bbox.h));
        if short > 0.0 {
            let aspect_ratio = f64::from(bbox.w.max(bbox.h)) / short;
            if aspect_ratio > flash.aspect_ratio_min
                && area > flash.area_min
                && area < flash.area_max
            {
                return Some(Defect::new(
                    DefectKind::Flash,
                    bbox,
                    (aspect_ratio / 20.0).min(1.0),
                    DefectMeta::Flash {
                        aspect_ratio: round_dp(aspect_ratio, 2),
                    },
                ));
            }
        }

        let burr = &self.config.burr;
        if area > burr.area_min && area < burr.area_max && perimeter > 0.0 {
            let spikiness = perimeter * perimeter / area;
            if spikiness > burr.spikiness_min {
                return Some(Defect::new(
                    DefectKind::Burr,
                    bbox,
                    (spikiness / 1000.0).min(1.0),
                    DefectMeta::Burr {
                        spikiness: round_dp(spikiness, 1),
                    },
                ));
            }
        }

        None
    }
}

impl Inspector for RuleInspector {
    fn inspect(&self, frame: &RgbImage) -> Result<InferenceResult, InspectError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(InspectError::invalid_input(format!(
                "frame dimensions must be greater than 0, got {width}x{height}"
            )));
        }

        let gray = to_grayscale(frame);
        let blurred = gaussian_blur(&gray);
        let binary = adaptive_threshold(&blurred);
        let edges = canny_edges(&blurred);

        let center = image_center(width, height);
        let diagonal = image_diagonal(width, height);
        let mut defects = Vec::new();

        let contours = extract_contours(&binary);
        debug!("extracted {} candidate contours", contours.len());
        for contour in &contours {
            if let Some(defect) = self.classify_contour(contour, center, diagonal) {
                defects.push(defect);
            }
        }

        let segments = detect_line_segments(&edges, &self.config.crack);
        debug!("detected {} line segments", segments.len());
        for segment in &segments {
            let length = segment.length();
            defects.push(Defect::new(
                DefectKind::Crack,
                BBox::new(
                    segment.x1.min(segment.x2) as u32,
                    segment.y1.min(segment.y2) as u32,
                    segment.x1.abs_diff(segment.x2),
                    segment.y1.abs_diff(segment.y2),
                ),
                (length / diagonal).min(1.0),
                DefectMeta::Crack {
                    length_px: round_dp(length, 1),
                },
            ));
        }

        let anomalies = scan_texture(&gray, &self.config.surface);
        debug!("flagged {} texture blocks", anomalies.len());
        for anomaly in &anomalies {
            defects.push(Defect::new(
                DefectKind::SurfaceMarks,
                BBox::new(anomaly.x, anomaly.y, BLOCK_SIZE, BLOCK_SIZE),
                (anomaly.local_std / 128.0).min(1.0),
                DefectMeta::SurfaceMarks {
                    local_std: round_dp(anomaly.local_std, 2),
                    global_std: round_dp(anomaly.global_std, 2),
                },
            ));
        }

        Ok(InferenceResult::from_defects(defects))
    }

    fn kind(&self) -> EngineKind {
        EngineKind::RuleBased
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const CENTER: (f64, f64) = (200.0, 200.0);

    fn diagonal() -> f64 {
        image_diagonal(400, 400)
    }

    fn inspector() -> RuleInspector {
        RuleInspector::new(RuleConfig::default()).unwrap()
    }

    fn feature(points: Vec<(f64, f64)>, area: f64, perimeter: f64, bbox: BBox) -> ContourFeature {
        ContourFeature {
            points,
            area,
            perimeter,
            bbox,
        }
    }

    fn ellipse_points(cx: f64, cy: f64, a: f64, b: f64, n: usize) -> Vec<(f64, f64)> {
        (0..n)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
                (cx + a * t.cos(), cy + b * t.sin())
            })
            .collect()
    }

    fn flat_frame(width: u32, height: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([value, value, value]))
    }

    #[test]
    fn displaced_hole_scores_its_shift() {
        let contour = feature(
            ellipse_points(310.0, 310.0, 10.0, 10.0, 20),
            314.0,
            62.8,
            BBox::new(300, 300, 20, 20),
        );
        let defect = inspector()
            .classify_contour(&contour, CENTER, diagonal())
            .unwrap();
        assert_eq!(defect.kind, DefectKind::HoleShift);
        assert_eq!(defect.score, 0.275);
        assert_eq!(
            defect.meta,
            DefectMeta::HoleShift {
                area: 314,
                circularity: 1.001,
                shift_ratio: 0.275,
            }
        );
    }

    #[test]
    fn centered_hole_consumes_the_contour() {
        // Elongated enough that the ovality rule would fire, but the hole
        // rule claims it first and reports nothing for a well-seated hole.
        let contour = feature(
            ellipse_points(200.5, 200.5, 24.0, 15.0, 40),
            std::f64::consts::PI * 24.0 * 15.0,
            124.2,
            BBox::new(176, 185, 49, 31),
        );
        assert!(inspector()
            .classify_contour(&contour, CENTER, diagonal())
            .is_none());
    }

    #[test]
    fn hole_rule_outranks_ovality() {
        let contour = feature(
            ellipse_points(344.5, 335.5, 24.0, 15.0, 40),
            std::f64::consts::PI * 24.0 * 15.0,
            124.2,
            BBox::new(320, 320, 49, 31),
        );
        let defect = inspector()
            .classify_contour(&contour, CENTER, diagonal())
            .unwrap();
        assert_eq!(defect.kind, DefectKind::HoleShift);
    }

    #[test]
    fn elongated_contour_is_ovality() {
        // Too stretched to pass the circularity gate, so the hole rule
        // releases it and the ellipse fit takes over.
        let contour = feature(
            ellipse_points(200.0, 200.0, 28.0, 7.0, 40),
            std::f64::consts::PI * 28.0 * 7.0,
            120.0,
            BBox::new(172, 193, 57, 15),
        );
        let defect = inspector()
            .classify_contour(&contour, CENTER, diagonal())
            .unwrap();
        assert_eq!(defect.kind, DefectKind::Ovality);
        assert_eq!(defect.score, 0.75);
        assert_eq!(defect.meta, DefectMeta::Ovality { eccentricity: 0.75 });
    }

    #[test]
    fn failed_ellipse_fit_falls_through_to_flash() {
        let points: Vec<(f64, f64)> = (0..8).map(|i| (f64::from(i) * 10.0, 1.0)).collect();
        let contour = feature(points, 300.0, 148.0, BBox::new(0, 0, 71, 3));
        let defect = inspector()
            .classify_contour(&contour, CENTER, diagonal())
            .unwrap();
        assert_eq!(defect.kind, DefectKind::Flash);
    }

    #[test]
    fn thin_sliver_is_flash() {
        let contour = feature(
            vec![(0.0, 0.0), (59.0, 0.0), (59.0, 2.0), (0.0, 2.0)],
            118.0,
            122.0,
            BBox::new(0, 0, 60, 3),
        );
        let defect = inspector()
            .classify_contour(&contour, CENTER, diagonal())
            .unwrap();
        assert_eq!(defect.kind, DefectKind::Flash);
        assert_eq!(defect.score, 1.0);
        assert_eq!(defect.meta, DefectMeta::Flash { aspect_ratio: 20.0 });
    }

    #[test]
    fn aspect_ratio_boundary_is_exclusive() {
        let contour = feature(
            vec![(0.0, 0.0), (49.0, 0.0), (49.0, 9.0), (0.0, 9.0)],
            90.0,
            100.0,
            BBox::new(0, 0, 50, 10),
        );
        assert!(inspector()
            .classify_contour(&contour, CENTER, diagonal())
            .is_none());
    }

    #[test]
    fn ragged_outline_is_burr() {
        let contour = feature(
            vec![(0.0, 0.0), (39.0, 0.0), (39.0, 39.0), (0.0, 39.0)],
            500.0,
            400.0,
            BBox::new(0, 0, 40, 40),
        );
        let defect = inspector()
            .classify_contour(&contour, CENTER, diagonal())
            .unwrap();
        assert_eq!(defect.kind, DefectKind::Burr);
        assert_eq!(defect.score, 0.32);
        assert_eq!(defect.meta, DefectMeta::Burr { spikiness: 320.0 });
    }

    #[test]
    fn burr_window_is_exclusive_at_both_ends() {
        let quad = vec![(0.0, 0.0), (39.0, 0.0), (39.0, 39.0), (0.0, 39.0)];
        let at_max = feature(quad.clone(), 2000.0, 1000.0, BBox::new(0, 0, 40, 40));
        assert!(inspector()
            .classify_contour(&at_max, CENTER, diagonal())
            .is_none());

        let at_min = feature(quad, 30.0, 200.0, BBox::new(0, 0, 10, 10));
        assert!(inspector()
            .classify_contour(&at_min, CENTER, diagonal())
            .is_none());
    }

    #[test]
    fn spikiness_boundary_is_exclusive() {
        let contour = feature(
            vec![(0.0, 0.0), (39.0, 0.0), (39.0, 39.0), (0.0, 39.0)],
            1000.0,
            500.0,
            BBox::new(0, 0, 40, 40),
        );
        assert!(inspector()
            .classify_contour(&contour, CENTER, diagonal())
            .is_none());
    }

    #[test]
    fn hole_area_boundary_is_exclusive() {
        let contour = feature(
            vec![(0.0, 0.0), (11.0, 0.0), (11.0, 11.0), (0.0, 11.0)],
            100.0,
            35.45,
            BBox::new(0, 0, 12, 12),
        );
        assert!(inspector()
            .classify_contour(&contour, CENTER, diagonal())
            .is_none());
    }

    fn displaced_hole_frame() -> RgbImage {
        let mut frame = RgbImage::new(400, 400);
        for y in 0..400u32 {
            for x in 0..400u32 {
                let base = 100 + (x * 155) / 399;
                let dx = f64::from(x) - 360.0;
                let dy = f64::from(y) - 360.0;
                let dip = 200.0 * (-(dx * dx + dy * dy) / (2.0 * 11.0 * 11.0)).exp();
                let value = (f64::from(base) - dip).round().clamp(0.0, 255.0) as u8;
                frame.put_pixel(x, y, Rgb([value, value, value]));
            }
        }
        frame
    }

    fn cracked_frame() -> RgbImage {
        let mut frame = flat_frame(400, 400, 220);
        for y in 198..=200u32 {
            for x in 150..250u32 {
                frame.put_pixel(x, y, Rgb([60, 60, 60]));
            }
        }
        frame
    }

    fn marked_frame() -> RgbImage {
        let mut frame = flat_frame(400, 400, 128);
        for y in 192..224u32 {
            for x in 192..224u32 {
                let value = if ((x / 2) + (y / 2)) % 2 == 0 { 158 } else { 98 };
                frame.put_pixel(x, y, Rgb([value, value, value]));
            }
        }
        frame
    }

    #[test]
    fn clean_frame_passes() {
        let result = inspector().inspect(&flat_frame(400, 400, 128)).unwrap();
        assert!(result.passed);
        assert!(result.defects.is_empty());
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.verdict(), "pass");
    }

    #[test]
    fn displaced_hole_fails_the_frame() {
        let result = inspector().inspect(&displaced_hole_frame()).unwrap();
        assert!(!result.passed);
        assert_eq!(result.verdict(), "fail");
        assert_eq!(result.defects.len(), 1);
        let defect = &result.defects[0];
        assert_eq!(defect.kind, DefectKind::HoleShift);
        // Blob center sits at (360.5, 360.5), a shift of about 0.401.
        assert!(defect.score > 0.39 && defect.score < 0.41);
        assert_eq!(result.confidence, defect.score);
    }

    #[test]
    fn dark_streak_reports_a_crack() {
        let result = inspector().inspect(&cracked_frame()).unwrap();
        assert!(!result.passed);
        let cracks: Vec<_> = result
            .defects
            .iter()
            .filter(|d| d.kind == DefectKind::Crack)
            .collect();
        assert!(!cracks.is_empty());
        assert!(cracks.iter().any(|d| matches!(
            d.meta,
            DefectMeta::Crack { length_px } if (85.0..=115.0).contains(&length_px)
        )));
        let max = result.defects.iter().map(|d| d.score).fold(0.0, f64::max);
        assert_eq!(result.confidence, max);
    }

    #[test]
    fn rough_patch_reports_surface_marks() {
        let result = inspector().inspect(&marked_frame()).unwrap();
        assert!(!result.passed);
        assert_eq!(result.defects.len(), 1);
        let defect = &result.defects[0];
        assert_eq!(defect.kind, DefectKind::SurfaceMarks);
        assert_eq!(defect.bbox, BBox::new(192, 192, 32, 32));
        assert_eq!(defect.score, 0.234);
        assert_eq!(
            defect.meta,
            DefectMeta::SurfaceMarks {
                local_std: 30.0,
                global_std: 2.4,
            }
        );
    }

    #[test]
    fn verdicts_are_deterministic() {
        let frame = cracked_frame();
        let first = inspector().inspect(&frame).unwrap();
        let second = inspector().inspect(&frame).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn empty_frame_is_rejected() {
        let err = inspector().inspect(&RgbImage::new(0, 0)).unwrap_err();
        assert!(matches!(err, InspectError::InvalidInput { .. }));
    }
}
