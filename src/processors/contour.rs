//! Contour extraction for the shape-based defect checks.
//!
//! Traces connected components in the binary image, reduces each border chain
//! to its direction-change points, and derives the geometric features the
//! classifiers consume. Outer borders and hole borders are treated alike.

use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::point::Point;

use crate::domain::BBox;

/// Contours below this area are sensor noise, not candidate defects.
const MIN_CONTOUR_AREA: f64 = 20.0;

/// Geometric summary of one traced contour.
#[derive(Debug, Clone)]
pub struct ContourFeature {
    /// Direction-change points of the border chain, in trace order.
    pub points: Vec<(f64, f64)>,
    /// Enclosed area from the shoelace formula.
    pub area: f64,
    /// Closed perimeter over the simplified chain.
    pub perimeter: f64,
    /// Axis-aligned bounding box of the raw chain, inclusive of both ends.
    pub bbox: BBox,
}

/// Traces all contours of a binary image and summarizes each one.
///
/// Contours whose enclosed area falls below the noise floor are dropped.
pub fn extract_contours(binary: &GrayImage) -> Vec<ContourFeature> {
    let mut features = Vec::new();
    for contour in find_contours::<u32>(binary) {
        if contour.points.is_empty() {
            continue;
        }

        let points = simplify_chain(&contour.points);
        let area = polygon_area(&points);
        if area < MIN_CONTOUR_AREA {
            continue;
        }

        features.push(ContourFeature {
            perimeter: closed_perimeter(&points),
            bbox: chain_bbox(&contour.points),
            points,
            area,
        });
    }
    features
}

/// Reduces a border chain to the points where the step direction changes.
///
/// Collinear runs collapse to their endpoints. Falls back to the raw chain
/// when fewer than 3 points survive.
pub fn simplify_chain(points: &[Point<u32>]) -> Vec<(f64, f64)> {
    let n = points.len();
    let as_f64 = |p: &Point<u32>| (p.x as f64, p.y as f64);
    if n < 3 {
        return points.iter().map(as_f64).collect();
    }

    let step = |from: &Point<u32>, to: &Point<u32>| {
        (
            (to.x as i64 - from.x as i64).signum(),
            (to.y as i64 - from.y as i64).signum(),
        )
    };

    let mut kept = Vec::new();
    for i in 0..n {
        let prev = &points[(i + n - 1) % n];
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        if step(prev, curr) != step(curr, next) {
            kept.push(as_f64(curr));
        }
    }

    if kept.len() < 3 {
        points.iter().map(as_f64).collect()
    } else {
        kept
    }
}

/// Enclosed area of a closed polygon via the shoelace formula.
///
/// Returns 0.0 for fewer than 3 points.
pub fn polygon_area(points: &[(f64, f64)]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = points.len();
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].0 * points[j].1;
        area -= points[j].0 * points[i].1;
    }
    area.abs() / 2.0
}

/// Perimeter of a closed polygon, including the wrap-around segment.
pub fn closed_perimeter(points: &[(f64, f64)]) -> f64 {
    let mut perimeter = 0.0;
    let n = points.len();
    for i in 0..n {
        let j = (i + 1) % n;
        let dx = points[j].0 - points[i].0;
        let dy = points[j].1 - points[i].1;
        perimeter += (dx * dx + dy * dy).sqrt();
    }
    perimeter
}

/// Bounding box of the raw chain. Width and height count pixels, so a
/// single-pixel chain yields a 1x1 box.
fn chain_bbox(points: &[Point<u32>]) -> BBox {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    BBox::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
}
