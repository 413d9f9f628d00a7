//! Probabilistic Hough transform for the crack detector.
//!
//! Edge pixels are consumed in pseudo-random order, each voting over 180
//! angle bins of one degree. When a bin crosses the accumulator threshold the
//! candidate line is traced through the edge mask in both directions with a
//! fixed-point walk, bridging short gaps. Accepted segments withdraw their
//! votes and clear their pixels so each edge contributes to at most one
//! segment. The point order comes from a fixed-seed generator, making the
//! output a pure function of the input image and parameters.

use image::GrayImage;

use crate::core::config::CrackConfig;

/// Fixed-point precision of the line walk.
const WALK_SHIFT: i64 = 16;

/// Angle bins, one per degree over a half turn.
const NUM_ANGLE: usize = 180;

/// Seed for the point consumption order.
const RNG_SEED: u64 = 88172645463325252;

/// A detected line segment in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl LineSegment {
    /// Euclidean length of the segment.
    pub fn length(&self) -> f64 {
        let dx = (self.x2 - self.x1) as f64;
        let dy = (self.y2 - self.y1) as f64;
        dx.hypot(dy)
    }
}

/// Marsaglia xorshift generator for the point consumption order.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

/// Detects straight line segments in a binary edge image.
pub fn detect_line_segments(edges: &GrayImage, config: &CrackConfig) -> Vec<LineSegment> {
    let (width, height) = edges.dimensions();
    let (w, h) = (width as i64, height as i64);
    let threshold = config.accumulator_threshold as i32;
    let min_length = config.min_line_length as i32;
    let max_gap = config.max_line_gap as i32;

    let num_rho = (2 * (width + height) + 1) as usize;
    let rho_offset = ((num_rho - 1) / 2) as i32;

    let mut cos_table = [0f32; NUM_ANGLE];
    let mut sin_table = [0f32; NUM_ANGLE];
    for n in 0..NUM_ANGLE {
        let angle = n as f64 * std::f64::consts::PI / NUM_ANGLE as f64;
        cos_table[n] = angle.cos() as f32;
        sin_table[n] = angle.sin() as f32;
    }

    let mut mask = vec![false; (width * height) as usize];
    let mut pending: Vec<(i32, i32)> = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if edges.get_pixel(x, y).0[0] != 0 {
                mask[(y * width + x) as usize] = true;
                pending.push((x as i32, y as i32));
            }
        }
    }

    let mut accumulator = vec![0i32; NUM_ANGLE * num_rho];
    let mut segments = Vec::new();
    let mut rng = XorShift64::new(RNG_SEED);
    let mut count = pending.len();

    while count > 0 {
        let idx = (rng.next() % count as u64) as usize;
        let (px, py) = pending[idx];
        pending[idx] = pending[count - 1];
        count -= 1;

        // A previous segment may have consumed this pixel already.
        if !mask[(py as i64 * w + px as i64) as usize] {
            continue;
        }

        // Vote over all angles, keeping the first bin that beats the rest.
        let mut max_votes = threshold - 1;
        let mut best_angle = 0usize;
        for n in 0..NUM_ANGLE {
            let r = (px as f32 * cos_table[n] + py as f32 * sin_table[n]).round() as i32
                + rho_offset;
            let votes = accumulator[n * num_rho + r as usize] + 1;
            accumulator[n * num_rho + r as usize] = votes;
            if votes > max_votes {
                max_votes = votes;
                best_angle = n;
            }
        }
        if max_votes < threshold {
            continue;
        }

        // Direction along the candidate line, and a fixed-point step for the
        // minor axis.
        let a = -sin_table[best_angle];
        let b = cos_table[best_angle];
        let x_dominant = a.abs() > b.abs();
        let (dx0, dy0, start_x, start_y) = if x_dominant {
            let dx = if a > 0.0 { 1i64 } else { -1i64 };
            let dy = ((b as f64) * (1i64 << WALK_SHIFT) as f64 / (a as f64).abs()).round() as i64;
            (
                dx,
                dy,
                px as i64,
                ((py as i64) << WALK_SHIFT) + (1 << (WALK_SHIFT - 1)),
            )
        } else {
            let dy = if b > 0.0 { 1i64 } else { -1i64 };
            let dx = ((a as f64) * (1i64 << WALK_SHIFT) as f64 / (b as f64).abs()).round() as i64;
            (
                dx,
                dy,
                ((px as i64) << WALK_SHIFT) + (1 << (WALK_SHIFT - 1)),
                py as i64,
            )
        };

        // First pass: find the segment endpoints in both directions.
        let mut line_end = [(0i32, 0i32); 2];
        for (k, end) in line_end.iter_mut().enumerate() {
            let (mut x, mut y) = (start_x, start_y);
            let (dx, dy) = if k == 0 { (dx0, dy0) } else { (-dx0, -dy0) };
            let mut gap = 0i32;
            loop {
                let (j, i) = if x_dominant {
                    (x, y >> WALK_SHIFT)
                } else {
                    (x >> WALK_SHIFT, y)
                };
                if j < 0 || j >= w || i < 0 || i >= h {
                    break;
                }
                if mask[(i * w + j) as usize] {
                    gap = 0;
                    *end = (j as i32, i as i32);
                } else {
                    gap += 1;
                    if gap > max_gap {
                        break;
                    }
                }
                x += dx;
                y += dy;
            }
        }

        let good_line = (line_end[1].0 - line_end[0].0).abs() >= min_length
            || (line_end[1].1 - line_end[0].1).abs() >= min_length;

        // Second pass: clear the walked pixels, and withdraw their votes when
        // the segment is accepted.
        for (k, end) in line_end.iter().enumerate() {
            let (mut x, mut y) = (start_x, start_y);
            let (dx, dy) = if k == 0 { (dx0, dy0) } else { (-dx0, -dy0) };
            loop {
                let (j, i) = if x_dominant {
                    (x, y >> WALK_SHIFT)
                } else {
                    (x >> WALK_SHIFT, y)
                };
                let cell = (i * w + j) as usize;
                if mask[cell] {
                    if good_line {
                        for n in 0..NUM_ANGLE {
                            let r = (j as f32 * cos_table[n] + i as f32 * sin_table[n]).round()
                                as i32
                                + rho_offset;
                            accumulator[n * num_rho + r as usize] -= 1;
                        }
                    }
                    mask[cell] = false;
                }
                if (j as i32, i as i32) == *end {
                    break;
                }
                x += dx;
                y += dy;
            }
        }

        if good_line {
            segments.push(LineSegment {
                x1: line_end[0].0,
                y1: line_end[0].1,
                x2: line_end[1].0,
                y2: line_end[1].1,
            });
        }
    }

    segments
}
