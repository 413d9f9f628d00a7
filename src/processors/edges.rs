//! Edge extraction for the crack detector.
//!
//! Runs a 3x3 Sobel pair over the smoothed frame, thins the L1 gradient
//! magnitude with sector-based non-maximum suppression, and links weak edges
//! to strong ones with a stack-driven hysteresis pass. Sector selection uses
//! the same 15-bit fixed-point tangent comparison throughout, so the output
//! is fully deterministic.

use image::GrayImage;

/// Candidate threshold on the L1 gradient magnitude.
const LOW_THRESHOLD: i32 = 50;

/// Strong-edge threshold on the L1 gradient magnitude.
const HIGH_THRESHOLD: i32 = 150;

/// tan(22.5 degrees) in 15-bit fixed point.
const TG22: i32 = 13573;

const SHIFT: i32 = 15;

/// Pixel states during hysteresis.
const MAYBE_EDGE: u8 = 0;
const NOT_EDGE: u8 = 1;
const EDGE: u8 = 2;

/// Detects edges in a smoothed grayscale image.
///
/// Returns a binary image where edge pixels are 255 and everything else 0.
pub fn canny_edges(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as i64, height as i64);
    let n = (width * height) as usize;

    let sample = |x: i64, y: i64| -> i32 {
        let sx = x.clamp(0, w - 1) as u32;
        let sy = y.clamp(0, h - 1) as u32;
        gray.get_pixel(sx, sy).0[0] as i32
    };

    let mut dx = vec![0i32; n];
    let mut dy = vec![0i32; n];
    let mut mag = vec![0i32; n];
    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            let gx = (sample(x + 1, y - 1) + 2 * sample(x + 1, y) + sample(x + 1, y + 1))
                - (sample(x - 1, y - 1) + 2 * sample(x - 1, y) + sample(x - 1, y + 1));
            let gy = (sample(x - 1, y + 1) + 2 * sample(x, y + 1) + sample(x + 1, y + 1))
                - (sample(x - 1, y - 1) + 2 * sample(x, y - 1) + sample(x + 1, y - 1));
            dx[idx] = gx;
            dy[idx] = gy;
            mag[idx] = gx.abs() + gy.abs();
        }
    }

    // Out-of-bounds neighbors compare as zero magnitude.
    let mag_at = |x: i64, y: i64| -> i32 {
        if x < 0 || y < 0 || x >= w || y >= h {
            0
        } else {
            mag[(y * w + x) as usize]
        }
    };

    let mut map = vec![NOT_EDGE; n];
    let mut stack = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            let m = mag[idx];
            if m <= LOW_THRESHOLD {
                continue;
            }

            let xs = dx[idx];
            let ys = dy[idx];
            let ax = xs.abs();
            let ay = ys.abs() << SHIFT;
            let tg22x = ax * TG22;

            let keep = if ay < tg22x {
                m > mag_at(x - 1, y) && m >= mag_at(x + 1, y)
            } else {
                let tg67x = tg22x + ((ax + ax) << SHIFT);
                if ay > tg67x {
                    m > mag_at(x, y - 1) && m >= mag_at(x, y + 1)
                } else {
                    let s = if (xs ^ ys) < 0 { -1 } else { 1 };
                    m > mag_at(x - s, y - 1) && m > mag_at(x + s, y + 1)
                }
            };

            if keep {
                if m > HIGH_THRESHOLD {
                    map[idx] = EDGE;
                    stack.push((x, y));
                } else {
                    map[idx] = MAYBE_EDGE;
                }
            }
        }
    }

    while let Some((x, y)) = stack.pop() {
        for ny in (y - 1)..=(y + 1) {
            for nx in (x - 1)..=(x + 1) {
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                let idx = (ny * w + nx) as usize;
                if map[idx] == MAYBE_EDGE {
                    map[idx] = EDGE;
                    stack.push((nx, ny));
                }
            }
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            if map[(y as i64 * w + x as i64) as usize] == EDGE {
                out.put_pixel(x, y, image::Luma([255]));
            }
        }
    }
    out
}
