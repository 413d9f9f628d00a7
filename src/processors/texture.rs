//! Block-wise texture scan for surface anomalies.
//!
//! Tiles the grayscale frame into 32x32 blocks and compares each block's
//! intensity deviation against the whole-frame deviation. Partial tiles at
//! the right and bottom edges are not scanned.

use image::GrayImage;

use crate::core::config::SurfaceConfig;

/// Side length of a scan block in pixels.
pub const BLOCK_SIZE: u32 = 32;

/// Blocks quieter than this are never anomalous, whatever the global level.
const MIN_LOCAL_STD: f64 = 15.0;

/// A block whose local deviation stands out from the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureAnomaly {
    /// Top-left corner of the block.
    pub x: u32,
    pub y: u32,
    pub local_std: f64,
    pub global_std: f64,
}

/// Population standard deviation over a pixel region, two-pass.
fn region_std(gray: &GrayImage, x0: u32, y0: u32, w: u32, h: u32) -> f64 {
    let n = (w * h) as f64;
    let mut sum = 0.0;
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            sum += gray.get_pixel(x, y).0[0] as f64;
        }
    }
    let mean = sum / n;

    let mut sq_sum = 0.0;
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let d = gray.get_pixel(x, y).0[0] as f64 - mean;
            sq_sum += d * d;
        }
    }
    (sq_sum / n).sqrt()
}

/// Scans the frame for blocks with anomalous texture.
pub fn scan_texture(gray: &GrayImage, config: &SurfaceConfig) -> Vec<TextureAnomaly> {
    let (width, height) = gray.dimensions();
    if width <= BLOCK_SIZE || height <= BLOCK_SIZE {
        return Vec::new();
    }

    let global_std = region_std(gray, 0, 0, width, height);

    let mut anomalies = Vec::new();
    for y in (0..height - BLOCK_SIZE).step_by(BLOCK_SIZE as usize) {
        for x in (0..width - BLOCK_SIZE).step_by(BLOCK_SIZE as usize) {
            let local_std = region_std(gray, x, y, BLOCK_SIZE, BLOCK_SIZE);
            if local_std > global_std * config.stddev_factor && local_std > MIN_LOCAL_STD {
                anomalies.push(TextureAnomaly {
                    x,
                    y,
                    local_std,
                    global_std,
                });
            }
        }
    }
    anomalies
}
