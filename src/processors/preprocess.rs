//! Frame preparation for the rule-based engine.
//!
//! Converts an RGB frame to grayscale, smooths it with a small Gaussian
//! kernel, and binarizes it with a locally adaptive threshold. All arithmetic
//! is integer or fixed-seed floating point so repeated runs over the same
//! frame produce identical output.

use image::{GrayImage, RgbImage};

/// Separable 5x5 blur kernel, one axis. Both passes together sum to 256.
const BLUR_KERNEL: [i32; 5] = [1, 4, 6, 4, 1];

/// Side length of the adaptive threshold window.
const ADAPTIVE_BLOCK: usize = 11;

/// Gaussian sigma of the adaptive threshold window.
const ADAPTIVE_SIGMA: f64 = 2.0;

/// Offset subtracted from the local mean before comparison.
const ADAPTIVE_C: i32 = 4;

/// Converts an RGB frame to 8-bit grayscale.
///
/// Uses the BT.601 luma weights in 14-bit fixed point, rounding to nearest.
pub fn to_grayscale(frame: &RgbImage) -> GrayImage {
    let (width, height) = frame.dimensions();
    let mut gray = GrayImage::new(width, height);
    for (x, y, pixel) in frame.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let luma = (4899 * r as u32 + 9617 * g as u32 + 1868 * b as u32 + 8192) >> 14;
        gray.put_pixel(x, y, image::Luma([luma as u8]));
    }
    gray
}

/// Mirrors an index into `0..len` without repeating the border sample.
fn reflect_101(index: i64, len: i64) -> usize {
    if len == 1 {
        return 0;
    }
    let mut i = index;
    while i < 0 || i >= len {
        if i < 0 {
            i = -i;
        }
        if i >= len {
            i = 2 * len - 2 - i;
        }
    }
    i as usize
}

/// Clamps an index into `0..len`, repeating the border sample.
fn clamp_to_edge(index: i64, len: i64) -> usize {
    index.clamp(0, len - 1) as usize
}

/// Smooths a grayscale image with a separable 5x5 Gaussian kernel.
///
/// Borders are mirrored. Division by the kernel sum happens once after both
/// passes, with round-to-nearest.
pub fn gaussian_blur(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as i64, height as i64);

    // Horizontal pass accumulates into 32-bit so no rounding occurs between passes.
    let mut horizontal = vec![0i32; (width * height) as usize];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0i32;
            for (k, weight) in BLUR_KERNEL.iter().enumerate() {
                let sx = reflect_101(x + k as i64 - 2, w);
                acc += weight * gray.get_pixel(sx as u32, y as u32).0[0] as i32;
            }
            horizontal[(y * w + x) as usize] = acc;
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0i32;
            for (k, weight) in BLUR_KERNEL.iter().enumerate() {
                let sy = reflect_101(y + k as i64 - 2, h);
                acc += weight * horizontal[(sy as i64 * w + x) as usize];
            }
            out.put_pixel(x as u32, y as u32, image::Luma([((acc + 128) >> 8) as u8]));
        }
    }
    out
}

/// Normalized 1-D Gaussian weights for the adaptive threshold window.
fn adaptive_kernel() -> [f64; ADAPTIVE_BLOCK] {
    let mut kernel = [0f64; ADAPTIVE_BLOCK];
    let half = (ADAPTIVE_BLOCK / 2) as f64;
    let mut sum = 0.0;
    for (i, k) in kernel.iter_mut().enumerate() {
        let d = i as f64 - half;
        *k = (-d * d / (2.0 * ADAPTIVE_SIGMA * ADAPTIVE_SIGMA)).exp();
        sum += *k;
    }
    for k in kernel.iter_mut() {
        *k /= sum;
    }
    kernel
}

/// Binarizes a grayscale image against a Gaussian-weighted local mean.
///
/// A pixel becomes white when it sits at least `ADAPTIVE_C` levels below the
/// rounded mean of its 11x11 neighborhood, so dark features on a brighter
/// background come out white. Borders repeat the edge sample.
pub fn adaptive_threshold(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as i64, height as i64);
    let kernel = adaptive_kernel();
    let half = (ADAPTIVE_BLOCK / 2) as i64;

    let mut horizontal = vec![0f64; (width * height) as usize];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = clamp_to_edge(x + k as i64 - half, w);
                acc += weight * gray.get_pixel(sx as u32, y as u32).0[0] as f64;
            }
            horizontal[(y * w + x) as usize] = acc;
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = clamp_to_edge(y + k as i64 - half, h);
                acc += weight * horizontal[(sy as i64 * w + x) as usize];
            }
            let mean = acc.round() as i32;
            let src = gray.get_pixel(x as u32, y as u32).0[0] as i32;
            let value = if src <= mean - ADAPTIVE_C { 255 } else { 0 };
            out.put_pixel(x as u32, y as u32, image::Luma([value]));
        }
    }
    out
}

/// Length of the frame diagonal in pixels.
pub fn image_diagonal(width: u32, height: u32) -> f64 {
    (width as f64).hypot(height as f64)
}

/// Geometric center of the frame.
pub fn image_center(width: u32, height: u32) -> (f64, f64) {
    (width as f64 / 2.0, height as f64 / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    fn solid_gray(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, image::Luma([value]))
    }

    #[test]
    fn grayscale_uses_luma_weights() {
        assert_eq!(to_grayscale(&solid_rgb(2, 2, [255, 0, 0])).get_pixel(0, 0).0[0], 76);
        assert_eq!(to_grayscale(&solid_rgb(2, 2, [0, 255, 0])).get_pixel(0, 0).0[0], 150);
        assert_eq!(to_grayscale(&solid_rgb(2, 2, [0, 0, 255])).get_pixel(0, 0).0[0], 29);
    }

    #[test]
    fn grayscale_is_identity_on_neutral_pixels() {
        for v in [0u8, 1, 64, 128, 200, 255] {
            let gray = to_grayscale(&solid_rgb(1, 1, [v, v, v]));
            assert_eq!(gray.get_pixel(0, 0).0[0], v);
        }
    }

    #[test]
    fn blur_preserves_uniform_images() {
        let blurred = gaussian_blur(&solid_gray(9, 9, 143));
        assert!(blurred.pixels().all(|p| p.0[0] == 143));
    }

    #[test]
    fn blur_spreads_an_impulse() {
        let mut gray = solid_gray(9, 9, 0);
        gray.put_pixel(4, 4, image::Luma([160]));
        let blurred = gaussian_blur(&gray);
        // 160 * 36 / 256, 160 * 24 / 256, 160 * 16 / 256, 160 * 1 / 256.
        assert_eq!(blurred.get_pixel(4, 4).0[0], 23);
        assert_eq!(blurred.get_pixel(5, 4).0[0], 15);
        assert_eq!(blurred.get_pixel(5, 5).0[0], 10);
        assert_eq!(blurred.get_pixel(6, 6).0[0], 1);
    }

    #[test]
    fn reflect_indexing_mirrors_without_edge_repeat() {
        assert_eq!(reflect_101(-1, 9), 1);
        assert_eq!(reflect_101(-2, 9), 2);
        assert_eq!(reflect_101(9, 9), 7);
        assert_eq!(reflect_101(10, 9), 6);
        assert_eq!(reflect_101(4, 9), 4);
        assert_eq!(reflect_101(-1, 1), 0);
    }

    #[test]
    fn threshold_keeps_uniform_images_black() {
        let binary = adaptive_threshold(&solid_gray(31, 31, 180));
        assert!(binary.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn threshold_marks_dark_spots_white() {
        let mut gray = solid_gray(31, 31, 200);
        for y in 14..17 {
            for x in 14..17 {
                gray.put_pixel(x, y, image::Luma([100]));
            }
        }
        let binary = adaptive_threshold(&gray);
        assert_eq!(binary.get_pixel(15, 15).0[0], 255);
        assert_eq!(binary.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn frame_geometry_matches_dimensions() {
        assert_eq!(image_diagonal(400, 300), 500.0);
        assert_eq!(image_center(400, 300), (200.0, 150.0));
    }
}
