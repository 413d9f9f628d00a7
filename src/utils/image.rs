//! Utility functions for image handling.
//!
//! This module provides functions for loading frames from files and building
//! them from raw pixel data.

use crate::core::InspectError;
use image::{ImageBuffer, RgbImage};

/// Loads an image from a file path and converts it to RgbImage.
///
/// This function opens an image from the specified file path and converts it
/// to an RgbImage. It handles any image format supported by the image crate.
///
/// # Arguments
///
/// * `path` - A reference to the path of the image file to load
///
/// # Returns
///
/// * `Ok(RgbImage)` - The loaded and converted RGB image
/// * `Err(InspectError)` - An error if the image could not be loaded
///
/// # Errors
///
/// This function will return an `InspectError::ImageLoad` error if the image
/// cannot be loaded from the specified path.
pub fn load_image(path: &std::path::Path) -> Result<RgbImage, InspectError> {
    let img = image::open(path).map_err(InspectError::ImageLoad)?;
    Ok(img.to_rgb8())
}

/// Creates an RgbImage frame from raw pixel data.
///
/// The data must be in RGB format (3 bytes per pixel) and the length must
/// match the specified width and height.
///
/// # Arguments
///
/// * `width` - The width of the frame in pixels
/// * `height` - The height of the frame in pixels
/// * `data` - A vector containing the raw pixel data (RGB format)
///
/// # Returns
///
/// * `Ok(RgbImage)` - The constructed frame
/// * `Err(InspectError)` - If the dimensions are zero or the data length does
///   not match them
pub fn frame_from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<RgbImage, InspectError> {
    if width == 0 || height == 0 {
        return Err(InspectError::invalid_input(format!(
            "frame dimensions must be greater than 0, got {}x{}",
            width, height
        )));
    }

    let expected = (width as usize) * (height as usize) * 3;
    if data.len() != expected {
        return Err(InspectError::invalid_input(format!(
            "frame data length {} does not match {}x{}x3 = {}",
            data.len(),
            width,
            height,
            expected
        )));
    }

    ImageBuffer::from_raw(width, height, data).ok_or_else(|| {
        InspectError::invalid_input("frame buffer construction failed".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_frame_from_matching_buffer() {
        let frame = frame_from_raw(2, 2, vec![7u8; 12]).unwrap();
        assert_eq!(frame.dimensions(), (2, 2));
        assert_eq!(frame.get_pixel(1, 1).0, [7, 7, 7]);
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(frame_from_raw(0, 4, vec![]).is_err());
        assert!(frame_from_raw(4, 0, vec![]).is_err());
    }

    #[test]
    fn rejects_mismatched_length() {
        assert!(frame_from_raw(2, 2, vec![0u8; 11]).is_err());
        assert!(frame_from_raw(2, 2, vec![0u8; 13]).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_image(std::path::Path::new("/nonexistent/frame.png")).unwrap_err();
        assert!(matches!(err, InspectError::ImageLoad(_)));
    }
}
