//! Utility functions for the inspection engine.
//!
//! This module provides image loading and frame construction helpers used by
//! both engine backends.

pub mod image;

pub use image::{frame_from_raw, load_image};
