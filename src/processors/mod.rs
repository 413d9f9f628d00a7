//! Image processing stages of the rule-based engine.
//!
//! Each stage is a pure function over image buffers, so the whole pipeline is
//! deterministic and freely parallelizable across frames.
//!
//! # Modules
//!
//! * `preprocess` - Grayscale conversion, smoothing, and adaptive binarization
//! * `edges` - Canny edge extraction for the crack detector
//! * `contour` - Contour tracing and geometric feature extraction
//! * `ellipse` - Direct least-squares ellipse fitting
//! * `hough` - Probabilistic line-segment detection
//! * `texture` - Block-wise surface deviation scan

pub mod contour;
pub mod edges;
pub mod ellipse;
pub mod hough;
pub mod preprocess;
pub mod texture;

pub use contour::{ContourFeature, extract_contours};
pub use edges::canny_edges;
pub use ellipse::{FittedEllipse, fit_ellipse};
pub use hough::{LineSegment, detect_line_segments};
pub use preprocess::{adaptive_threshold, gaussian_blur, image_center, image_diagonal, to_grayscale};
pub use texture::{BLOCK_SIZE, TextureAnomaly, scan_texture};
