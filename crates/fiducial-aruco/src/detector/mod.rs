//! Full-frame marker detection.
//!
//! Per frame: grayscale, adaptive threshold, border following, quad
//! candidates (simplified, convex, large enough), clockwise winding,
//! de-duplication, then per candidate a perspective warp, Otsu binarization
//! and decoding.

mod candidates;
mod error;
mod params;
mod pipeline;

pub use candidates::{clockwise_corners, find_candidates, not_too_near, Candidate};
pub use error::DetectError;
pub use params::{DecoderMode, DetectorParams, MAX_WARP_CELL_PX};
pub use pipeline::Detector;
