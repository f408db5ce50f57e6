//! Image primitives for square fiducial detection.
//!
//! - [`PixelBuffer`] / [`ImageView`]: interleaved 8-bit images,
//! - pixel operations: [`grayscale`], [`threshold`], [`otsu`],
//!   [`adaptive_threshold`], [`stack_box_blur`], [`gaussian_blur`],
//! - [`find_contours`] and the polygon helpers used to turn borders into
//!   quadrilaterals,
//! - [`square_to_quad`] / [`warp`] for perspective rectification.
//!
//! Destination buffers are always supplied by the caller and checked before
//! use; a wrong shape is an [`ImageError`], never a silent overrun.

mod blur;
mod contour;
mod error;
mod filters;
mod homography;
mod image;
mod logger;
mod polygon;

pub use blur::{blur_mult_shift, stack_box_blur, MAX_BLUR_RADIUS};
pub use contour::{
    binary_border, border_following, find_contours, neighborhood_deltas, Contour, NEIGHBORHOOD,
};
pub use error::{ImageError, WarpError};
pub use filters::{
    adaptive_threshold, count_non_zero, gaussian_blur, gaussian_kernel, grayscale, otsu, threshold,
    threshold_in_place, to_grayscale,
};
pub use homography::{perspective_transform, square_to_quad, warp, Homography};
pub use image::{ImageView, PixelBuffer, Rect};
pub use polygon::{approx_poly_dp, is_contour_convex, min_edge_length, perimeter};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level, LOG_ENV};
