//! Square fiducial marker detection and pose estimation.
//!
//! This crate ties the workspace together:
//! - re-exports of the layer crates (`core`, `aruco`, `pose`),
//! - [`pose::marker_pose`], which turns a detected marker into a camera pose,
//! - (feature `image`) [`detect`] helpers that run the detector on
//!   `image::RgbaImage` / `image::GrayImage` / `image::DynamicImage`.
//!
//! ## Quickstart
//!
//! ```no_run
//! use fiducial::aruco::{Detector, DetectorParams};
//! use fiducial::detect;
//! use fiducial::pose::{marker_pose, Posit};
//! use image::ImageReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = ImageReader::open("frame.png")?.decode()?;
//! let mut detector = Detector::new(DetectorParams::default())?;
//! let posit = Posit::new(0.05, 800.0)?;
//!
//! for marker in detect::detect_dynamic(&mut detector, &img)? {
//!     let pose = marker_pose(&marker, img.width() as usize, img.height() as usize, &posit)?;
//!     println!("marker {} at {:?}", marker.id, pose.best_translation());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `fiducial::core`: pixel buffers, filters, contours, homography and warp.
//! - `fiducial::aruco`: dictionaries, decoding and the per-frame [`aruco::Detector`].
//! - `fiducial::pose`: POSIT pose estimation and the marker pose helper.
//! - `fiducial::detect` (feature `image`): helpers for `image` crate buffers.
//!
//! A [`aruco::Detector`] owns its scratch buffers; use one instance per
//! thread when processing frames concurrently.

pub use fiducial_aruco as aruco;
pub use fiducial_core as core;

pub use fiducial_aruco::{Detector, DetectorParams, Dictionary, Marker};

pub mod pose;

#[cfg(feature = "image")]
pub mod detect;
