//! Detection on `image` crate buffers.

use crate::aruco::{DetectError, Detector, DetectorParams, Marker};
use crate::core::ImageView;
use crate::pose::{marker_pose, Pose, Posit};
use ::image::{DynamicImage, GrayImage, RgbaImage};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Borrow an `image::RgbaImage` as a 4-channel view.
pub fn rgba_view(img: &RgbaImage) -> ImageView<'_> {
    ImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        channels: 4,
        data: img.as_raw(),
    }
}

/// Borrow an `image::GrayImage` as a 1-channel view.
pub fn gray_view(img: &GrayImage) -> ImageView<'_> {
    ImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        channels: 1,
        data: img.as_raw(),
    }
}

pub fn detect_rgba(detector: &mut Detector, img: &RgbaImage) -> Result<Vec<Marker>, DetectError> {
    detector.detect(&rgba_view(img))
}

pub fn detect_gray(detector: &mut Detector, img: &GrayImage) -> Result<Vec<Marker>, DetectError> {
    detector.detect(&gray_view(img))
}

/// Gray and RGBA images are used as is; other layouts are converted to RGBA8.
pub fn detect_dynamic(
    detector: &mut Detector,
    img: &DynamicImage,
) -> Result<Vec<Marker>, DetectError> {
    match img {
        DynamicImage::ImageLuma8(gray) => detect_gray(detector, gray),
        DynamicImage::ImageRgba8(rgba) => detect_rgba(detector, rgba),
        other => detect_rgba(detector, &other.to_rgba8()),
    }
}

/// One-shot detection with a fresh [`Detector`].
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn detect_markers(
    img: &DynamicImage,
    params: DetectorParams,
) -> Result<Vec<Marker>, DetectError> {
    let mut detector = Detector::new(params)?;
    detect_dynamic(&mut detector, img)
}

/// A detected marker and its pose, when one could be recovered.
#[derive(Clone, Debug)]
pub struct MarkerPose {
    pub marker: Marker,
    pub pose: Option<Pose>,
}

/// Detect markers and estimate each one's pose with `posit`.
///
/// A marker whose pose is degenerate is still returned, with `pose: None`.
pub fn detect_with_pose(
    detector: &mut Detector,
    img: &DynamicImage,
    posit: &Posit,
) -> Result<Vec<MarkerPose>, DetectError> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let markers = detect_dynamic(detector, img)?;
    Ok(markers
        .into_iter()
        .map(|marker| {
            let pose = match marker_pose(&marker, w, h, posit) {
                Ok(pose) => Some(pose),
                Err(err) => {
                    log::debug!("no pose for marker {}: {err}", marker.id);
                    None
                }
            };
            MarkerPose { marker, pose }
        })
        .collect())
}
