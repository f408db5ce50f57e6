//! Camera pose of detected markers.

use crate::aruco::Marker;
use nalgebra::Point2;

pub use fiducial_pose::{angle, Hypothesis, Mat3, Pose, PoseError, Posit, PositParams, Vec3};

/// Marker corners relative to the image centre, `y` pointing up.
///
/// This is the camera frame [`Posit`] works in: the principal point is
/// assumed to sit at the image centre and lens distortion is ignored.
pub fn centered_corners(
    corners: &[Point2<f32>; 4],
    image_width: usize,
    image_height: usize,
) -> [Point2<f64>; 4] {
    let cx = image_width as f64 / 2.0;
    let cy = image_height as f64 / 2.0;
    corners.map(|c| Point2::new(c.x as f64 - cx, -(c.y as f64 - cy)))
}

/// Pose of `marker` in a frame of `image_width × image_height` pixels.
pub fn marker_pose(
    marker: &Marker,
    image_width: usize,
    image_height: usize,
    posit: &Posit,
) -> Result<Pose, PoseError> {
    let points = centered_corners(&marker.corners, image_width, image_height);
    posit.pose(&points)
}
