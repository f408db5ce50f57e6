//! Quadrilateral candidates: contour filtering, winding and de-duplication.

use fiducial_core::{approx_poly_dp, is_contour_convex, min_edge_length, perimeter, Contour};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A convex quad that may be a marker outline.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub corners: [Point2<f32>; 4],
    pub perimeter: f64,
    /// Set when a smaller candidate covers the same marker.
    pub too_near: bool,
}

impl Candidate {
    pub fn new(corners: [Point2<f32>; 4]) -> Self {
        Self {
            perimeter: perimeter(&corners),
            corners,
            too_near: false,
        }
    }
}

/// Keep contours of at least `min_len` points whose simplification
/// (`epsilon = epsilon_rel * len`) is a convex quad with no edge shorter than
/// `min_edge`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(contours), fields(contours = contours.len()))
)]
pub fn find_candidates(
    contours: &[Contour],
    min_len: f64,
    epsilon_rel: f64,
    min_edge: f64,
) -> Vec<Candidate> {
    contours
        .iter()
        .filter(|c| c.len() as f64 >= min_len)
        .filter_map(|c| {
            let poly = approx_poly_dp(&c.points, c.len() as f64 * epsilon_rel);
            let corners: [Point2<f32>; 4] = poly.as_slice().try_into().ok()?;
            (is_contour_convex(&corners) && min_edge_length(&corners) >= min_edge)
                .then(|| Candidate::new(corners))
        })
        .collect()
}

/// Make every candidate wind clockwise on screen (y down) by swapping
/// corners 1 and 3 where needed.
pub fn clockwise_corners(candidates: &mut [Candidate]) {
    for c in candidates {
        let [p0, p1, p2, _] = c.corners;
        let (dx1, dy1) = (p1.x - p0.x, p1.y - p0.y);
        let (dx2, dy2) = (p2.x - p0.x, p2.y - p0.y);
        if dx1 * dy2 - dy1 * dx2 < 0.0 {
            c.corners.swap(1, 3);
        }
    }
}

/// Drop duplicates: of two candidates whose corresponding corners are within
/// `min_dist` (root mean square), the one with the larger perimeter goes.
pub fn not_too_near(mut candidates: Vec<Candidate>, min_dist: f64) -> Vec<Candidate> {
    let min_d2 = min_dist * min_dist;
    for i in 0..candidates.len() {
        for j in i + 1..candidates.len() {
            let d2: f64 = candidates[i]
                .corners
                .iter()
                .zip(&candidates[j].corners)
                .map(|(a, b)| {
                    let dx = (a.x - b.x) as f64;
                    let dy = (a.y - b.y) as f64;
                    dx * dx + dy * dy
                })
                .sum();
            if d2 / 4.0 < min_d2 {
                let larger = if candidates[i].perimeter > candidates[j].perimeter {
                    i
                } else {
                    j
                };
                candidates[larger].too_near = true;
            }
        }
    }
    candidates.retain(|c| !c.too_near);
    candidates
}
