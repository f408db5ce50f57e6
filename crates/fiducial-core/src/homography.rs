use nalgebra::{Matrix3, Point2, Vector3};
use serde::{Deserialize, Serialize};

use crate::{ImageError, ImageView, PixelBuffer, WarpError};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Smallest projective denominator accepted at a corner of the unit square.
const MIN_DENOMINATOR: f64 = 1e-9;

/// Planar projective map `p' ~ H * p`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_fn(|r, c| rows[r][c]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        std::array::from_fn(|r| std::array::from_fn(|c| self.h[(r, c)]))
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

/// Map the unit square onto `quad`: `(0,0), (1,0), (1,1), (0,1)` go to
/// `quad[0..4]` in order.
///
/// Parallelograms take the affine shortcut; otherwise the two projective
/// terms are solved first and the affine terms follow.
pub fn square_to_quad(quad: &[Point2<f32>; 4]) -> Result<Homography, WarpError> {
    let [x0, x1, x2, x3] = quad.map(|p| p.x as f64);
    let [y0, y1, y2, y3] = quad.map(|p| p.y as f64);

    let px = x0 - x1 + x2 - x3;
    let py = y0 - y1 + y2 - y3;

    let h = if px.abs() < f64::EPSILON && py.abs() < f64::EPSILON {
        Matrix3::new(
            x1 - x0,
            x2 - x1,
            x0, //
            y1 - y0,
            y2 - y1,
            y0, //
            0.0,
            0.0,
            1.0,
        )
    } else {
        let dx1 = x1 - x2;
        let dx2 = x3 - x2;
        let dy1 = y1 - y2;
        let dy2 = y3 - y2;
        let den = dx1 * dy2 - dx2 * dy1;
        if den.abs() < MIN_DENOMINATOR {
            return Err(WarpError::DegenerateQuad);
        }
        let g = (px * dy2 - dx2 * py) / den;
        let k = (dx1 * py - px * dy1) / den;
        Matrix3::new(
            x1 - x0 + g * x1,
            x3 - x0 + k * x3,
            x0, //
            y1 - y0 + g * y1,
            y3 - y0 + k * y3,
            y0, //
            g,
            k,
            1.0,
        )
    };

    // The denominator is affine in (u, v): positive at the four corners means
    // positive over the whole square.
    let (g, k) = (h[(2, 0)], h[(2, 1)]);
    let corners_ok = [1.0 + g, 1.0 + k, 1.0 + g + k]
        .iter()
        .all(|&w| w > MIN_DENOMINATOR);
    if !corners_ok || h.iter().any(|v| !v.is_finite()) {
        return Err(WarpError::DegenerateQuad);
    }

    Ok(Homography::new(h))
}

/// [`square_to_quad`] rescaled so that pixel `(size-1, size-1)` of a
/// `size x size` patch lands on `quad[2]`.
pub fn perspective_transform(quad: &[Point2<f32>; 4], size: usize) -> Result<Homography, WarpError> {
    if size < 2 {
        return Err(ImageError::InvalidDimensions {
            width: size,
            height: size,
        }
        .into());
    }
    let mut hom = square_to_quad(quad)?;
    let s = (size - 1) as f64;
    for r in 0..3 {
        hom.h[(r, 0)] /= s;
        hom.h[(r, 1)] /= s;
    }
    Ok(hom)
}

/// Rectify the region bounded by `quad` into a `size x size` gray patch.
///
/// `dst` is reshaped in place, so reusing it across candidates does not
/// reallocate. Source coordinates are clamped to the image and sampled
/// bilinearly; the result is truncated.
#[cfg_attr(feature = "tracing", instrument(level = "trace", skip(src, dst)))]
pub fn warp(
    src: &ImageView<'_>,
    dst: &mut PixelBuffer,
    quad: &[Point2<f32>; 4],
    size: usize,
) -> Result<(), WarpError> {
    src.require_channels(1)?;
    if src.width == 0 || src.height == 0 {
        return Err(ImageError::InvalidDimensions {
            width: src.width,
            height: src.height,
        }
        .into());
    }
    let m = perspective_transform(quad, size)?.h;
    dst.reshape(size, size, 1);

    let (width, height) = (src.width, src.height);
    let max_x = (width - 1) as f64;
    let max_y = (height - 1) as f64;

    // Homogeneous coordinates advanced incrementally along rows and columns.
    let (mut row_x, mut row_y, mut row_w) = (m[(0, 2)], m[(1, 2)], m[(2, 2)]);
    let mut out = dst.data.iter_mut();
    for _ in 0..size {
        let (mut hx, mut hy, mut hw) = (row_x, row_y, row_w);
        for _ in 0..size {
            let x = (hx / hw).clamp(0.0, max_x);
            let y = (hy / hw).clamp(0.0, max_y);

            let sx1 = x as usize;
            let sy1 = y as usize;
            let sx2 = (sx1 + 1).min(width - 1);
            let sy2 = (sy1 + 1).min(height - 1);
            let fx = x - sx1 as f64;
            let fy = y - sy1 as f64;

            let p = |sx: usize, sy: usize| src.data[sy * width + sx] as f64;
            let top = (1.0 - fx) * p(sx1, sy1) + fx * p(sx2, sy1);
            let bottom = (1.0 - fx) * p(sx1, sy2) + fx * p(sx2, sy2);
            let v = (1.0 - fy) * top + fy * bottom;

            if let Some(o) = out.next() {
                *o = v as u8;
            }

            hx += m[(0, 0)];
            hy += m[(1, 0)];
            hw += m[(2, 0)];
        }
        row_x += m[(0, 1)];
        row_y += m[(1, 1)];
        row_w += m[(2, 1)];
    }
    Ok(())
}
