//! Border following on binary images (Suzuki & Abe).
//!
//! The image is copied into a signed working buffer padded with a one-pixel
//! zero frame. Tracing overwrites visited border pixels with `+nbd` / `-nbd`
//! so that each border is followed exactly once.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{ImageError, ImageView};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Chain-code directions, counter-clockwise starting east (y grows down).
pub const NEIGHBORHOOD: [(i32, i32); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// A traced border in image pixel coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<Point2<f32>>,
    /// `true` for the inner border of a hole, `false` for an outer border.
    pub hole: bool,
}

impl Contour {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Copy a single-channel image into `dst` as `0`/`1`, padded by a zero frame.
/// `dst` ends up `(width + 2) * (height + 2)` long.
pub fn binary_border(src: &ImageView<'_>, dst: &mut Vec<i32>) -> Result<(), ImageError> {
    src.require_channels(1)?;
    let stride = src.width + 2;
    dst.clear();
    dst.resize(stride * (src.height + 2), 0);
    for (y, row) in src.data.chunks_exact(src.width.max(1)).enumerate() {
        let base = (y + 1) * stride + 1;
        for (x, &v) in row.iter().enumerate() {
            dst[base + x] = i32::from(v != 0);
        }
    }
    Ok(())
}

/// Linear offsets of [`NEIGHBORHOOD`] for a row stride, repeated twice so a
/// walk may index up to 15 without wrapping.
pub fn neighborhood_deltas(stride: usize) -> [isize; 16] {
    let mut deltas = [0isize; 16];
    for (i, &(dx, dy)) in NEIGHBORHOOD.iter().enumerate() {
        let d = dx as isize + dy as isize * stride as isize;
        deltas[i] = d;
        deltas[i + 8] = d;
    }
    deltas
}

/// Trace every outer and hole border of a binary image.
///
/// `scratch` receives the padded working copy and may be reused across calls.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src, scratch), fields(w = src.width, h = src.height))
)]
pub fn find_contours(src: &ImageView<'_>, scratch: &mut Vec<i32>) -> Result<Vec<Contour>, ImageError> {
    binary_border(src, scratch)?;
    let deltas = neighborhood_deltas(src.width + 2);

    let mut contours = Vec::new();
    let mut nbd = 1;
    let mut pos = src.width + 3;
    for y in 0..src.height {
        for x in 0..src.width {
            let pix = scratch[pos];
            if pix != 0 {
                let hole = if pix == 1 && scratch[pos - 1] == 0 {
                    Some(false)
                } else if pix >= 1 && scratch[pos + 1] == 0 {
                    Some(true)
                } else {
                    None
                };
                if let Some(hole) = hole {
                    nbd += 1;
                    let start = Point2::new(x as i32, y as i32);
                    contours.push(border_following(scratch, pos, nbd, start, hole, &deltas));
                }
            }
            pos += 1;
        }
        pos += 2;
    }

    log::trace!("traced {} borders", contours.len());
    Ok(contours)
}

/// Follow one border starting at `pos` (image point `start`) and mark it
/// with `nbd` in `src`.
pub fn border_following(
    src: &mut [i32],
    pos: usize,
    nbd: i32,
    start: Point2<i32>,
    hole: bool,
    deltas: &[isize; 16],
) -> Contour {
    let at = |p: usize, d: isize| (p as isize + d) as usize;
    let mut points = Vec::new();

    let s_start = if hole { 0 } else { 4 };
    let mut s = s_start;
    let mut pos1 = pos;
    let mut found = false;
    loop {
        s = (s + 7) & 7;
        pos1 = at(pos, deltas[s]);
        if src[pos1] != 0 {
            found = s != s_start;
            break;
        }
        if s == s_start {
            break;
        }
    }

    if !found {
        src[pos] = -nbd;
        points.push(Point2::new(start.x as f32, start.y as f32));
        return Contour { points, hole };
    }

    let mut point = start;
    let mut pos3 = pos;
    loop {
        let s_end = s;
        let mut pos4;
        loop {
            s += 1;
            pos4 = at(pos3, deltas[s]);
            if src[pos4] != 0 {
                break;
            }
        }
        s &= 7;

        if s.wrapping_sub(1) < s_end {
            src[pos3] = -nbd;
        } else if src[pos3] == 1 {
            src[pos3] = nbd;
        }

        points.push(Point2::new(point.x as f32, point.y as f32));
        let (dx, dy) = NEIGHBORHOOD[s];
        point.x += dx;
        point.y += dy;

        if pos4 == pos && pos3 == pos1 {
            break;
        }
        pos3 = pos4;
        s = (s + 4) & 7;
    }

    Contour { points, hole }
}
