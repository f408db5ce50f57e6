//! Reading marker bits from a rectified, binarized patch.

use fiducial_core::{count_non_zero, ImageView, Rect};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{BitGrid, Dictionary};

/// Row patterns of the fixed 5x5 legacy scheme: two parity bits around two
/// data bits (columns 1 and 3).
pub const LEGACY_ROWS: [[u8; 5]; 4] = [
    [1, 0, 0, 0, 0],
    [1, 0, 1, 1, 1],
    [0, 1, 0, 0, 1],
    [0, 1, 1, 1, 0],
];

/// A decoded marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: u32,
    /// Image corners, clockwise, starting at the marker's top-left.
    pub corners: [Point2<f32>; 4],
    /// Bit errors corrected by the match.
    pub hamming: u32,
}

/// Cells of a `mark_size x mark_size` patch as a bit grid of the inner
/// `(mark_size - 2)^2` cells.
///
/// A cell is `1` when more than half its pixels are non-zero. Returns `None`
/// when any cell of the outer ring is mostly non-zero, since a marker needs a
/// solid dark border, and when `patch` is not a valid single-channel view.
pub fn sample_bits(patch: &ImageView<'_>, mark_size: usize) -> Option<BitGrid> {
    if mark_size < 3 || (mark_size - 2) * (mark_size - 2) > 64 {
        return None;
    }
    let cell = patch.width / mark_size;
    if cell == 0 {
        return None;
    }
    let min_nonzero = (cell * cell) >> 1;
    let lit = |row: usize, col: usize| {
        count_non_zero(patch, Rect::new(col * cell, row * cell, cell, cell))
            .ok()
            .map(|n| n > min_nonzero)
    };

    let last = mark_size - 1;
    for i in 0..mark_size {
        let step = if i == 0 || i == last { 1 } else { last };
        for j in (0..mark_size).step_by(step) {
            if lit(i, j)? {
                return None;
            }
        }
    }

    let side = mark_size - 2;
    let mut bits = BitGrid::new(side);
    for i in 0..side {
        for j in 0..side {
            bits.set(i, j, lit(i + 1, j + 1)?);
        }
    }
    Some(bits)
}

/// Sum over rows of the distance to the nearest legacy row pattern.
pub fn legacy_hamming_distance(bits: &BitGrid) -> u32 {
    (0..bits.side().min(5))
        .map(|i| {
            LEGACY_ROWS
                .iter()
                .map(|pattern| {
                    bits.row(i)
                        .zip(pattern)
                        .filter(|(b, p)| b != *p)
                        .count() as u32
                })
                .min()
                .unwrap_or(0)
        })
        .sum()
}

/// Legacy id: the bits of columns 1 and 3, row by row, most significant first.
pub fn mat2id(bits: &BitGrid) -> u32 {
    (0..bits.side().min(5)).fold(0u32, |id, i| {
        let id = (id << 1) | u32::from(bits.get(i, 1));
        (id << 1) | u32::from(bits.get(i, 3))
    })
}

/// `dst[i] = src[(k + i) % 4]`.
pub fn rotate_corners(corners: &[Point2<f32>; 4], k: usize) -> [Point2<f32>; 4] {
    std::array::from_fn(|i| corners[(k + i) % 4])
}

/// Decode against `dict`, accepting distances strictly below `tau`.
pub fn decode_marker(
    patch: &ImageView<'_>,
    candidate: &[Point2<f32>; 4],
    dict: &Dictionary,
    tau: u32,
) -> Option<Marker> {
    let bits = sample_bits(patch, dict.mark_size())?;
    let m = dict.find_within(&bits, tau)?;
    Some(Marker {
        id: m.id,
        corners: rotate_corners(candidate, (4 - m.rotation as usize) % 4),
        hamming: m.distance,
    })
}

/// Decode with the fixed 5x5 legacy scheme; only exact matches are accepted.
pub fn decode_legacy(patch: &ImageView<'_>, candidate: &[Point2<f32>; 4]) -> Option<Marker> {
    let bits = sample_bits(patch, 7)?;
    let rotations = bits.rotations();

    let mut best = (legacy_hamming_distance(&rotations[0]), 0usize);
    for (rot, grid) in rotations.iter().enumerate().skip(1) {
        let d = legacy_hamming_distance(grid);
        if d < best.0 {
            best = (d, rot);
        }
    }
    if best.0 != 0 {
        return None;
    }

    Some(Marker {
        id: mat2id(&rotations[best.1]),
        corners: rotate_corners(candidate, (4 - best.1) % 4),
        hamming: 0,
    })
}
