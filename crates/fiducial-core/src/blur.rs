//! Stack box blur: a separable box filter in O(1) per pixel.
//!
//! A circular stack of `2 * radius + 1` samples holds the current window;
//! the division by the window size is a fixed-point multiply and shift.

use crate::{ImageError, ImageView, PixelBuffer};

#[cfg(feature = "tracing")]
use tracing::instrument;

const MULT: [u32; 16] = [
    1, 171, 205, 293, 57, 373, 79, 137, 241, 27, 391, 357, 41, 19, 283, 265,
];
const SHIFT: [u32; 16] = [0, 9, 10, 11, 9, 12, 10, 11, 12, 9, 13, 13, 10, 9, 13, 13];

/// Fixed-point `(mult, shift)` such that `(sum * mult) >> shift ~= sum / (2r + 1)`.
#[inline]
pub fn blur_mult_shift(radius: usize) -> (u32, u32) {
    if radius < MULT.len() {
        (MULT[radius], SHIFT[radius])
    } else {
        let size = (2 * radius + 1) as u64;
        (((1u64 << 20) + size - 1).div_euclid(size) as u32, 20)
    }
}

/// Ring buffer standing in for the blur stack.
struct Window<'a> {
    slots: &'a mut [u32],
    head: usize,
}

impl Window<'_> {
    /// Load the window centred on element 0 of a line, clamping at both ends.
    #[inline]
    fn prime(&mut self, radius: usize, mut at: impl FnMut(usize) -> u32) -> u32 {
        self.head = 0;
        let first = at(0);
        let mut sum = 0;
        for slot in self.slots[..=radius].iter_mut() {
            *slot = first;
            sum += first;
        }
        for (i, slot) in self.slots[radius + 1..].iter_mut().enumerate() {
            *slot = at(i + 1);
            sum += *slot;
        }
        sum
    }

    /// Replace the oldest sample with `incoming`; returns the outgoing one.
    #[inline]
    fn push(&mut self, incoming: u32) -> u32 {
        let out = std::mem::replace(&mut self.slots[self.head], incoming);
        self.head += 1;
        if self.head == self.slots.len() {
            self.head = 0;
        }
        out
    }
}

/// Largest radius accepted by [`stack_box_blur`].
pub const MAX_BLUR_RADIUS: usize = 1024;

/// Box blur of a single-channel image with window `2 * radius + 1`.
///
/// The horizontal pass reads `src` and writes `dst`; the vertical pass then
/// runs over `dst` in place. Samples beyond the border repeat the nearest
/// valid row or column.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src, dst), fields(w = src.width, h = src.height))
)]
pub fn stack_box_blur(
    src: &ImageView<'_>,
    dst: &mut PixelBuffer,
    radius: usize,
) -> Result<(), ImageError> {
    src.require_channels(1)?;
    dst.require_shape(src.width, src.height, 1)?;
    if radius > MAX_BLUR_RADIUS {
        return Err(ImageError::InvalidRadius {
            radius,
            max: MAX_BLUR_RADIUS,
        });
    }

    let (width, height) = (src.width, src.height);
    if width == 0 || height == 0 {
        return Ok(());
    }

    let (mult, shift) = blur_mult_shift(radius);
    let mut slots = vec![0u32; 2 * radius + 1];
    let mut stack = Window {
        slots: &mut slots,
        head: 0,
    };

    for y in 0..height {
        let row = &src.data[y * width..(y + 1) * width];
        let out = &mut dst.data[y * width..(y + 1) * width];
        let mut sum = stack.prime(radius, |i| row[i.min(width - 1)] as u32);
        for (x, o) in out.iter_mut().enumerate() {
            *o = ((sum * mult) >> shift) as u8;
            let incoming = row[(x + radius + 1).min(width - 1)] as u32;
            sum = sum + incoming - stack.push(incoming);
        }
    }

    let data = &mut dst.data;
    for x in 0..width {
        let mut sum = stack.prime(radius, |i| data[i.min(height - 1) * width + x] as u32);
        for y in 0..height {
            let incoming = data[(y + radius + 1).min(height - 1) * width + x] as u32;
            data[y * width + x] = ((sum * mult) >> shift) as u8;
            sum = sum + incoming - stack.push(incoming);
        }
    }
    Ok(())
}
