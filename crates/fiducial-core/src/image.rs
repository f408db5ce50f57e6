//! Owned pixel buffers and borrowed views over them.
//!
//! Pixels are interleaved row-major bytes: `data[(y * width + x) * channels + c]`.

use serde::{Deserialize, Serialize};

use crate::ImageError;

/// Borrowed, read-only view over interleaved 8-bit pixels.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: &'a [u8],
}

impl<'a> ImageView<'a> {
    /// Wrap `data` without copying. Fails if the length disagrees with the shape.
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        data: &'a [u8],
    ) -> Result<Self, ImageError> {
        check_len(width, height, channels, data.len())?;
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Single-channel view.
    pub fn gray(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageError> {
        Self::new(width, height, 1, data)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check `data.len() == width * height * channels`.
    ///
    /// The fields are public, so a view built by hand may disagree with its
    /// own shape; every operation reading a view runs this first.
    pub fn validate(&self) -> Result<(), ImageError> {
        check_len(self.width, self.height, self.channels, self.data.len())
    }

    /// [`validate`](Self::validate) plus a channel count check.
    pub(crate) fn require_channels(&self, expected: usize) -> Result<(), ImageError> {
        self.validate()?;
        if self.channels != expected {
            return Err(ImageError::ChannelMismatch {
                expected,
                got: self.channels,
            });
        }
        Ok(())
    }
}

/// Owned pixel buffer.
///
/// Invariant: `data.len() == width * height * channels`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PixelBuffer {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Zero-filled buffer.
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![0; width * height * channels],
        }
    }

    /// Zero-filled single-channel buffer.
    pub fn gray(width: usize, height: usize) -> Self {
        Self::new(width, height, 1)
    }

    /// Take ownership of `data` as-is.
    pub fn from_vec(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self, ImageError> {
        check_len(width, height, channels, data.len())?;
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Copy numeric samples, rounding and clamping each one into `0..=255`.
    pub fn from_values<T>(
        width: usize,
        height: usize,
        channels: usize,
        values: &[T],
    ) -> Result<Self, ImageError>
    where
        T: Copy + Into<f64>,
    {
        check_len(width, height, channels, values.len())?;
        let data = values
            .iter()
            .map(|&v| {
                let v: f64 = v.into();
                if v.is_nan() {
                    0
                } else {
                    v.round().clamp(0.0, 255.0) as u8
                }
            })
            .collect();
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    #[inline]
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data: &self.data,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }

    /// Sample at `(x, y)` in channel `c`; `None` outside the buffer.
    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize, c: usize) -> Option<u8> {
        if x >= self.width || y >= self.height || c >= self.channels {
            return None;
        }
        Some(self.data[(y * self.width + x) * self.channels + c])
    }

    /// Returns `false` when `(x, y, c)` is out of range.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, c: usize, value: u8) -> bool {
        if x >= self.width || y >= self.height || c >= self.channels {
            return false;
        }
        self.data[(y * self.width + x) * self.channels + c] = value;
        true
    }

    /// Change the shape, reusing the allocation when capacity allows.
    /// Contents are zeroed.
    pub fn reshape(&mut self, width: usize, height: usize, channels: usize) {
        self.width = width;
        self.height = height;
        self.channels = channels;
        self.data.clear();
        self.data.resize(width * height * channels, 0);
    }

    /// Become a copy of `src`, resizing to its shape.
    pub fn copy_from(&mut self, src: &ImageView<'_>) -> Result<(), ImageError> {
        src.validate()?;
        self.width = src.width;
        self.height = src.height;
        self.channels = src.channels;
        self.data.clear();
        self.data.extend_from_slice(src.data);
        Ok(())
    }

    /// Fails unless `self` has exactly the given shape.
    pub(crate) fn require_shape(
        &self,
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<(), ImageError> {
        if self.channels != channels {
            return Err(ImageError::ChannelMismatch {
                expected: channels,
                got: self.channels,
            });
        }
        if self.width != width || self.height != height {
            return Err(ImageError::DimensionMismatch {
                width,
                height,
                got_width: self.width,
                got_height: self.height,
            });
        }
        check_len(width, height, channels, self.data.len())
    }
}

/// Axis-aligned pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

fn check_len(width: usize, height: usize, channels: usize, got: usize) -> Result<(), ImageError> {
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or(ImageError::InvalidDimensions { width, height })?;
    if expected != got {
        return Err(ImageError::SizeMismatch { expected, got });
    }
    Ok(())
}
