//! Per-pixel operations: grayscale conversion, global and adaptive
//! binarization, Otsu's threshold, separable Gaussian blur and masked
//! pixel counting.
//!
//! Every operation writes into a caller-supplied destination whose shape is
//! checked up front, so the per-pixel loops never allocate.

use crate::{stack_box_blur, ImageError, ImageView, PixelBuffer, Rect};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Convert interleaved RGBA to one luma byte per pixel.
///
/// `dst` must already be `width x height x 1`.
pub fn grayscale(src: &ImageView<'_>, dst: &mut PixelBuffer) -> Result<(), ImageError> {
    src.require_channels(4)?;
    dst.require_shape(src.width, src.height, 1)?;

    for (out, px) in dst.data.iter_mut().zip(src.data.chunks_exact(4)) {
        let v = px[0] as f32 * 0.299 + px[1] as f32 * 0.587 + px[2] as f32 * 0.114 + 0.5;
        *out = v as u8;
    }
    Ok(())
}

/// Allocating form of [`grayscale`].
pub fn to_grayscale(src: &ImageView<'_>) -> Result<PixelBuffer, ImageError> {
    let mut dst = PixelBuffer::gray(src.width, src.height);
    grayscale(src, &mut dst)?;
    Ok(dst)
}

#[inline]
fn threshold_table(t: u8) -> [u8; 256] {
    let mut tab = [0u8; 256];
    for (v, slot) in tab.iter_mut().enumerate() {
        *slot = if v <= t as usize { 0 } else { 255 };
    }
    tab
}

/// Binarize: `0` where `v <= t`, `255` elsewhere.
pub fn threshold(src: &ImageView<'_>, dst: &mut PixelBuffer, t: u8) -> Result<(), ImageError> {
    src.require_channels(1)?;
    dst.require_shape(src.width, src.height, 1)?;

    let tab = threshold_table(t);
    for (out, &v) in dst.data.iter_mut().zip(src.data) {
        *out = tab[v as usize];
    }
    Ok(())
}

/// [`threshold`] applied to `buf` itself.
pub fn threshold_in_place(buf: &mut PixelBuffer, t: u8) {
    let tab = threshold_table(t);
    for v in buf.data.iter_mut() {
        *v = tab[*v as usize];
    }
}

/// Otsu's threshold over every sample of `src`.
///
/// When several consecutive levels separate the classes equally well (empty
/// bins between two modes) the middle of that run is returned.
pub fn otsu(src: &ImageView<'_>) -> Result<u8, ImageError> {
    src.require_channels(1)?;
    let mut hist = [0u32; 256];
    for &v in src.data {
        hist[v as usize] += 1;
    }

    let total = src.data.len() as f64;
    let sum: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0.0f64;
    let mut w_b = 0.0f64;
    let mut best = 0.0f64;
    let mut first = 0usize;
    let mut last = 0usize;

    for (i, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b == 0.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0.0 {
            break;
        }
        sum_b += i as f64 * h as f64;
        let mu = sum_b / w_b - (sum - sum_b) / w_f;
        let between = w_b * w_f * mu * mu;
        if between > best {
            best = between;
            first = i;
            last = i;
        } else if between == best && best > 0.0 && last + 1 == i {
            last = i;
        }
    }

    Ok(((first + last) / 2) as u8)
}

/// Local-mean binarization.
///
/// `dst` first receives the box-blurred mean of `src`, then each pixel becomes
/// `255` where `src - mean <= -bias` (darker than its neighbourhood) and `0`
/// elsewhere.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src, dst), fields(w = src.width, h = src.height))
)]
pub fn adaptive_threshold(
    src: &ImageView<'_>,
    dst: &mut PixelBuffer,
    radius: usize,
    bias: i32,
) -> Result<(), ImageError> {
    stack_box_blur(src, dst, radius)?;

    let mut tab = [0u8; 511];
    for (i, slot) in tab.iter_mut().enumerate() {
        *slot = if i as i64 - 255 <= -i64::from(bias) { 255 } else { 0 };
    }

    for (out, &s) in dst.data.iter_mut().zip(src.data) {
        *out = tab[(s as usize + 255) - *out as usize];
    }
    Ok(())
}

/// Normalized symmetric 1-D Gaussian kernel of odd length `size`.
pub fn gaussian_kernel(size: usize) -> Result<Vec<f64>, ImageError> {
    if size % 2 == 0 {
        return Err(ImageError::InvalidKernelSize(size));
    }

    let kernel = match size {
        1 => vec![1.0],
        3 => vec![0.25, 0.5, 0.25],
        5 => vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => vec![
            0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
        ],
        _ => {
            let center = (size - 1) as f64 * 0.5;
            let sigma = 0.8 + 0.3 * (center - 1.0);
            let scale = -0.5 / (sigma * sigma);
            let mut k: Vec<f64> = (0..size)
                .map(|i| {
                    let x = i as f64 - center;
                    (scale * x * x).exp()
                })
                .collect();
            let norm = 1.0 / k.iter().sum::<f64>();
            k.iter_mut().for_each(|v| *v *= norm);
            k
        }
    };
    Ok(kernel)
}

/// Separable Gaussian blur.
///
/// The horizontal pass keeps full precision in `tmp` (resized to the image);
/// the vertical pass rounds into `dst`. Taps falling outside the image read
/// the centre pixel.
pub fn gaussian_blur(
    src: &ImageView<'_>,
    dst: &mut PixelBuffer,
    tmp: &mut Vec<f32>,
    kernel_size: usize,
) -> Result<(), ImageError> {
    src.require_channels(1)?;
    dst.require_shape(src.width, src.height, 1)?;
    let kernel = gaussian_kernel(kernel_size)?;

    let (w, h) = (src.width as isize, src.height as isize);
    let limit = (kernel.len() / 2) as isize;
    tmp.clear();
    tmp.resize(src.data.len(), 0.0);

    for y in 0..h {
        for x in 0..w {
            let pos = (y * w + x) as usize;
            let mut value = 0.0f64;
            for k in -limit..=limit {
                let cur = if (0..w).contains(&(x + k)) {
                    (pos as isize + k) as usize
                } else {
                    pos
                };
                value += kernel[(limit + k) as usize] * src.data[cur] as f64;
            }
            tmp[pos] = value as f32;
        }
    }

    for y in 0..h {
        for x in 0..w {
            let pos = (y * w + x) as usize;
            let mut value = 0.0f64;
            for k in -limit..=limit {
                let cur = if (0..h).contains(&(y + k)) {
                    (pos as isize + k * w) as usize
                } else {
                    pos
                };
                value += kernel[(limit + k) as usize] * tmp[cur] as f64;
            }
            dst.data[pos] = (value + 0.5) as u8;
        }
    }
    Ok(())
}

/// Number of non-zero samples of a single-channel image inside `rect`.
/// The rectangle is clipped to the image.
pub fn count_non_zero(src: &ImageView<'_>, rect: Rect) -> Result<usize, ImageError> {
    src.require_channels(1)?;
    let x0 = rect.x.min(src.width);
    let y0 = rect.y.min(src.height);
    let x1 = rect.x.saturating_add(rect.width).min(src.width);
    let y1 = rect.y.saturating_add(rect.height).min(src.height);

    Ok((y0..y1)
        .map(|y| {
            let row = &src.data[y * src.width + x0..y * src.width + x1];
            row.iter().filter(|&&v| v != 0).count()
        })
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gray(width: usize, height: usize, data: Vec<u8>) -> PixelBuffer {
        PixelBuffer::from_vec(width, height, 1, data).unwrap()
    }

    #[test]
    fn grayscale_weights_channels() {
        let rgba = PixelBuffer::from_vec(2, 1, 4, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
        let out = to_grayscale(&rgba.view()).unwrap();
        assert_eq!(out.data, vec![76, 29]);
    }

    #[test]
    fn grayscale_output_is_quarter_length() {
        let data: Vec<u8> = (0..4 * 6 * 5).map(|i| (i * 37 % 256) as u8).collect();
        let rgba = PixelBuffer::from_vec(6, 5, 4, data.clone()).unwrap();
        let out = to_grayscale(&rgba.view()).unwrap();
        assert_eq!(out.len(), data.len() / 4);
        for (g, px) in out.data.iter().zip(data.chunks_exact(4)) {
            let exact = 0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64;
            assert!((*g as f64 - exact).abs() <= 1.0);
        }
    }

    #[test]
    fn grayscale_rejects_wrong_destination() {
        let rgba = PixelBuffer::new(3, 3, 4);
        let mut dst = PixelBuffer::gray(3, 2);
        assert!(matches!(
            grayscale(&rgba.view(), &mut dst),
            Err(ImageError::DimensionMismatch { .. })
        ));

        let mut dst = PixelBuffer::gray(3, 3);
        dst.data.pop();
        assert_eq!(
            grayscale(&rgba.view(), &mut dst),
            Err(ImageError::SizeMismatch {
                expected: 9,
                got: 8
            })
        );
    }

    #[test]
    fn threshold_is_inclusive_below() {
        let src = gray(3, 1, vec![10, 100, 200]);
        let mut dst = PixelBuffer::gray(3, 1);
        threshold(&src.view(), &mut dst, 100).unwrap();
        assert_eq!(dst.data, vec![0, 0, 255]);
    }

    #[test]
    fn threshold_output_is_binary_for_every_level() {
        let src = gray(256, 1, (0..=255).collect());
        let mut dst = PixelBuffer::gray(256, 1);
        for t in [0u8, 1, 127, 254, 255] {
            threshold(&src.view(), &mut dst, t).unwrap();
            for (v, out) in src.data.iter().zip(&dst.data) {
                assert_eq!(*out == 0, *v <= t);
                assert!(*out == 0 || *out == 255);
            }
        }
    }

    #[test]
    fn otsu_separates_two_modes() {
        let mut data = vec![30u8; 50];
        data.extend(std::iter::repeat_n(200u8, 50));
        let t = otsu(&gray(100, 1, data).view()).unwrap();
        assert!(t > 30 && t < 200, "threshold {t}");
    }

    #[test]
    fn otsu_of_constant_image_is_zero() {
        assert_eq!(otsu(&gray(4, 4, vec![90; 16]).view()), Ok(0));
    }

    #[test]
    fn adaptive_threshold_marks_dark_detail() {
        let mut data = vec![200u8; 15 * 15];
        data[7 * 15 + 7] = 20;
        let src = gray(15, 15, data);
        let mut dst = PixelBuffer::gray(15, 15);
        adaptive_threshold(&src.view(), &mut dst, 2, 7).unwrap();
        assert_eq!(dst.data[7 * 15 + 7], 255);
        assert_eq!(dst.data[0], 0);
        assert_eq!(dst.data.iter().filter(|&&v| v == 255).count(), 1);
    }

    #[test]
    fn gaussian_kernels_sum_to_one() {
        for size in [1, 3, 5, 7, 9, 15] {
            let k = gaussian_kernel(size).unwrap();
            assert_eq!(k.len(), size);
            assert_relative_eq!(k.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(k[0], k[size - 1]);
        }
        assert_eq!(gaussian_kernel(4), Err(ImageError::InvalidKernelSize(4)));
    }

    #[test]
    fn gaussian_blur_preserves_constant_image() {
        let src = gray(9, 7, vec![123; 63]);
        let mut dst = PixelBuffer::gray(9, 7);
        let mut tmp = Vec::new();
        gaussian_blur(&src.view(), &mut dst, &mut tmp, 5).unwrap();
        assert!(dst.data.iter().all(|&v| v == 123));
    }

    #[test]
    fn gaussian_blur_keeps_first_pass_fractional() {
        // [0.25, 0.5, 0.25] twice over a single 10: the horizontal pass gives
        // 2.5 / 5 / 2.5, which would round differently if it were quantized.
        let mut data = vec![0u8; 9];
        data[4] = 10;
        let src = gray(3, 3, data);
        let mut dst = PixelBuffer::gray(3, 3);
        let mut tmp = Vec::new();
        gaussian_blur(&src.view(), &mut dst, &mut tmp, 3).unwrap();
        assert_eq!(dst.data, vec![1, 1, 1, 1, 3, 1, 1, 1, 1]);
        assert_eq!(tmp, vec![0.0, 0.0, 0.0, 2.5, 5.0, 2.5, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn gaussian_blur_reads_centre_for_outside_taps() {
        // x = 1: the tap at x = -1 reads x = 1 (0), not the clamped x = 0.
        let src = gray(5, 1, vec![200, 0, 0, 0, 0]);
        let mut dst = PixelBuffer::gray(5, 1);
        let mut tmp = Vec::new();
        gaussian_blur(&src.view(), &mut dst, &mut tmp, 5).unwrap();
        assert_eq!(tmp, vec![137.5, 50.0, 12.5, 0.0, 0.0]);
        assert_eq!(dst.data, vec![138, 50, 13, 0, 0]);
    }

    #[test]
    fn computed_kernel_follows_sigma_rule() {
        let k = gaussian_kernel(9).unwrap();
        let center = 4.0f64;
        let sigma = 0.8 + 0.3 * (center - 1.0);
        for d in 1..=4usize {
            let expected = (-((d * d) as f64) / (2.0 * sigma * sigma)).exp();
            assert_relative_eq!(k[4 + d] / k[4], expected, epsilon = 1e-12);
            assert_relative_eq!(k[4 - d] / k[4], expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn adaptive_threshold_handles_extreme_bias() {
        let src = gray(5, 5, (0..25).map(|i| (i * 10) as u8).collect());
        let mut dst = PixelBuffer::gray(5, 5);
        adaptive_threshold(&src.view(), &mut dst, 1, i32::MIN).unwrap();
        assert!(dst.data.iter().all(|&v| v == 255));
        adaptive_threshold(&src.view(), &mut dst, 1, i32::MAX).unwrap();
        assert!(dst.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn short_source_views_are_rejected() {
        let data = [0u8; 10];
        let src = ImageView {
            width: 100,
            height: 100,
            channels: 1,
            data: &data,
        };
        let short = ImageError::SizeMismatch {
            expected: 10_000,
            got: 10,
        };
        assert_eq!(otsu(&src), Err(short.clone()));
        assert_eq!(count_non_zero(&src, Rect::new(0, 0, 50, 50)), Err(short.clone()));
        let mut dst = PixelBuffer::gray(100, 100);
        assert_eq!(threshold(&src, &mut dst, 10), Err(short.clone()));
        assert_eq!(adaptive_threshold(&src, &mut dst, 2, 7), Err(short));
    }

    #[test]
    fn count_non_zero_clips_rect() {
        let mut src = PixelBuffer::gray(4, 4);
        src.set_pixel(3, 3, 0, 1);
        src.set_pixel(0, 0, 0, 1);
        assert_eq!(count_non_zero(&src.view(), Rect::new(2, 2, 10, 10)), Ok(1));
        assert_eq!(count_non_zero(&src.view(), Rect::new(0, 0, 4, 4)), Ok(2));
    }
}
