use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use fiducial_core::{
    adaptive_threshold, find_contours, grayscale, stack_box_blur, ImageView, PixelBuffer,
};

const W: usize = 640;
const H: usize = 480;

/// VGA frame with a grid of dark squares on a light gradient.
fn frame_rgba() -> PixelBuffer {
    let mut img = PixelBuffer::new(W, H, 4);
    for y in 0..H {
        for x in 0..W {
            let dark = (x / 40) % 3 == 1 && (y / 40) % 3 == 1;
            let v = if dark { 25 } else { 150 + ((x + y) % 100) as u8 };
            for c in 0..3 {
                img.set_pixel(x, y, c, v);
            }
            img.set_pixel(x, y, 3, 255);
        }
    }
    img
}

fn bench_pixel_ops(c: &mut Criterion) {
    let rgba = frame_rgba();
    let mut gray = PixelBuffer::gray(W, H);
    let mut bin = PixelBuffer::gray(W, H);
    let mut scratch = Vec::new();

    c.bench_function("grayscale_vga", |b| {
        b.iter(|| grayscale(black_box(&rgba.view()), &mut gray))
    });

    let _ = grayscale(&rgba.view(), &mut gray);
    c.bench_function("stack_box_blur_r2_vga", |b| {
        b.iter(|| stack_box_blur(black_box(&gray.view()), &mut bin, 2))
    });
    c.bench_function("adaptive_threshold_vga", |b| {
        b.iter(|| adaptive_threshold(black_box(&gray.view()), &mut bin, 2, 7))
    });

    let _ = adaptive_threshold(&gray.view(), &mut bin, 2, 7);
    let view = ImageView::gray(W, H, &bin.data).expect("vga view");
    c.bench_function("find_contours_vga", |b| {
        b.iter(|| find_contours(black_box(&view), &mut scratch))
    });
}

criterion_group!(pixel_ops, bench_pixel_ops);
criterion_main!(pixel_ops);
