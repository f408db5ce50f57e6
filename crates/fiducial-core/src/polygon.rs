//! Closed-polygon utilities: Douglas-Peucker simplification, convexity,
//! perimeter and shortest edge.

use nalgebra::Point2;

#[derive(Clone, Copy, Debug)]
struct Slice {
    start: usize,
    end: usize,
}

/// Simplify a closed curve so no dropped point deviates more than `epsilon`
/// from the chord that replaces it.
///
/// Iterative: pending chords live on an explicit stack. The initial split pair
/// is found by three rounds of "farthest point from the current anchor".
pub fn approx_poly_dp(contour: &[Point2<f32>], epsilon: f64) -> Vec<Point2<f32>> {
    let len = contour.len();
    if len == 0 {
        return Vec::new();
    }
    let eps2 = epsilon * epsilon;
    let pt = |i: usize| {
        let p = contour[i % len];
        (p.x as f64, p.y as f64)
    };

    let mut poly = Vec::new();
    let mut stack: Vec<Slice> = Vec::new();

    let mut far = 0usize;
    let mut k = 0usize;
    let mut max_dist = 0.0f64;
    let mut anchor = 0usize;
    for _ in 0..3 {
        max_dist = 0.0;
        k = (k + far) % len;
        anchor = k;
        let (sx, sy) = pt(anchor);
        for j in 1..len {
            let (x, y) = pt(anchor + j);
            let d = (x - sx) * (x - sx) + (y - sy) * (y - sy);
            if d > max_dist {
                max_dist = d;
                far = j;
            }
        }
    }

    if max_dist <= eps2 {
        poly.push(contour[anchor]);
        return poly;
    }

    let first = Slice {
        start: anchor,
        end: anchor + far,
    };
    let right_start = first.end % len;
    let mut right_end = anchor;
    if right_end < right_start {
        right_end += len;
    }
    stack.push(Slice {
        start: right_start,
        end: right_end,
    });
    stack.push(first);

    while let Some(slice) = stack.pop() {
        let (sx, sy) = pt(slice.start);
        let mut split = slice.start;
        let accept = if slice.end <= slice.start + 1 {
            true
        } else {
            let (ex, ey) = pt(slice.end);
            let (dx, dy) = (ex - sx, ey - sy);
            let mut max_dev = 0.0f64;
            for i in slice.start + 1..slice.end {
                let (x, y) = pt(i);
                let dev = ((y - sy) * dx - (x - sx) * dy).abs();
                if dev > max_dev {
                    max_dev = dev;
                    split = i;
                }
            }
            max_dev * max_dev <= eps2 * (dx * dx + dy * dy)
        };

        if accept {
            poly.push(contour[slice.start % len]);
        } else {
            stack.push(Slice {
                start: split,
                end: slice.end,
            });
            stack.push(Slice {
                start: slice.start,
                end: split,
            });
        }
    }

    poly
}

/// `true` when every turn has the same orientation. Collinear consecutive
/// edges count as non-convex.
pub fn is_contour_convex(poly: &[Point2<f32>]) -> bool {
    let len = poly.len();
    if len < 3 {
        return false;
    }

    let mut orientation = 0u8;
    let mut prev = poly[len - 1];
    let mut cur = poly[0];
    let mut d0 = (cur.x - prev.x, cur.y - prev.y);
    for i in 0..len {
        prev = cur;
        cur = poly[(i + 1) % len];
        let d = (cur.x - prev.x, cur.y - prev.y);
        let dxdy0 = d.0 * d0.1;
        let dydx0 = d.1 * d0.0;
        orientation |= if dydx0 > dxdy0 {
            1
        } else if dydx0 < dxdy0 {
            2
        } else {
            3
        };
        if orientation == 3 {
            return false;
        }
        d0 = d;
    }
    true
}

/// Sum of edge lengths, closing edge included.
pub fn perimeter(poly: &[Point2<f32>]) -> f64 {
    edges(poly).map(f64::sqrt).sum()
}

/// Length of the shortest edge, closing edge included. Infinite when empty.
pub fn min_edge_length(poly: &[Point2<f32>]) -> f64 {
    edges(poly).fold(f64::INFINITY, f64::min).sqrt()
}

/// Squared edge lengths, starting with the closing edge.
fn edges(poly: &[Point2<f32>]) -> impl Iterator<Item = f64> + '_ {
    let len = poly.len();
    (0..len).map(move |i| {
        let a = poly[(i + len - 1) % len];
        let b = poly[i];
        let dx = (b.x - a.x) as f64;
        let dy = (b.y - a.y) as f64;
        dx * dx + dy * dy
    })
}
