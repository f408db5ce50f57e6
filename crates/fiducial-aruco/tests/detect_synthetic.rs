use fiducial_aruco::{BitGrid, DecoderMode, Detector, DetectorParams, Dictionary, Marker};
use fiducial_core::{to_grayscale, PixelBuffer};
use nalgebra::Point2;

/// A marker drawn into a synthetic frame.
struct Placement {
    bits: BitGrid,
    cx: f64,
    cy: f64,
    cell: f64,
    angle_deg: f64,
}

impl Placement {
    fn half(&self) -> f64 {
        (self.bits.side() + 2) as f64 * self.cell / 2.0
    }

    /// Image position of marker-plane point `(u, v)`.
    fn to_image(&self, u: f64, v: f64) -> Point2<f32> {
        let (sa, ca) = self.angle_deg.to_radians().sin_cos();
        let (du, dv) = (u - self.half(), v - self.half());
        Point2::new(
            (self.cx + ca * du - sa * dv) as f32,
            (self.cy + sa * du + ca * dv) as f32,
        )
    }

    /// Outer corners, clockwise from the marker's top-left.
    fn corners(&self) -> [Point2<f32>; 4] {
        let s = 2.0 * self.half();
        [
            self.to_image(0.0, 0.0),
            self.to_image(s, 0.0),
            self.to_image(s, s),
            self.to_image(0.0, s),
        ]
    }
}

/// White RGBA frame with each marker painted by inverse mapping pixel centres.
fn render(width: usize, height: usize, markers: &[Placement]) -> Vec<u8> {
    let mut gray = vec![255u8; width * height];
    for m in markers {
        let mark = m.bits.side() + 2;
        let extent = mark as f64 * m.cell;
        let (sa, ca) = m.angle_deg.to_radians().sin_cos();
        for y in 0..height {
            for x in 0..width {
                let dx = x as f64 + 0.5 - m.cx;
                let dy = y as f64 + 0.5 - m.cy;
                let u = ca * dx + sa * dy + m.half();
                let v = -sa * dx + ca * dy + m.half();
                if !(0.0..extent).contains(&u) || !(0.0..extent).contains(&v) {
                    continue;
                }
                let i = (v / m.cell).floor() as usize;
                let j = (u / m.cell).floor() as usize;
                let inner = (1..mark - 1).contains(&i) && (1..mark - 1).contains(&j);
                let white = inner && m.bits.get(i - 1, j - 1);
                gray[y * width + x] = if white { 255 } else { 0 };
            }
        }
    }
    gray.iter().flat_map(|&g| [g, g, g, 255]).collect()
}

/// Traced outlines sit a couple of pixels inside the printed edge.
fn assert_corners_near(found: &[Point2<f32>; 4], expected: &[Point2<f32>; 4], tol: f32) {
    for (f, e) in found.iter().zip(expected) {
        let d = ((f.x - e.x).powi(2) + (f.y - e.y).powi(2)).sqrt();
        assert!(d < tol, "corner {f:?} is {d:.2}px from {e:?}");
    }
}

fn single(markers: Vec<Marker>) -> Marker {
    assert_eq!(markers.len(), 1, "{markers:?}");
    markers.into_iter().next().expect("one marker")
}

fn aruco_bits(id: usize) -> BitGrid {
    Dictionary::from_name("ARUCO").unwrap().bits(id).unwrap()
}

#[test]
fn detects_upright_aruco_marker() {
    let place = Placement {
        bits: aruco_bits(300),
        cx: 160.0,
        cy: 120.0,
        cell: 20.0,
        angle_deg: 0.0,
    };
    let frame = render(320, 240, std::slice::from_ref(&place));

    let mut det = Detector::new(DetectorParams::default()).unwrap();
    let m = single(det.detect_image(320, 240, &frame).unwrap());
    assert_eq!(m.id, 300);
    assert_eq!(m.hamming, 0);
    assert_corners_near(&m.corners, &place.corners(), 6.0);
}

#[test]
fn corner_order_follows_marker_orientation() {
    // the same marker turned a quarter clockwise on the page
    let place = Placement {
        bits: aruco_bits(300).rotate(),
        cx: 160.0,
        cy: 120.0,
        cell: 20.0,
        angle_deg: 0.0,
    };
    let frame = render(320, 240, std::slice::from_ref(&place));

    let mut det = Detector::new(DetectorParams::default()).unwrap();
    let m = single(det.detect_image(320, 240, &frame).unwrap());
    assert_eq!(m.id, 300);
    let c = place.corners();
    assert_corners_near(&m.corners, &[c[1], c[2], c[3], c[0]], 6.0);
}

#[test]
fn detects_tilted_36h12_marker() {
    let dict = Dictionary::from_name("ARUCO_MIP_36h12").unwrap();
    let place = Placement {
        bits: dict.bits(42).unwrap(),
        cx: 160.0,
        cy: 120.0,
        cell: 16.0,
        angle_deg: 25.0,
    };
    let frame = render(320, 240, std::slice::from_ref(&place));

    let mut det = Detector::new(DetectorParams::for_dictionary("ARUCO_MIP_36h12")).unwrap();
    let m = single(det.detect_image(320, 240, &frame).unwrap());
    assert_eq!(m.id, 42);
    assert_corners_near(&m.corners, &place.corners(), 6.0);
}

#[test]
fn detects_every_marker_in_frame() {
    let places = [
        Placement {
            bits: aruco_bits(5),
            cx: 100.0,
            cy: 100.0,
            cell: 12.0,
            angle_deg: 0.0,
        },
        Placement {
            bits: aruco_bits(1000),
            cx: 300.0,
            cy: 100.0,
            cell: 12.0,
            angle_deg: -10.0,
        },
    ];
    let frame = render(400, 200, &places);

    let mut det = Detector::new(DetectorParams::default()).unwrap();
    let mut found = det.detect_image(400, 200, &frame).unwrap();
    found.sort_by_key(|m| m.id);
    assert_eq!(found.iter().map(|m| m.id).collect::<Vec<_>>(), vec![5, 1000]);
    assert_corners_near(&found[0].corners, &places[0].corners(), 6.0);
    assert_corners_near(&found[1].corners, &places[1].corners(), 6.0);

    // scratch buffers are reused; a second pass gives the same answer
    let mut again = det.detect_image(400, 200, &frame).unwrap();
    again.sort_by_key(|m| m.id);
    assert_eq!(again, found);
}

#[test]
fn upside_down_marker_starts_at_its_own_top_left() {
    let place = Placement {
        bits: aruco_bits(5),
        cx: 100.0,
        cy: 100.0,
        cell: 12.0,
        angle_deg: 180.0,
    };
    let frame = render(400, 200, std::slice::from_ref(&place));

    let mut det = Detector::new(DetectorParams::default()).unwrap();
    let m = single(det.detect_image(400, 200, &frame).unwrap());
    assert_eq!(m.id, 5);
    assert_corners_near(&m.corners, &place.corners(), 6.0);
}

#[test]
fn legacy_decoder_reads_aruco_ids() {
    let place = Placement {
        bits: aruco_bits(517),
        cx: 160.0,
        cy: 120.0,
        cell: 20.0,
        angle_deg: 0.0,
    };
    let frame = render(320, 240, std::slice::from_ref(&place));

    let mut det = Detector::new(DetectorParams::legacy()).unwrap();
    assert_eq!(det.params().decoder, DecoderMode::Legacy);
    let m = single(det.detect_image(320, 240, &frame).unwrap());
    assert_eq!(m.id, 517);
    assert_corners_near(&m.corners, &place.corners(), 6.0);
}

#[test]
fn gray_and_rgba_frames_agree() {
    let place = Placement {
        bits: aruco_bits(77),
        cx: 160.0,
        cy: 120.0,
        cell: 20.0,
        angle_deg: 0.0,
    };
    let rgba = PixelBuffer::from_vec(320, 240, 4, render(320, 240, &[place])).unwrap();
    let gray = to_grayscale(&rgba.view()).unwrap();

    let mut det = Detector::new(DetectorParams::default()).unwrap();
    let from_rgba = det.detect(&rgba.view()).unwrap();
    let from_gray = det.detect(&gray.view()).unwrap();
    assert_eq!(from_rgba.len(), 1);
    assert_eq!(from_rgba, from_gray);
}
