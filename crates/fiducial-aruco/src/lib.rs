//! Square fiducial markers: dictionaries, decoding and detection.
//!
//! - [`Dictionary`]: immutable code lists (embedded `ARUCO` and
//!   `ARUCO_MIP_36h12`, or custom ones from a [`DictionarySpec`]) with
//!   rotation-aware nearest-code lookup and SVG rendering,
//! - [`sample_bits`] / [`decode_marker`] / [`decode_legacy`]: bits from a
//!   rectified patch,
//! - [`Detector`]: the per-frame pipeline from RGBA bytes to [`Marker`]s.
//!
//! ```no_run
//! use fiducial_aruco::{Detector, DetectorParams};
//!
//! # fn frame() -> (usize, usize, Vec<u8>) { (640, 480, vec![0; 640 * 480 * 4]) }
//! let mut detector = Detector::new(DetectorParams::default())?;
//! let (w, h, rgba) = frame();
//! for m in detector.detect_image(w, h, &rgba)? {
//!     println!("marker {} at {:?}", m.id, m.corners);
//! }
//! # Ok::<(), fiducial_aruco::DetectError>(())
//! ```

mod bits;
pub mod builtins;
mod decode;
mod detector;
mod dictionary;
mod error;
mod io;

pub use bits::BitGrid;
pub use decode::{
    decode_legacy, decode_marker, legacy_hamming_distance, mat2id, rotate_corners, sample_bits,
    Marker, LEGACY_ROWS,
};
pub use detector::{
    clockwise_corners, find_candidates, not_too_near, Candidate, DecoderMode, DetectError,
    Detector, DetectorParams, MAX_WARP_CELL_PX,
};
pub use dictionary::{CodeSpec, Dictionary, DictionarySpec, Match};
pub use error::DictionaryError;
pub use io::{load_dictionary, DetectorIoError};
