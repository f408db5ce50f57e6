use fiducial_core::MAX_BLUR_RADIUS;
use serde::{Deserialize, Serialize};

use super::DetectError;

/// Upper bound on [`DetectorParams::warp_cell_px`].
pub const MAX_WARP_CELL_PX: usize = 64;

/// How warped candidates are turned into ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecoderMode {
    /// Nearest code of the configured dictionary within its tolerance.
    #[default]
    Dictionary,
    /// Fixed 5x5 row-pattern scheme; exact matches only, id from `mat2id`.
    Legacy,
}

/// Configuration for [`super::Detector`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Name of an embedded dictionary.
    pub dictionary: String,
    /// Overrides the dictionary's tolerance: a match needs a Hamming distance
    /// strictly below this value.
    pub max_hamming_distance: Option<u32>,
    pub decoder: DecoderMode,
    /// Box-blur radius of the local mean.
    pub adaptive_radius: usize,
    /// How much darker than its local mean a pixel must be to count as ink.
    pub adaptive_bias: i32,
    /// Shortest contour kept, as a fraction of the frame width.
    pub min_contour_rel_width: f32,
    /// Polygon simplification tolerance, as a fraction of contour length.
    pub poly_epsilon_rel: f64,
    /// Shortest accepted quad edge in pixels.
    pub min_edge_length: f64,
    /// Quads whose corners are closer than this (RMS, pixels) are duplicates.
    pub min_corner_distance: f64,
    /// Pixels per marker cell in the rectified patch.
    pub warp_cell_px: usize,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            dictionary: "ARUCO".to_string(),
            max_hamming_distance: None,
            decoder: DecoderMode::Dictionary,
            adaptive_radius: 2,
            adaptive_bias: 7,
            min_contour_rel_width: 0.20,
            poly_epsilon_rel: 0.05,
            min_edge_length: 10.0,
            min_corner_distance: 10.0,
            warp_cell_px: 7,
        }
    }
}

impl DetectorParams {
    /// Defaults for the named dictionary.
    pub fn for_dictionary(name: impl Into<String>) -> Self {
        Self {
            dictionary: name.into(),
            ..Self::default()
        }
    }

    /// Defaults for the fixed legacy scheme.
    pub fn legacy() -> Self {
        Self {
            decoder: DecoderMode::Legacy,
            ..Self::default()
        }
    }

    /// Reject values the pipeline cannot run with, e.g. from a hand-edited
    /// JSON file.
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.adaptive_radius > MAX_BLUR_RADIUS {
            return Err(invalid(
                "adaptive_radius",
                format!("{} exceeds {MAX_BLUR_RADIUS}", self.adaptive_radius),
            ));
        }
        if !(-255..=255).contains(&self.adaptive_bias) {
            return Err(invalid(
                "adaptive_bias",
                format!("{} is outside -255..=255", self.adaptive_bias),
            ));
        }
        if !(1..=MAX_WARP_CELL_PX).contains(&self.warp_cell_px) {
            return Err(invalid(
                "warp_cell_px",
                format!("{} is outside 1..={MAX_WARP_CELL_PX}", self.warp_cell_px),
            ));
        }
        let lengths = [
            ("min_contour_rel_width", self.min_contour_rel_width as f64),
            ("poly_epsilon_rel", self.poly_epsilon_rel),
            ("min_edge_length", self.min_edge_length),
            ("min_corner_distance", self.min_corner_distance),
        ];
        for (field, v) in lengths {
            if !(v.is_finite() && v >= 0.0) {
                return Err(invalid(field, format!("{v} is not a finite non-negative number")));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> DetectError {
    DetectError::InvalidParams { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(DetectorParams::default().validate(), Ok(()));
        assert_eq!(DetectorParams::legacy().validate(), Ok(()));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cases: [(&str, fn(&mut DetectorParams)); 5] = [
            ("adaptive_radius", |p| p.adaptive_radius = usize::MAX),
            ("adaptive_bias", |p| p.adaptive_bias = i32::MIN),
            ("warp_cell_px", |p| p.warp_cell_px = 0),
            ("min_edge_length", |p| p.min_edge_length = f64::NAN),
            ("min_contour_rel_width", |p| p.min_contour_rel_width = -0.5),
        ];
        for (field, set) in cases {
            let mut p = DetectorParams::default();
            set(&mut p);
            assert!(
                matches!(p.validate(), Err(DetectError::InvalidParams { field: f, .. }) if f == field),
                "{field}: {:?}",
                p.validate()
            );
        }
    }
}
