//! Marker dictionaries and nearest-code lookup.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::builtins;
use crate::{BitGrid, DictionaryError};

/// Nearest dictionary entry for an observed bit grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Marker id (index into the code list).
    pub id: u32,
    /// Number of quarter turns applied to the observation before it matched.
    pub rotation: u8,
    /// Hamming distance to the stored code.
    pub distance: u32,
}

/// One code of a [`DictionarySpec`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeSpec {
    Number(u64),
    /// Hexadecimal, with or without a `0x` prefix.
    Hex(String),
    /// Big-endian bytes.
    Bytes(Vec<u8>),
}

impl CodeSpec {
    fn value(&self, index: usize) -> Result<u64, DictionaryError> {
        let invalid = |reason: String| DictionaryError::InvalidCode { index, reason };
        match self {
            CodeSpec::Number(v) => Ok(*v),
            CodeSpec::Hex(s) => {
                let digits = s
                    .trim()
                    .trim_start_matches("0x")
                    .trim_start_matches("0X");
                u64::from_str_radix(digits, 16).map_err(|e| invalid(format!("\"{s}\": {e}")))
            }
            CodeSpec::Bytes(bytes) => {
                if bytes.len() > 8 {
                    return Err(invalid(format!("{} bytes exceed 64 bits", bytes.len())));
                }
                Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
            }
        }
    }
}

/// Serializable dictionary description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionarySpec {
    pub name: String,
    pub n_bits: usize,
    /// Match tolerance; the minimum pairwise code distance when absent.
    #[serde(default)]
    pub tau: Option<u32>,
    pub codes: Vec<CodeSpec>,
}

/// Immutable code list with a match tolerance `tau`.
///
/// A lookup succeeds when the nearest code over all four rotations is
/// strictly closer than `tau`.
#[derive(Clone, Debug)]
pub struct Dictionary {
    name: String,
    side: usize,
    tau: u32,
    codes: Cow<'static, [u64]>,
    index: HashMap<u64, u32>,
}

impl Dictionary {
    /// Build from owned codes. `tau = None` computes the minimum pairwise
    /// Hamming distance.
    pub fn new(
        name: impl Into<String>,
        n_bits: usize,
        codes: Vec<u64>,
        tau: Option<u32>,
    ) -> Result<Self, DictionaryError> {
        Self::build(name.into(), n_bits, Cow::Owned(codes), tau)
    }

    /// Build over a `'static` code table without copying it.
    pub fn from_static(
        name: impl Into<String>,
        n_bits: usize,
        codes: &'static [u64],
        tau: Option<u32>,
    ) -> Result<Self, DictionaryError> {
        Self::build(name.into(), n_bits, Cow::Borrowed(codes), tau)
    }

    /// One of the embedded dictionaries (`"ARUCO"`, `"ARUCO_MIP_36h12"`).
    pub fn from_name(name: &str) -> Result<Self, DictionaryError> {
        builtins::builtin_dictionary(name).ok_or_else(|| DictionaryError::UnknownDictionary {
            name: name.to_string(),
        })
    }

    pub fn from_spec(spec: &DictionarySpec) -> Result<Self, DictionaryError> {
        let codes = spec
            .codes
            .iter()
            .enumerate()
            .map(|(i, c)| c.value(i))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(spec.name.clone(), spec.n_bits, codes, spec.tau)
    }

    pub fn to_spec(&self) -> DictionarySpec {
        DictionarySpec {
            name: self.name.clone(),
            n_bits: self.n_bits(),
            tau: Some(self.tau),
            codes: self.codes.iter().map(|&c| CodeSpec::Number(c)).collect(),
        }
    }

    fn build(
        name: String,
        n_bits: usize,
        codes: Cow<'static, [u64]>,
        tau: Option<u32>,
    ) -> Result<Self, DictionaryError> {
        let side = (n_bits as f64).sqrt().round() as usize;
        if n_bits == 0 || n_bits > 64 || side * side != n_bits {
            return Err(DictionaryError::UnsupportedBitCount(n_bits));
        }
        if codes.is_empty() {
            return Err(DictionaryError::Empty);
        }

        let mut index = HashMap::with_capacity(codes.len());
        for (i, &code) in codes.iter().enumerate() {
            if n_bits < 64 && code >> n_bits != 0 {
                return Err(DictionaryError::InvalidCode {
                    index: i,
                    reason: format!("0x{code:x} is wider than {n_bits} bits"),
                });
            }
            index.entry(code).or_insert(i as u32);
        }

        let tau = tau.unwrap_or_else(|| min_pairwise_distance(&codes));
        Ok(Self {
            name,
            side,
            tau,
            codes,
            index,
        })
    }

    /// Same codes, different tolerance.
    pub fn with_tau(mut self, tau: u32) -> Self {
        self.tau = tau;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data bits per side.
    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    pub fn n_bits(&self) -> usize {
        self.side * self.side
    }

    /// Cells per side including the one-cell black border.
    #[inline]
    pub fn mark_size(&self) -> usize {
        self.side + 2
    }

    #[inline]
    pub fn tau(&self) -> u32 {
        self.tau
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    #[inline]
    pub fn codes(&self) -> &[u64] {
        &self.codes
    }

    /// Bit grid of marker `id`.
    pub fn bits(&self, id: usize) -> Result<BitGrid, DictionaryError> {
        self.codes
            .get(id)
            .map(|&c| BitGrid::from_code(self.side, c))
            .ok_or_else(|| self.invalid_id(id))
    }

    /// Nearest code to `observed` over its four rotations, with distance
    /// strictly below [`Self::tau`].
    pub fn find(&self, observed: &BitGrid) -> Option<Match> {
        self.find_within(observed, self.tau)
    }

    /// [`Self::find`] with an explicit tolerance.
    pub fn find_within(&self, observed: &BitGrid, tau: u32) -> Option<Match> {
        if observed.side() != self.side {
            return None;
        }
        let rotations = observed.rotations();

        for (rot, grid) in rotations.iter().enumerate() {
            if let Some(&id) = self.index.get(&grid.code()) {
                if tau > 0 {
                    return Some(Match {
                        id,
                        rotation: rot as u8,
                        distance: 0,
                    });
                }
            }
        }

        let mut best: Option<Match> = None;
        for (rot, grid) in rotations.iter().enumerate() {
            for (id, &code) in self.codes.iter().enumerate() {
                let distance = (grid.code() ^ code).count_ones();
                if distance >= tau {
                    continue;
                }
                if best.is_none_or(|b| distance < b.distance) {
                    best = Some(Match {
                        id: id as u32,
                        rotation: rot as u8,
                        distance,
                    });
                }
            }
        }
        best
    }

    /// Printable SVG of marker `id`, one unit per cell plus a one-unit white
    /// quiet zone.
    pub fn generate_svg(&self, id: usize) -> Result<String, DictionaryError> {
        let bits = self.bits(id)?;
        let s = self.side;
        let mut svg = String::new();
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {0} {0}\">",
            s + 4
        );
        let _ = write!(
            svg,
            "<rect x=\"0\" y=\"0\" width=\"{0}\" height=\"{0}\" fill=\"white\"/>",
            s + 4
        );
        let _ = write!(
            svg,
            "<rect x=\"1\" y=\"1\" width=\"{0}\" height=\"{0}\" fill=\"black\"/>",
            s + 2
        );
        for y in 0..s {
            for x in 0..s {
                if bits.get(y, x) {
                    let _ = write!(
                        svg,
                        "<rect x=\"{}\" y=\"{}\" width=\"1\" height=\"1\" fill=\"white\"/>",
                        x + 2,
                        y + 2
                    );
                }
            }
        }
        svg.push_str("</svg>");
        Ok(svg)
    }

    fn invalid_id(&self, id: usize) -> DictionaryError {
        DictionaryError::InvalidMarkerId {
            id,
            dictionary: self.name.clone(),
            count: self.codes.len(),
        }
    }
}

fn min_pairwise_distance(codes: &[u64]) -> u32 {
    let mut min = u64::BITS;
    for (i, &a) in codes.iter().enumerate() {
        for &b in &codes[i + 1..] {
            min = min.min((a ^ b).count_ones());
        }
    }
    min
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aruco() -> Dictionary {
        Dictionary::from_name("ARUCO").expect("builtin")
    }

    #[test]
    fn exact_code_matches_with_zero_distance() {
        let dict = aruco();
        let bits = dict.bits(123).unwrap();
        let m = dict.find(&bits).expect("match");
        assert_eq!((m.id, m.distance, m.rotation), (123, 0, 0));
    }

    #[test]
    fn one_flipped_bit_still_matches() {
        let dict = Dictionary::from_name("ARUCO_MIP_36h12").unwrap();
        let mut bits = dict.bits(42).unwrap();
        bits.set(2, 3, !bits.get(2, 3));
        let m = dict.find(&bits).expect("match");
        assert_eq!(m.id, 42);
        assert_eq!(m.distance, 1);
        assert!(m.distance < dict.tau());
    }

    #[test]
    fn rotated_observation_reports_rotation() {
        let dict = Dictionary::from_name("ARUCO_MIP_36h12").unwrap();
        let bits = dict.bits(7).unwrap();
        // three quarter turns of the stored code need one more to line up
        let observed = bits.rotations()[3];
        let m = dict.find(&observed).expect("match");
        assert_eq!((m.id, m.rotation, m.distance), (7, 1, 0));
    }

    #[test]
    fn tolerance_bounds_distance_exclusively() {
        let dict = Dictionary::new("tiny", 4, vec![0b0000, 0b1111], Some(2)).unwrap();
        let near = BitGrid::from_code(2, 0b0001);
        assert_eq!(dict.find(&near).map(|m| m.id), Some(0));
        // distance 2 to both codes under every rotation
        let middle = BitGrid::from_code(2, 0b1001);
        assert_eq!(dict.find(&middle), None);
        assert!(dict.find_within(&middle, 3).is_some());
    }

    #[test]
    fn tau_defaults_to_min_pairwise_distance() {
        let dict = Dictionary::new("t", 9, vec![0, 0b111, 0b111_111_111], None).unwrap();
        assert_eq!(dict.tau(), 3);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = Dictionary::from_name("NOPE").unwrap_err();
        assert_eq!(
            err,
            DictionaryError::UnknownDictionary {
                name: "NOPE".into()
            }
        );
        assert!(err.to_string().contains("not recognized"));
    }

    #[test]
    fn invalid_construction_is_rejected() {
        assert_eq!(
            Dictionary::new("x", 10, vec![1], None).unwrap_err(),
            DictionaryError::UnsupportedBitCount(10)
        );
        assert_eq!(
            Dictionary::new("x", 9, vec![], None).unwrap_err(),
            DictionaryError::Empty
        );
        assert!(matches!(
            Dictionary::new("x", 4, vec![0b1_0000], None),
            Err(DictionaryError::InvalidCode { index: 0, .. })
        ));
    }

    #[test]
    fn spec_accepts_numbers_hex_and_bytes() {
        let json = r#"{
            "name": "mixed",
            "n_bits": 16,
            "codes": [4660, "0x5678", "9abc", [222, 240]]
        }"#;
        let spec: DictionarySpec = serde_json::from_str(json).unwrap();
        let dict = Dictionary::from_spec(&spec).unwrap();
        assert_eq!(dict.codes(), &[0x1234, 0x5678, 0x9abc, 0xdef0]);
        assert_eq!(dict.to_spec().codes[3], CodeSpec::Number(0xdef0));
    }

    #[test]
    fn svg_draws_white_cells() {
        let dict = aruco();
        let svg = dict.generate_svg(0).unwrap();
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 9 9\">"));
        assert!(svg.contains("<rect x=\"1\" y=\"1\" width=\"7\" height=\"7\" fill=\"black\"/>"));
        // id 0 has a single white cell at the start of each row
        assert_eq!(svg.matches("width=\"1\" height=\"1\"").count(), 5);
        assert!(svg.contains("<rect x=\"2\" y=\"6\" width=\"1\" height=\"1\" fill=\"white\"/>"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn svg_rejects_out_of_range_id() {
        let err = aruco().generate_svg(1024).unwrap_err();
        assert!(matches!(
            err,
            DictionaryError::InvalidMarkerId {
                id: 1024,
                count: 1024,
                ..
            }
        ));
        assert!(err.to_string().contains("not valid"));
    }
}
