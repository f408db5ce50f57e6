use fiducial_core::{
    adaptive_threshold, find_contours, grayscale, otsu, threshold_in_place, warp, ImageError,
    ImageView, PixelBuffer, WarpError,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::candidates::{clockwise_corners, find_candidates, not_too_near, Candidate};
use super::{DecoderMode, DetectError, DetectorParams};
use crate::decode::{decode_legacy, decode_marker};
use crate::{Dictionary, Marker};

/// Full-frame square marker detector.
///
/// Owns the per-frame scratch buffers, so `detect` takes `&mut self`: one
/// instance serves one frame at a time. Use one detector per thread for
/// concurrent frames.
#[derive(Debug)]
pub struct Detector {
    params: DetectorParams,
    dictionary: Dictionary,
    tau: u32,
    gray: PixelBuffer,
    binary: PixelBuffer,
    contour_scratch: Vec<i32>,
    patch: PixelBuffer,
}

impl Detector {
    /// Create a detector using the embedded dictionary named in `params`.
    pub fn new(params: DetectorParams) -> Result<Self, DetectError> {
        let dictionary = Dictionary::from_name(&params.dictionary)?;
        Self::with_dictionary(params, dictionary)
    }

    /// Create a detector with a caller-built dictionary.
    /// `params.dictionary` is ignored.
    pub fn with_dictionary(
        params: DetectorParams,
        dictionary: Dictionary,
    ) -> Result<Self, DetectError> {
        params.validate()?;
        let tau = params.max_hamming_distance.unwrap_or(dictionary.tau());
        Ok(Self {
            params,
            dictionary,
            tau,
            gray: PixelBuffer::default(),
            binary: PixelBuffer::default(),
            contour_scratch: Vec::new(),
            patch: PixelBuffer::default(),
        })
    }

    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Tolerance in effect: matches need a distance strictly below it.
    #[inline]
    pub fn tau(&self) -> u32 {
        self.tau
    }

    /// Detect markers in interleaved RGBA bytes.
    pub fn detect_image(
        &mut self,
        width: usize,
        height: usize,
        data: &[u8],
    ) -> Result<Vec<Marker>, DetectError> {
        let frame = ImageView::new(width, height, 4, data)?;
        self.detect(&frame)
    }

    /// Detect markers in an RGBA (4-channel) or gray (1-channel) frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(w = frame.width, h = frame.height))
    )]
    pub fn detect(&mut self, frame: &ImageView<'_>) -> Result<Vec<Marker>, DetectError> {
        frame.validate()?;
        match frame.channels {
            4 => {
                self.gray.reshape(frame.width, frame.height, 1);
                grayscale(frame, &mut self.gray)?;
            }
            1 => self.gray.copy_from(frame)?,
            got => return Err(ImageError::ChannelMismatch { expected: 4, got }.into()),
        }

        let p = &self.params;
        self.binary.reshape(frame.width, frame.height, 1);
        adaptive_threshold(
            &self.gray.view(),
            &mut self.binary,
            p.adaptive_radius,
            p.adaptive_bias,
        )?;

        let contours = find_contours(&self.binary.view(), &mut self.contour_scratch)?;
        let min_len = frame.width as f64 * p.min_contour_rel_width as f64;
        let mut candidates =
            find_candidates(&contours, min_len, p.poly_epsilon_rel, p.min_edge_length);
        clockwise_corners(&mut candidates);
        let candidates = not_too_near(candidates, p.min_corner_distance);
        log::debug!(
            "{} contours, {} candidates after dedup",
            contours.len(),
            candidates.len()
        );

        let markers = self.find_markers(&candidates)?;
        log::debug!("decoded {} markers", markers.len());
        Ok(markers)
    }

    /// Warp, binarize and decode each candidate against the gray frame.
    fn find_markers(&mut self, candidates: &[Candidate]) -> Result<Vec<Marker>, DetectError> {
        let mark_size = match self.params.decoder {
            DecoderMode::Dictionary => self.dictionary.mark_size(),
            DecoderMode::Legacy => 7,
        };
        let size = mark_size * self.params.warp_cell_px;

        let mut markers = Vec::new();
        for cand in candidates {
            match warp(&self.gray.view(), &mut self.patch, &cand.corners, size) {
                Ok(()) => {}
                Err(WarpError::DegenerateQuad) => {
                    log::warn!("skipping degenerate candidate {:?}", cand.corners);
                    continue;
                }
                Err(WarpError::Image(e)) => return Err(e.into()),
            }
            let t = otsu(&self.patch.view())?;
            threshold_in_place(&mut self.patch, t);

            let decoded = match self.params.decoder {
                DecoderMode::Dictionary => {
                    decode_marker(&self.patch.view(), &cand.corners, &self.dictionary, self.tau)
                }
                DecoderMode::Legacy => decode_legacy(&self.patch.view(), &cand.corners),
            };
            if let Some(marker) = decoded {
                log::trace!("marker {} (hamming {})", marker.id, marker.hamming);
                markers.push(marker);
            }
        }
        Ok(markers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DictionaryError;

    #[test]
    fn unknown_dictionary_fails_construction() {
        let err = Detector::new(DetectorParams::for_dictionary("DICT_MISSING")).unwrap_err();
        assert_eq!(
            err,
            DetectError::Dictionary(DictionaryError::UnknownDictionary {
                name: "DICT_MISSING".into()
            })
        );
    }

    #[test]
    fn max_hamming_distance_overrides_tau() {
        let mut params = DetectorParams::for_dictionary("ARUCO_MIP_36h12");
        assert_eq!(Detector::new(params.clone()).unwrap().tau(), 12);
        params.max_hamming_distance = Some(4);
        assert_eq!(Detector::new(params).unwrap().tau(), 4);
    }

    #[test]
    fn malformed_frames_fail_fast() {
        let mut det = Detector::new(DetectorParams::default()).unwrap();
        assert_eq!(
            det.detect_image(4, 4, &[0; 63]),
            Err(DetectError::Image(ImageError::SizeMismatch {
                expected: 64,
                got: 63
            }))
        );
        let rgb = ImageView::new(2, 2, 3, &[0; 12]).unwrap();
        assert!(matches!(
            det.detect(&rgb),
            Err(DetectError::Image(ImageError::ChannelMismatch { got: 3, .. }))
        ));
    }

    #[test]
    fn hand_built_frame_with_short_data_fails_fast() {
        let mut det = Detector::new(DetectorParams::default()).unwrap();
        let data = [0u8; 10];
        for channels in [1, 4] {
            let frame = ImageView {
                width: 100,
                height: 100,
                channels,
                data: &data,
            };
            assert_eq!(
                det.detect(&frame),
                Err(DetectError::Image(ImageError::SizeMismatch {
                    expected: 10_000 * channels,
                    got: 10
                }))
            );
        }
    }

    #[test]
    fn absurd_params_fail_construction() {
        let params = DetectorParams {
            adaptive_radius: usize::MAX / 2,
            ..DetectorParams::default()
        };
        assert!(matches!(
            Detector::new(params),
            Err(DetectError::InvalidParams {
                field: "adaptive_radius",
                ..
            })
        ));

        let params = DetectorParams {
            adaptive_bias: i32::MIN,
            ..DetectorParams::default()
        };
        let dict = Dictionary::from_name("ARUCO").unwrap();
        assert!(matches!(
            Detector::with_dictionary(params, dict),
            Err(DetectError::InvalidParams {
                field: "adaptive_bias",
                ..
            })
        ));
    }

    #[test]
    fn blank_frame_has_no_markers() {
        let mut det = Detector::new(DetectorParams::default()).unwrap();
        let frame = vec![255u8; 64 * 48 * 4];
        assert!(det.detect_image(64, 48, &frame).unwrap().is_empty());
    }
}
