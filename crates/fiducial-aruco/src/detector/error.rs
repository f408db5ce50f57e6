use fiducial_core::ImageError;

use crate::DictionaryError;

/// Errors returned by the marker detector.
///
/// Candidates that fail to decode are not errors; they are dropped.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("invalid detector parameter `{field}`: {reason}")]
    InvalidParams { field: &'static str, reason: String },
}
