use thiserror::Error;

/// Failures of the pixel-level operations.
///
/// These are raised before any byte of the destination is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("buffer holds {got} bytes, expected {expected}")]
    SizeMismatch { expected: usize, got: usize },
    #[error("destination is {got_width}x{got_height}, expected {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
    },
    #[error("image has {got} channel(s), expected {expected}")]
    ChannelMismatch { expected: usize, got: usize },
    #[error("kernel size {0} must be odd and non-zero")]
    InvalidKernelSize(usize),
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("blur radius {radius} exceeds the maximum of {max}")]
    InvalidRadius { radius: usize, max: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WarpError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("quadrilateral is degenerate, no projective map from the unit square")]
    DegenerateQuad,
}
