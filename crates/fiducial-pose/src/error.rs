/// Failures of [`Posit`](crate::Posit) construction and pose recovery.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PoseError {
    #[error("invalid pose model: {0}")]
    InvalidModel(&'static str),

    #[error("degenerate point configuration")]
    Degenerate,

    #[error("pose unavailable: no hypothesis has a finite reprojection error")]
    Unavailable,
}
