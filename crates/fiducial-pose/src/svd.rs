use crate::error::PoseError;
use crate::math::{all_finite, Mat3, Vec3};

const MAX_SWEEPS: usize = 200;

/// `m = u · diag(w) · vᵀ` for a 3×3 matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Svd {
    pub u: Mat3,
    pub w: Vec3,
    pub v: Mat3,
}

impl Svd {
    pub fn new(m: &Mat3) -> Result<Self, PoseError> {
        if !all_finite(m.iter()) {
            return Err(PoseError::InvalidModel("matrix has non-finite entries"));
        }
        let svd = m
            .try_svd(true, true, f64::EPSILON, MAX_SWEEPS)
            .ok_or(PoseError::Degenerate)?;
        let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
            return Err(PoseError::Degenerate);
        };
        Ok(Self {
            u,
            w: svd.singular_values,
            v: v_t.transpose(),
        })
    }

    /// `v · diag(1/w) · uᵀ`, with singular values below `rel_eps · max(w)`
    /// treated as zero.
    pub fn pseudo_inverse(&self, rel_eps: f64) -> Mat3 {
        let cutoff = rel_eps * self.w.max();
        let inv = self.w.map(|w| if w > cutoff { 1.0 / w } else { 0.0 });
        self.v * Mat3::from_diagonal(&inv) * self.u.transpose()
    }

    /// Right singular vector paired with the smallest singular value.
    pub fn null_vector(&self) -> Vec3 {
        self.v.column(self.w.imin()).into_owned()
    }
}
