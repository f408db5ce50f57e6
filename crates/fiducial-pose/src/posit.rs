//! Coplanar POSIT (DeMenthon & Davis) for a square of known size.
//!
//! The model square is centred at the origin in the `z = 0` plane with
//! corners `(-h, h)`, `(h, h)`, `(h, -h)`, `(-h, -h)` where `h = size / 2`.
//! Image points are expected in the same order, relative to the principal
//! point, with `y` pointing up.

use crate::error::PoseError;
use crate::math::{all_finite, mat3_from_rows, row, Mat3, Vec3};
use crate::svd::Svd;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Relative cutoff below which singular values are treated as zero.
const SINGULAR_EPS: f64 = 1e-10;
const MIN_AXIS_NORM: f64 = 1e-12;

/// Vertex triples `(apex, a, b)` whose angles feed the reprojection error.
const ANGLE_TRIPLES: [[usize; 3]; 4] = [[0, 1, 3], [1, 2, 0], [2, 3, 1], [3, 0, 2]];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositParams {
    pub max_iterations: usize,
    /// Stop refining once the mean angular error drops to this many degrees.
    pub error_threshold_deg: f64,
}

impl Default for PositParams {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            error_threshold_deg: 2.0,
        }
    }
}

/// One rotation/translation solution and its reprojection error in degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub rotation: Mat3,
    pub translation: Vec3,
    pub error: f64,
}

/// Both POSIT branches, best first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub best: Hypothesis,
    pub alternative: Hypothesis,
}

impl Pose {
    pub fn best_error(&self) -> f64 {
        self.best.error
    }

    pub fn best_rotation(&self) -> &Mat3 {
        &self.best.rotation
    }

    pub fn best_translation(&self) -> &Vec3 {
        &self.best.translation
    }

    pub fn alternative_error(&self) -> f64 {
        self.alternative.error
    }

    pub fn alternative_rotation(&self) -> &Mat3 {
        &self.alternative.rotation
    }

    pub fn alternative_translation(&self) -> &Vec3 {
        &self.alternative.translation
    }
}

/// Pose estimator for one marker size and focal length.
#[derive(Clone, Debug)]
pub struct Posit {
    model: [Vec3; 4],
    model_vectors: Mat3,
    model_pseudo_inverse: Mat3,
    model_normal: Vec3,
    focal_length: f64,
    params: PositParams,
}

impl Posit {
    pub fn new(model_size: f64, focal_length: f64) -> Result<Self, PoseError> {
        Self::with_params(model_size, focal_length, PositParams::default())
    }

    pub fn with_params(
        model_size: f64,
        focal_length: f64,
        params: PositParams,
    ) -> Result<Self, PoseError> {
        if !(model_size.is_finite() && model_size > 0.0) {
            return Err(PoseError::InvalidModel("model size must be positive"));
        }
        if !(focal_length.is_finite() && focal_length > 0.0) {
            return Err(PoseError::InvalidModel("focal length must be positive"));
        }
        if params.max_iterations == 0 {
            return Err(PoseError::InvalidModel("max_iterations must be at least 1"));
        }

        let h = model_size / 2.0;
        let model = [
            Vec3::new(-h, h, 0.0),
            Vec3::new(h, h, 0.0),
            Vec3::new(h, -h, 0.0),
            Vec3::new(-h, -h, 0.0),
        ];
        let model_vectors = mat3_from_rows(
            &(model[1] - model[0]),
            &(model[2] - model[0]),
            &(model[3] - model[0]),
        );
        let svd = Svd::new(&model_vectors)?;

        Ok(Self {
            model,
            model_vectors,
            model_pseudo_inverse: svd.pseudo_inverse(SINGULAR_EPS),
            model_normal: svd.null_vector(),
            focal_length,
            params,
        })
    }

    pub fn model_points(&self) -> &[Vec3; 4] {
        &self.model
    }

    pub fn focal_length(&self) -> f64 {
        self.focal_length
    }

    pub fn params(&self) -> &PositParams {
        &self.params
    }

    /// Recover the marker pose from its four image corners.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, points), fields(focal = self.focal_length))
    )]
    pub fn pose(&self, points: &[Point2<f64>; 4]) -> Result<Pose, PoseError> {
        if !points.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
            return Err(PoseError::Degenerate);
        }

        let [a, b] = self.pos(points, &Vec3::repeat(1.0))?;
        let a = self.iterate(points, a);
        let b = self.iterate(points, b);
        log::trace!("posit branches: error {} / {}", a.error, b.error);

        if a.error.is_nan() && b.error.is_nan() {
            return Err(PoseError::Unavailable);
        }
        let (best, alternative) = if lower_first(a.error, b.error) {
            (a, b)
        } else {
            (b, a)
        };
        Ok(Pose { best, alternative })
    }

    /// Scaled-orthographic solve with per-point correction `eps` for points
    /// 1..=3; yields the two hypotheses from the normal's sign ambiguity.
    fn pos(&self, points: &[Point2<f64>; 4], eps: &Vec3) -> Result<[Hypothesis; 2], PoseError> {
        let p0 = points[0];
        let xs = Vec3::new(
            points[1].x * eps.x - p0.x,
            points[2].x * eps.y - p0.x,
            points[3].x * eps.z - p0.x,
        );
        let ys = Vec3::new(
            points[1].y * eps.x - p0.y,
            points[2].y * eps.y - p0.y,
            points[3].y * eps.z - p0.y,
        );

        let i0 = self.model_pseudo_inverse * xs;
        let j0 = self.model_pseudo_inverse * ys;
        let s = j0.norm_squared() - i0.norm_squared();
        let ij = i0.dot(&j0);

        let (r, theta) = if s.abs() < f64::EPSILON {
            (
                (2.0 * ij).abs().sqrt(),
                -std::f64::consts::FRAC_PI_2 * signum_or_zero(ij),
            )
        } else {
            let r = (s * s + 4.0 * ij * ij).sqrt().sqrt();
            let mut theta = (-2.0 * ij / s).atan();
            if s < 0.0 {
                theta += std::f64::consts::PI;
            }
            (r, theta / 2.0)
        };
        let lambda = r * theta.cos();
        let mu = r * theta.sin();

        let first = self.hypothesis(p0, i0 + self.model_normal * lambda, j0 + self.model_normal * mu)?;
        let second = self.hypothesis(p0, i0 - self.model_normal * lambda, j0 - self.model_normal * mu)?;
        Ok([first, second])
    }

    fn hypothesis(&self, p0: Point2<f64>, i: Vec3, j: Vec3) -> Result<Hypothesis, PoseError> {
        let ni = i.norm();
        let nj = j.norm();
        if !(ni > MIN_AXIS_NORM && nj > MIN_AXIS_NORM) {
            return Err(PoseError::Degenerate);
        }
        let i = i / ni;
        let j = j / nj;
        let rotation = mat3_from_rows(&i, &j, &i.cross(&j));

        let scale = (ni + nj) / 2.0;
        let m0 = rotation * self.model[0];
        let translation = Vec3::new(
            p0.x / scale - m0.x,
            p0.y / scale - m0.y,
            self.focal_length / scale,
        );
        if !all_finite(rotation.iter().chain(translation.iter())) {
            return Err(PoseError::Degenerate);
        }

        Ok(Hypothesis {
            rotation,
            translation,
            error: f64::NAN,
        })
    }

    /// Refine one branch towards full perspective, returning the lowest
    /// error hypothesis seen.
    fn iterate(&self, points: &[Point2<f64>; 4], mut current: Hypothesis) -> Hypothesis {
        current.error = self.reprojection_error(points, &current.rotation, &current.translation);
        let mut best = current.clone();
        let mut previous = f64::INFINITY;

        for _ in 0..self.params.max_iterations {
            let eps = (self.model_vectors * row(&current.rotation, 2))
                .map(|v| v / current.translation.z + 1.0);
            let Ok([mut a, mut b]) = self.pos(points, &eps) else {
                break;
            };
            a.error = self.reprojection_error(points, &a.rotation, &a.translation);
            b.error = self.reprojection_error(points, &b.rotation, &b.translation);
            current = if lower_first(a.error, b.error) { a } else { b };

            if current.error < best.error || best.error.is_nan() {
                best = current.clone();
            }
            if current.error <= self.params.error_threshold_deg || current.error > previous {
                break;
            }
            previous = current.error;
        }
        best
    }

    /// Mean absolute difference (degrees) between the vertex angles of the
    /// observed quad and of the model projected with `rotation`/`translation`.
    pub fn reprojection_error(
        &self,
        points: &[Point2<f64>; 4],
        rotation: &Mat3,
        translation: &Vec3,
    ) -> f64 {
        let modeled = self.model.map(|m| {
            let v = rotation * m + translation;
            Point2::new(
                v.x * self.focal_length / v.z,
                v.y * self.focal_length / v.z,
            )
        });

        let total: f64 = ANGLE_TRIPLES
            .iter()
            .map(|&[o, a, b]| {
                (angle(modeled[o], modeled[a], modeled[b]) - angle(points[o], points[a], points[b]))
                    .abs()
            })
            .sum();
        total / ANGLE_TRIPLES.len() as f64
    }
}

/// Angle at `a` between `ab` and `ac`, in degrees.
pub fn angle(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let cos = ab.dot(&ac) / (ab.norm() * ac.norm());
    cos.clamp(-1.0, 1.0).acos().to_degrees()
}

fn signum_or_zero(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// `true` when `a` should be preferred over `b`; NaN always loses.
fn lower_first(a: f64, b: f64) -> bool {
    a < b || b.is_nan()
}
