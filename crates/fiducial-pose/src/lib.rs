//! Pose of a square marker of known size from its four image corners.
//!
//! [`Posit`] implements the coplanar variant of POSIT: a scaled orthographic
//! solve seeded from the pseudo-inverse of the model's edge vectors, refined
//! iteratively towards full perspective. Both branches of the planar
//! ambiguity are kept and returned best first in a [`Pose`].
//!
//! ```
//! use fiducial_pose::Posit;
//! use nalgebra::Point2;
//!
//! let posit = Posit::new(100.0, 700.0)?;
//! let corners = [
//!     Point2::new(-50.0, 50.0),
//!     Point2::new(50.0, 50.0),
//!     Point2::new(50.0, -50.0),
//!     Point2::new(-50.0, -50.0),
//! ];
//! let pose = posit.pose(&corners)?;
//! assert!((pose.best_translation().z - 700.0).abs() < 1e-6);
//! # Ok::<(), fiducial_pose::PoseError>(())
//! ```

mod error;
pub mod math;
mod posit;
mod svd;

pub use error::PoseError;
pub use math::{Mat3, Vec3};
pub use posit::{angle, Hypothesis, Pose, Posit, PositParams};
pub use svd::Svd;
