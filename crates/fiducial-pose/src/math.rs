//! Small 3-vector / 3×3 helpers on top of `nalgebra`.

use nalgebra::{Matrix3, Vector3};

pub type Vec3 = Vector3<f64>;
pub type Mat3 = Matrix3<f64>;

/// Matrix whose rows are `a`, `b`, `c`.
#[inline]
pub fn mat3_from_rows(a: &Vec3, b: &Vec3, c: &Vec3) -> Mat3 {
    Mat3::from_rows(&[a.transpose(), b.transpose(), c.transpose()])
}

/// Row `r` of `m` as a column vector.
#[inline]
pub fn row(m: &Mat3, r: usize) -> Vec3 {
    m.row(r).transpose()
}

#[inline]
pub fn all_finite<'a>(values: impl IntoIterator<Item = &'a f64>) -> bool {
    values.into_iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_round_trip() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        let c = Vec3::new(7.0, 8.0, 9.0);
        let m = mat3_from_rows(&a, &b, &c);
        assert_eq!(m[(1, 2)], 6.0);
        assert_eq!(row(&m, 2), c);
        assert!(all_finite(m.iter()));
        assert!(!all_finite([1.0, f64::NAN].iter()));
    }
}
