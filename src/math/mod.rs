pub mod arc_length;
pub mod hermite;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix, used for the linear part of coordinate transforms.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns `v` scaled to have magnitude `magnitude`.
///
/// A vector shorter than [`TOLERANCE`] has no direction to keep and yields
/// the zero vector.
#[must_use]
pub fn set_magnitude(v: &Vector3, magnitude: f64) -> Vector3 {
    let len = v.norm();
    if len < TOLERANCE {
        return Vector3::zeros();
    }
    v * (magnitude / len)
}

/// Returns the unit vector along `v`, or the zero vector if `v` is degenerate.
#[must_use]
pub fn normalize_or_zero(v: &Vector3) -> Vector3 {
    set_magnitude(v, 1.0)
}

/// Component of `v` orthogonal to the unit vector `unit`.
#[must_use]
pub fn reject(v: &Vector3, unit: &Vector3) -> Vector3 {
    v - unit * v.dot(unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_magnitude_keeps_direction() {
        let v = set_magnitude(&Vector3::new(3.0, 4.0, 0.0), 10.0);
        assert!((v - Vector3::new(6.0, 8.0, 0.0)).norm() < TOLERANCE);
    }

    #[test]
    fn set_magnitude_of_zero_vector_is_zero() {
        assert_eq!(set_magnitude(&Vector3::zeros(), 2.0), Vector3::zeros());
    }

    #[test]
    fn reject_removes_parallel_part() {
        let r = reject(&Vector3::new(1.0, 2.0, 3.0), &Vector3::new(0.0, 0.0, 1.0));
        assert!((r - Vector3::new(1.0, 2.0, 0.0)).norm() < TOLERANCE);
    }
}
