use crate::error::{GeometryError, Result};
use crate::math::{Matrix4, Point3, Vector3, TOLERANCE};
use crate::network::SampledNetwork;

use super::GeneralTransform;

/// Rotates a sampled network around an axis.
pub struct Rotate {
    axis_origin: Point3,
    axis_direction: Vector3,
    angle: f64,
}

impl Rotate {
    /// Creates a new `Rotate` operation.
    ///
    /// * `angle` - Rotation angle in radians.
    #[must_use]
    pub fn new(axis_origin: Point3, axis_direction: Vector3, angle: f64) -> Self {
        Self {
            axis_origin,
            axis_direction,
            angle,
        }
    }

    /// Executes the rotation, modifying every sampled point in-place.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroVector`] if the axis direction is zero-length.
    pub fn execute(&self, network: &mut SampledNetwork) -> Result<()> {
        let len = self.axis_direction.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let axis = self.axis_direction / len;

        let t_neg = Matrix4::new_translation(&(-self.axis_origin.coords));
        let rot = rotation_matrix(&axis, self.angle);
        let t_pos = Matrix4::new_translation(&self.axis_origin.coords);
        let matrix = t_pos * rot * t_neg;

        GeneralTransform::new(matrix).execute(network)
    }
}

/// Builds a 4x4 rotation matrix around a unit axis by an angle (Rodrigues).
#[allow(clippy::many_single_char_names)]
fn rotation_matrix(axis: &Vector3, angle: f64) -> Matrix4 {
    let c = angle.cos();
    let s = angle.sin();
    let t = 1.0 - c;
    let (x, y, z) = (axis.x, axis.y, axis.z);

    #[allow(clippy::suspicious_operation_groupings)]
    Matrix4::new(
        t * x * x + c,     t * x * y - s * z, t * x * z + s * y, 0.0,
        t * x * y + s * z, t * y * y + c,     t * y * z - s * x, 0.0,
        t * x * z - s * y, t * y * z + s * x, t * z * z + c,     0.0,
        0.0,               0.0,               0.0,               1.0,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;
    use crate::operations::transform::sample_network;
    use approx::assert_relative_eq;

    #[test]
    fn rotate_90_around_z() {
        let mut network = sample_network();
        let before = network.curves()[0].clone();
        Rotate::new(Point3::origin(), Vector3::z(), FRAC_PI_2)
            .execute(&mut network)
            .unwrap();
        for (old, new) in before.points.iter().zip(&network.curves()[0].points) {
            // (x, y, z) -> (-y, x, z)
            assert_relative_eq!(
                new.position,
                Point3::new(-old.position.y, old.position.x, old.position.z),
                epsilon = 1e-12
            );
            assert_relative_eq!(new.d1, Vector3::new(-old.d1.y, old.d1.x, old.d1.z), epsilon = 1e-12);
            assert_relative_eq!(new.d1.norm(), old.d1.norm(), epsilon = 1e-12);
        }
    }

    #[test]
    fn rotation_about_offset_axis_fixes_axis_points() {
        let mut network = sample_network();
        let start = network.curves()[0].points[0].position;
        Rotate::new(start, Vector3::new(1.0, 1.0, 0.0), 1.0)
            .execute(&mut network)
            .unwrap();
        assert_relative_eq!(network.curves()[0].points[0].position, start, epsilon = 1e-12);
    }

    #[test]
    fn zero_axis_returns_error() {
        let mut network = sample_network();
        let result = Rotate::new(Point3::origin(), Vector3::zeros(), 1.0).execute(&mut network);
        assert!(result.is_err());
    }
}
