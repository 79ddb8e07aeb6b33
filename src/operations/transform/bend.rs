use crate::error::{GeometryError, Result};
use crate::math::{Matrix3, Point3, Vector3};
use crate::network::SampledNetwork;

/// Bends a sampled network so its x axis follows a circular arc.
///
/// The arc has the given radius and is centred on the z-parallel axis
/// through `(0, radius, 0)`, curving toward +y. The distance along x becomes
/// arc length, and points off the x axis keep their offset from the arc.
pub struct Bend {
    radius: f64,
}

impl Bend {
    /// Creates a new `Bend` operation.
    #[must_use]
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    /// Executes the bend, mapping positions and carrying `d1`, `d2` and `d3`
    /// through the Jacobian of the mapping.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the radius is not positive.
    pub fn execute(&self, network: &mut SampledNetwork) -> Result<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(GeometryError::Degenerate(format!("bend radius must be positive, got {}", self.radius)).into());
        }
        for point in network.points_mut() {
            let (position, jacobian) = self.map(&point.position);
            point.position = position;
            point.d1 = jacobian * point.d1;
            point.d2 = jacobian * point.d2;
            point.d3 = jacobian * point.d3;
        }
        Ok(())
    }

    fn map(&self, point: &Point3) -> (Point3, Matrix3) {
        let r = self.radius;
        let theta = point.x / r;
        let (sin, cos) = theta.sin_cos();
        let rho = r - point.y;
        let position = Point3::new(rho * sin, r - rho * cos, point.z);
        let along = Vector3::new(cos, sin, 0.0) * (rho / r);
        let across = Vector3::new(-sin, cos, 0.0);
        let jacobian = Matrix3::from_columns(&[along, across, Vector3::z()]);
        (position, jacobian)
    }
}
