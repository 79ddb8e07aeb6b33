use crate::error::Result;
use crate::math::{Matrix3, Matrix4, Point3};
use crate::network::SampledNetwork;

/// Applies an arbitrary 4x4 transformation matrix to a sampled network.
pub struct GeneralTransform {
    matrix: Matrix4,
}

impl GeneralTransform {
    /// Creates a new `GeneralTransform` operation.
    #[must_use]
    pub fn new(matrix: Matrix4) -> Self {
        Self { matrix }
    }

    /// Executes the transformation, modifying every sampled point in-place.
    ///
    /// Positions are transformed as points; `d1`, `d2` and `d3` go through
    /// the linear part only.
    ///
    /// # Errors
    ///
    /// Never fails; returns `Result` to match the other transforms.
    pub fn execute(&self, network: &mut SampledNetwork) -> Result<()> {
        let linear: Matrix3 = self.matrix.fixed_view::<3, 3>(0, 0).into_owned();
        for point in network.points_mut() {
            point.position = transform_point(&self.matrix, &point.position);
            point.d1 = linear * point.d1;
            point.d2 = linear * point.d2;
            point.d3 = linear * point.d3;
        }
        Ok(())
    }
}

/// Transforms a point by a 4x4 matrix (homogeneous coordinates).
fn transform_point(matrix: &Matrix4, point: &Point3) -> Point3 {
    let v = matrix * nalgebra::Vector4::new(point.x, point.y, point.z, 1.0);
    Point3::new(v.x, v.y, v.z)
}
