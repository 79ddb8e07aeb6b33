mod sample_curve;
mod smooth_derivatives;

pub use sample_curve::SampleCurve;
pub use smooth_derivatives::{MagnitudeMode, SmoothDerivatives, SmoothedDerivatives, SmoothingOptions};

use crate::math::arc_length::gauss_arc_length;
use crate::math::hermite::{derivative, interpolate};
use crate::math::{Point3, Vector3};

/// Where an output sample came from on the input curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleLocation {
    /// Index of the input element containing the sample.
    pub element: usize,
    /// Local coordinate within that element.
    pub xi: f64,
    /// Derivative scale factor `dxi(input) / dxi(output)`.
    pub scale: f64,
}

/// One output point of a sampled curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledPoint {
    pub position: Point3,
    /// Tangent with arc-length-consistent magnitude.
    pub d1: Vector3,
    pub d2: Vector3,
    pub d3: Vector3,
}

/// The result of resampling a piecewise Hermite curve: `N + 1` ordered
/// points for `N` output elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampledCurve {
    /// Output points in order along the curve.
    pub points: Vec<SampledPoint>,
    /// Input location of each output point.
    pub locations: Vec<SampleLocation>,
    /// Uniform interior element length.
    pub element_length: f64,
}

impl SampledCurve {
    /// Returns the number of output elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Returns the output positions.
    #[must_use]
    pub fn positions(&self) -> Vec<Point3> {
        self.points.iter().map(|p| p.position).collect()
    }

    /// Returns the output tangents.
    #[must_use]
    pub fn tangents(&self) -> Vec<Vector3> {
        self.points.iter().map(|p| p.d1).collect()
    }

    /// Quadrature arc length of the sampled piecewise curve.
    #[must_use]
    pub fn arc_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| gauss_arc_length(&w[0].position, &w[0].d1, &w[1].position, &w[1].d1))
            .sum()
    }

    /// Linearly interpolates per-input-node `values` at every sample location.
    ///
    /// `values` must hold one entry per input node.
    #[must_use]
    pub fn interpolate_linear(&self, values: &[Vector3]) -> Vec<Vector3> {
        self.locations
            .iter()
            .map(|loc| values[loc.element] * (1.0 - loc.xi) + values[loc.element + 1] * loc.xi)
            .collect()
    }

    /// Cubic Hermite interpolation of per-input-node `values` and
    /// `derivatives` at every sample location.
    ///
    /// Derivatives are converted to the output element spacing with each
    /// location's scale factor.
    #[must_use]
    pub fn interpolate_hermite(
        &self,
        values: &[Vector3],
        derivatives: &[Vector3],
    ) -> (Vec<Vector3>, Vec<Vector3>) {
        self.locations
            .iter()
            .map(|loc| {
                let e = loc.element;
                let v1 = Point3::from(values[e]);
                let v2 = Point3::from(values[e + 1]);
                let value = interpolate(&v1, &derivatives[e], &v2, &derivatives[e + 1], loc.xi);
                let rate = derivative(&v1, &derivatives[e], &v2, &derivatives[e + 1], loc.xi);
                (value.coords, rate * loc.scale)
            })
            .unzip()
    }

    /// Rate of change of `d2` and `d3` along the curve, per output element.
    ///
    /// Central differences at interior points, one-sided at the ends.
    #[must_use]
    pub fn side_cross_derivatives(&self) -> (Vec<Vector3>, Vec<Vector3>) {
        let n = self.points.len();
        if n < 2 {
            return (vec![Vector3::zeros(); n], vec![Vector3::zeros(); n]);
        }
        (0..n)
            .map(|i| {
                let (lo, hi, span) = if i == 0 {
                    (0, 1, 1.0)
                } else if i == n - 1 {
                    (n - 2, n - 1, 1.0)
                } else {
                    (i - 1, i + 1, 2.0)
                };
                (
                    (self.points[hi].d2 - self.points[lo].d2) / span,
                    (self.points[hi].d3 - self.points[lo].d3) / span,
                )
            })
            .unzip()
    }

    /// Scales the cross-section derivatives `d2`, `d3` of every point.
    pub fn scale_cross_section(&mut self, proportion: f64) {
        for point in &mut self.points {
            point.d2 *= proportion;
            point.d3 *= proportion;
        }
    }
}
