use crate::math::{Point3, Vector3};

/// A curve control point: position, primary tangent `d1` and the
/// cross-section derivatives `d2`, `d3`.
///
/// Cross-section derivatives default to zero when a caller has none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub position: Point3,
    pub d1: Vector3,
    pub d2: Vector3,
    pub d3: Vector3,
}

impl ControlPoint {
    /// Creates a control point with zero cross-section derivatives.
    #[must_use]
    pub fn new(position: Point3, d1: Vector3) -> Self {
        Self {
            position,
            d1,
            d2: Vector3::zeros(),
            d3: Vector3::zeros(),
        }
    }

    /// Returns this control point with the given cross-section derivatives.
    #[must_use]
    pub fn with_cross_section(mut self, d2: Vector3, d3: Vector3) -> Self {
        self.d2 = d2;
        self.d3 = d3;
        self
    }
}

/// The derivative record of one node version: `d1`, `d2`, `d3` without a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derivatives {
    pub d1: Vector3,
    pub d2: Vector3,
    pub d3: Vector3,
}

impl Derivatives {
    #[must_use]
    pub fn new(d1: Vector3, d2: Vector3, d3: Vector3) -> Self {
        Self { d1, d2, d3 }
    }

    /// Combines these derivatives with a position.
    #[must_use]
    pub fn at(&self, position: Point3) -> ControlPoint {
        ControlPoint {
            position,
            d1: self.d1,
            d2: self.d2,
            d3: self.d3,
        }
    }
}

impl Default for Derivatives {
    fn default() -> Self {
        Self::new(Vector3::x(), Vector3::y(), Vector3::z())
    }
}
