use crate::error::{NetworkError, Result};
use crate::math::arc_length::solve_arc_length;
use crate::math::{Point3, Vector3};
use crate::sampling::{SampleCurve, SampledCurve, SampledPoint, SmoothDerivatives, SmoothingOptions};
use crate::topology::{EndRole, NetworkTopology, SegmentEnd};

use super::blend::blend_tangents;

/// How many elements each segment is sampled into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementDensity {
    /// `ceil(arc length / target)` elements per segment.
    TargetLength(f64),
    /// The same element count on every segment.
    Count(usize),
}

/// Parameters for [`NetworkMeshBuilder::build`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildParameters {
    pub density: ElementDensity,
    /// Minimum element count of a segment that starts and ends on one node.
    pub closed_loop_minimum: usize,
    /// Smooth each segment's control-point `d1` before sampling, keeping the
    /// end directions.
    pub smooth_control_derivatives: bool,
    /// When set, also build an inner layer whose cross-section derivatives
    /// are scaled by this proportion.
    pub inner_proportion: Option<f64>,
}

impl Default for BuildParameters {
    fn default() -> Self {
        Self {
            density: ElementDensity::TargetLength(1.0),
            closed_loop_minimum: 2,
            smooth_control_derivatives: false,
            inner_proportion: None,
        }
    }
}

impl BuildParameters {
    /// Default parameters with the given target element length.
    #[must_use]
    pub fn with_target_length(length: f64) -> Self {
        Self {
            density: ElementDensity::TargetLength(length),
            ..Self::default()
        }
    }

    /// Default parameters with a fixed element count per segment.
    #[must_use]
    pub fn with_element_count(count: usize) -> Self {
        Self {
            density: ElementDensity::Count(count),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        match self.density {
            ElementDensity::TargetLength(length) if !(length.is_finite() && length > 0.0) => {
                return Err(NetworkError::InvalidParameters(format!(
                    "target element length must be positive, got {length}"
                ))
                .into());
            }
            ElementDensity::Count(0) => {
                return Err(NetworkError::InvalidParameters("element count must be at least 1".into()).into());
            }
            _ => {}
        }
        if let Some(proportion) = self.inner_proportion {
            if !(proportion.is_finite() && proportion > 0.0) {
                return Err(NetworkError::InvalidParameters(format!(
                    "inner proportion must be positive, got {proportion}"
                ))
                .into());
            }
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn element_count(&self, length: f64, closed_loop: bool) -> usize {
        let count = match self.density {
            ElementDensity::TargetLength(target) => {
                let count = (length / target).ceil();
                if count.is_finite() && count > 0.0 {
                    count as usize
                } else {
                    0
                }
            }
            ElementDensity::Count(count) => count,
        };
        let minimum = if closed_loop {
            self.closed_loop_minimum.max(1)
        } else {
            1
        };
        count.max(minimum)
    }
}

/// Builds a sampled network from a topology and its node geometry.
///
/// Consumed by [`NetworkMeshBuilder::build`], which yields a
/// [`SampledNetwork`] ready for mesh generation.
#[derive(Debug, Clone)]
pub struct NetworkMeshBuilder {
    topology: NetworkTopology,
    parameters: BuildParameters,
}

impl NetworkMeshBuilder {
    #[must_use]
    pub fn new(topology: NetworkTopology, parameters: BuildParameters) -> Self {
        Self { topology, parameters }
    }

    /// Parses `descriptor` and creates a builder over its default layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor is malformed.
    pub fn from_descriptor(descriptor: &str, parameters: BuildParameters) -> Result<Self> {
        Ok(Self::new(NetworkTopology::parse(descriptor)?, parameters))
    }

    #[must_use]
    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    /// Mutable access for replacing node geometry before building.
    pub fn topology_mut(&mut self) -> &mut NetworkTopology {
        &mut self.topology
    }

    #[must_use]
    pub fn parameters(&self) -> &BuildParameters {
        &self.parameters
    }

    /// Samples every segment in definition order, then blends the end
    /// tangents that share a node version.
    ///
    /// Every group of two or more segment ends using the same version of a
    /// node, at junctions and at pass-through nodes alike, is rescaled to the
    /// harmonic mean of its magnitudes; directions are kept.
    /// Numerical non-convergence is logged and tolerated.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid or a segment cannot be
    /// sampled.
    pub fn build(self) -> Result<SampledNetwork> {
        self.parameters.validate()?;
        let mut curves = Vec::with_capacity(self.topology.segments().len());
        for index in 0..self.topology.segments().len() {
            curves.push(self.sample_segment(index)?);
        }
        blend_shared_versions(&self.topology, &mut curves);

        let inner = self.parameters.inner_proportion.map(|proportion| {
            curves
                .iter()
                .cloned()
                .map(|mut curve| {
                    curve.scale_cross_section(proportion);
                    curve
                })
                .collect()
        });
        Ok(SampledNetwork {
            topology: self.topology,
            curves,
            inner,
        })
    }

    fn sample_segment(&self, index: usize) -> Result<SampledCurve> {
        let segment = self.topology.segment(index)?;
        let points = self.topology.segment_control_points(index)?;
        let positions: Vec<Point3> = points.iter().map(|p| p.position).collect();
        let mut d1: Vec<Vector3> = points.iter().map(|p| p.d1).collect();
        let d2: Vec<Vector3> = points.iter().map(|p| p.d2).collect();
        let d3: Vec<Vector3> = points.iter().map(|p| p.d3).collect();

        if self.parameters.smooth_control_derivatives {
            let options = SmoothingOptions {
                fix_start_direction: true,
                fix_end_direction: true,
                ..SmoothingOptions::default()
            };
            d1 = SmoothDerivatives::line(positions.clone(), d1)
                .with_options(options)
                .execute()?
                .derivatives;
        }

        let length: f64 = positions
            .windows(2)
            .zip(d1.windows(2))
            .map(|(x, d)| solve_arc_length(&x[0], &d[0], &x[1], &d[1], true).length)
            .sum();
        let count = self.parameters.element_count(length, segment.is_closed_loop());
        tracing::debug!(segment = index, length, elements = count, "sampling segment");
        SampleCurve::new(positions, d1, d2, count).with_d3(d3).execute()
    }
}

fn end_point_mut<'a>(curves: &'a mut [SampledCurve], end: &SegmentEnd) -> Option<&'a mut SampledPoint> {
    let points = &mut curves.get_mut(end.segment)?.points;
    match end.role {
        EndRole::Start => points.first_mut(),
        EndRole::End => points.last_mut(),
    }
}

fn blend_shared_versions(topology: &NetworkTopology, curves: &mut [SampledCurve]) {
    for shared in topology.shared_versions() {
        let mut tangents: Vec<Vector3> = shared
            .ends
            .iter()
            .filter_map(|end| end_point_mut(curves, end).map(|p| p.d1))
            .collect();
        if tangents.len() != shared.ends.len() {
            continue;
        }
        let magnitude = blend_tangents(&mut tangents);
        for (end, tangent) in shared.ends.iter().zip(tangents) {
            if let Some(point) = end_point_mut(curves, end) {
                point.d1 = tangent;
            }
        }
        tracing::debug!(
            node = shared.node,
            version = shared.version,
            ends = shared.ends.len(),
            magnitude,
            "blended shared node tangents"
        );
    }
}

/// A network whose segments have been sampled and blended, ready for
/// coordinate transforms and mesh generation.
#[derive(Debug, Clone)]
pub struct SampledNetwork {
    pub(super) topology: NetworkTopology,
    pub(super) curves: Vec<SampledCurve>,
    pub(super) inner: Option<Vec<SampledCurve>>,
}

impl SampledNetwork {
    #[must_use]
    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    /// Sampled curves in segment order.
    #[must_use]
    pub fn curves(&self) -> &[SampledCurve] {
        &self.curves
    }

    /// Inner layer curves, if an inner proportion was given.
    #[must_use]
    pub fn inner_curves(&self) -> Option<&[SampledCurve]> {
        self.inner.as_deref()
    }

    /// Returns the sampled curve of segment `index`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::MissingSample`] if there is no such segment.
    pub fn curve(&self, index: usize) -> Result<&SampledCurve> {
        self.curves
            .get(index)
            .ok_or_else(|| NetworkError::MissingSample { segment: index }.into())
    }

    /// Every sampled point of both layers, for bulk coordinate transforms.
    pub fn points_mut(&mut self) -> impl Iterator<Item = &mut SampledPoint> {
        self.curves
            .iter_mut()
            .chain(self.inner.iter_mut().flatten())
            .flat_map(|curve| curve.points.iter_mut())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Derivatives;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn build(descriptor: &str, parameters: BuildParameters) -> SampledNetwork {
        NetworkMeshBuilder::from_descriptor(descriptor, parameters)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn chain_is_sampled_at_target_length() {
        let network = build("1-2-3", BuildParameters::with_target_length(0.5));
        assert_eq!(network.curves().len(), 1);
        let curve = network.curve(0).unwrap();
        assert_eq!(curve.element_count(), 4);
        for (i, point) in curve.points.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let expected = 0.5 * i as f64;
            assert!((point.position.x - expected).abs() < 1e-9);
        }
        assert!(network.inner_curves().is_none());
        assert!(network.curve(1).is_err());
    }

    #[test]
    fn short_segment_gets_one_element() {
        let network = build("1-2", BuildParameters::with_target_length(10.0));
        assert_eq!(network.curve(0).unwrap().element_count(), 1);
    }

    #[test]
    fn fixed_count_applies_to_every_segment() {
        let network = build("1-2-3,2-4", BuildParameters::with_element_count(3));
        assert_eq!(network.curves().len(), 3);
        assert!(network.curves().iter().all(|c| c.element_count() == 3));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        for parameters in [
            BuildParameters::with_target_length(0.0),
            BuildParameters::with_target_length(f64::NAN),
            BuildParameters::with_element_count(0),
            BuildParameters {
                inner_proportion: Some(-0.5),
                ..BuildParameters::default()
            },
        ] {
            let builder = NetworkMeshBuilder::from_descriptor("1-2", parameters).unwrap();
            assert!(builder.build().is_err());
        }
    }

    fn circle_loop() -> NetworkMeshBuilder {
        let mut builder =
            NetworkMeshBuilder::from_descriptor("1-2-3-1", BuildParameters::with_target_length(100.0)).unwrap();
        let mag = 4.0 / 3.0 * (PI / 6.0).tan() * 3.0;
        for (i, id) in [1_u32, 2, 3].into_iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let a = 2.0 * PI * i as f64 / 3.0;
            let d1 = Vector3::new(-a.sin(), a.cos(), 0.0) * mag;
            let d3 = Vector3::z();
            let derivatives = Derivatives::new(d1, d3.cross(&d1).normalize(), d3);
            builder
                .topology_mut()
                .set_node_geometry(id, Point3::new(a.cos(), a.sin(), 0.0), &[derivatives])
                .unwrap();
        }
        builder
    }

    #[test]
    fn closed_loop_has_minimum_elements() {
        let network = circle_loop().build().unwrap();
        let curve = network.curve(0).unwrap();
        assert_eq!(curve.element_count(), 2);
        assert_eq!(curve.points[0].position, curve.points[2].position);
    }

    #[test]
    fn junction_group_shares_one_magnitude() {
        let mut builder =
            NetworkMeshBuilder::from_descriptor("1-2,2.1-3,2.1-4", BuildParameters::with_element_count(2)).unwrap();
        let topology = builder.topology_mut();
        let along = Derivatives::new(Vector3::x(), Vector3::y(), Vector3::z());
        topology.set_node_geometry(1, Point3::new(-1.0, 0.0, 0.0), &[along]).unwrap();
        topology.set_node_geometry(2, Point3::origin(), &[along]).unwrap();
        topology.set_node_geometry(3, Point3::new(4.0, 0.0, 0.0), &[along]).unwrap();
        topology.set_node_geometry(4, Point3::new(2.0, 2.0, 0.0), &[along]).unwrap();
        let network = builder.build().unwrap();

        let end0 = network.curve(0).unwrap().points.last().unwrap().d1;
        let start1 = network.curve(1).unwrap().points[0].d1;
        let start2 = network.curve(2).unwrap().points[0].d1;
        assert_relative_eq!(end0.norm(), start1.norm(), epsilon = 1e-12);
        assert_relative_eq!(end0.norm(), start2.norm(), epsilon = 1e-12);
        // Directions are never averaged.
        for d in [end0, start1, start2] {
            assert!(d.y.abs() < 1e-12 && d.x > 0.0);
        }
        // Before blending the magnitudes are 0.5, 2.0 and the curved branch's element length.
        assert!(end0.norm() > 0.5 && end0.norm() < 2.0);
    }

    #[test]
    fn distinct_versions_blend_separately() {
        let network = build("1-2-3,2-4", BuildParameters::with_element_count(2));
        let junctions = network.topology().junctions();
        assert_eq!(junctions.len(), 1);
        let end0 = network.curve(0).unwrap().points.last().unwrap().d1;
        let start1 = network.curve(1).unwrap().points[0].d1;
        assert_relative_eq!(end0.norm(), start1.norm(), epsilon = 1e-12);
    }

    #[test]
    fn inner_layer_scales_cross_section() {
        let parameters = BuildParameters {
            inner_proportion: Some(0.5),
            ..BuildParameters::with_element_count(2)
        };
        let network = build("1-2", parameters);
        let outer = &network.curves()[0].points[1];
        let inner = &network.inner_curves().unwrap()[0].points[1];
        assert_eq!(outer.position, inner.position);
        assert_eq!(outer.d1, inner.d1);
        assert_relative_eq!(inner.d2, outer.d2 * 0.5, epsilon = 1e-12);
        assert_relative_eq!(inner.d3, outer.d3 * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn smoothing_keeps_end_directions() {
        let mut builder = NetworkMeshBuilder::from_descriptor(
            "1-2-3-4",
            BuildParameters {
                smooth_control_derivatives: true,
                ..BuildParameters::with_element_count(6)
            },
        )
        .unwrap();
        let topology = builder.topology_mut();
        let positions = [(0.0, 0.0), (1.0, 1.0), (2.0, 1.0), (3.0, 0.0)];
        for (id, (x, y)) in (1_u32..).zip(positions) {
            let derivatives = Derivatives::new(Vector3::new(0.2, 0.1, 0.0), Vector3::y(), Vector3::z());
            topology
                .set_node_geometry(id, Point3::new(x, y, 0.0), &[derivatives])
                .unwrap();
        }
        let network = builder.build().unwrap();
        let curve = network.curve(0).unwrap();
        assert_eq!(curve.points[0].position, Point3::origin());
        assert_eq!(curve.points[6].position, Point3::new(3.0, 0.0, 0.0));
        let start = curve.points[0].d1;
        assert!(start.cross(&Vector3::new(0.2, 0.1, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn points_mut_covers_both_layers() {
        let parameters = BuildParameters {
            inner_proportion: Some(0.5),
            ..BuildParameters::with_element_count(2)
        };
        let mut network = build("1-2", parameters);
        assert_eq!(network.points_mut().count(), 6);
    }
}
