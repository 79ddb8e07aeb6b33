use crate::error::{GeometryError, Result};
use crate::math::arc_length::solve_arc_length;
use crate::math::hermite::{derivative, interpolate};
use crate::math::{set_magnitude, Point3, Vector3, TOLERANCE};

use super::{SampleLocation, SampledCurve, SampledPoint};

/// Resamples a piecewise cubic Hermite curve into a fixed number of output
/// elements, evenly spaced in arc length.
///
/// Each input element is first rescaled so its tangents equal its solved arc
/// length. Output tangents have the magnitude of the output element length;
/// the two boundary elements can be lengthened (`add_lengths`) or sized as a
/// fraction of the interior length (`length_fractions`), and lengths can be
/// graded from start to end (`length_ratio`). The cross-section
/// derivatives `d2`, `d3` are blended linearly, not length-corrected.
#[derive(Debug, Clone)]
pub struct SampleCurve {
    positions: Vec<Point3>,
    d1: Vec<Vector3>,
    d2: Vec<Vector3>,
    d3: Option<Vec<Vector3>>,
    count: usize,
    add_length_start: f64,
    add_length_end: f64,
    length_fraction_start: f64,
    length_fraction_end: f64,
    length_ratio: f64,
}

impl SampleCurve {
    /// Creates a sampling of the curve through `positions` into `count` elements.
    #[must_use]
    pub fn new(positions: Vec<Point3>, d1: Vec<Vector3>, d2: Vec<Vector3>, count: usize) -> Self {
        Self {
            positions,
            d1,
            d2,
            d3: None,
            count,
            add_length_start: 0.0,
            add_length_end: 0.0,
            length_fraction_start: 1.0,
            length_fraction_end: 1.0,
            length_ratio: 1.0,
        }
    }

    /// Also blends the second cross-section derivative `d3`.
    #[must_use]
    pub fn with_d3(mut self, d3: Vec<Vector3>) -> Self {
        self.d3 = Some(d3);
        self
    }

    /// Extra length added to the first and last output elements.
    #[must_use]
    pub fn with_add_lengths(mut self, start: f64, end: f64) -> Self {
        self.add_length_start = start;
        self.add_length_end = end;
        self
    }

    /// Fraction of the interior element length used by the first and last
    /// output elements.
    #[must_use]
    pub fn with_length_fractions(mut self, start: f64, end: f64) -> Self {
        self.length_fraction_start = start;
        self.length_fraction_end = end;
        self
    }

    /// Ratio of the first to the last element length, with lengths varying
    /// linearly in between. Applied in proportion to the length fractions.
    #[must_use]
    pub fn with_length_ratio(mut self, start_end_ratio: f64) -> Self {
        self.length_ratio = start_end_ratio;
        self
    }

    fn validate(&self) -> Result<()> {
        let n = self.positions.len();
        if n < 2 {
            return Err(GeometryError::Degenerate("sampling needs at least two input points".into()).into());
        }
        if self.d1.len() != n || self.d2.len() != n || self.d3.as_ref().is_some_and(|d3| d3.len() != n) {
            return Err(GeometryError::MismatchedLengths(format!(
                "{n} positions, {} d1, {} d2",
                self.d1.len(),
                self.d2.len()
            ))
            .into());
        }
        if self.count == 0 {
            return Err(GeometryError::Degenerate("sampling needs at least one output element".into()).into());
        }
        if !(self.length_ratio.is_finite() && self.length_ratio > 0.0) {
            return Err(GeometryError::Degenerate(format!(
                "element length ratio must be positive, got {}",
                self.length_ratio
            ))
            .into());
        }
        Ok(())
    }

    /// Output element lengths and the tangent magnitude at every output point.
    ///
    /// Returns the interior reference length `mid`, the `count` element
    /// lengths and the `count + 1` magnitudes. Interior magnitudes average the
    /// two adjoining element lengths; each end uses a doubled virtual
    /// boundary element. A single element takes the end element length at
    /// both points.
    fn element_lengths(&self, total: f64) -> (f64, Vec<f64>, Vec<f64>) {
        let k = self.count;
        let proportion_end = 2.0 / (self.length_ratio + 1.0);
        let proportion_start = self.length_ratio * proportion_end;
        #[allow(clippy::cast_precision_loss)]
        let mid = if k == 1 {
            total
        } else {
            (total - self.add_length_start - self.add_length_end)
                / (k as f64 - 2.0
                    + proportion_start * self.length_fraction_start
                    + proportion_end * self.length_fraction_end)
        };

        #[allow(clippy::float_cmp)]
        let mut element_lengths: Vec<f64> = if k == 1 || self.length_ratio == 1.0 {
            vec![mid; k]
        } else {
            #[allow(clippy::cast_precision_loss)]
            (0..k)
                .map(|i| {
                    let xi = i as f64 / (k - 1) as f64;
                    ((1.0 - xi) * proportion_start + xi * proportion_end) * mid
                })
                .collect()
        };
        let mut magnitudes = vec![0.0; k + 1];
        for (n, pair) in element_lengths.windows(2).enumerate() {
            magnitudes[n + 1] = 0.5 * (pair[0] + pair[1]);
        }
        element_lengths[0] = self.add_length_start + proportion_start * self.length_fraction_start * mid;
        element_lengths[k - 1] = self.add_length_end + proportion_end * self.length_fraction_end * mid;
        if k == 1 {
            magnitudes[0] = element_lengths[0];
            magnitudes[1] = element_lengths[0];
        } else {
            magnitudes[0] = element_lengths[0] * 2.0 - magnitudes[1];
            magnitudes[k] = element_lengths[k - 1] * 2.0 - magnitudes[k - 1];
        }
        (mid, element_lengths, magnitudes)
    }

    /// Executes the sampling.
    ///
    /// The first and last output points reproduce the first and last input
    /// positions exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two input points are given, the
    /// derivative arrays do not match the positions, `count` is zero or the
    /// length ratio is not positive.
    pub fn execute(&self) -> Result<SampledCurve> {
        self.validate()?;
        let nx = &self.positions;
        let nd1 = &self.d1;
        let last_in = nx.len() - 1;
        let zeros = vec![Vector3::zeros(); nx.len()];
        let nd3 = self.d3.as_ref().unwrap_or(&zeros);

        // Per input element: cumulative length and its own rescaled tangent pair.
        let mut lengths = Vec::with_capacity(nx.len());
        lengths.push(0.0);
        let mut tangent_pairs = Vec::with_capacity(last_in);
        let mut total = 0.0;
        for e in 0..last_in {
            let arc = solve_arc_length(&nx[e], &nd1[e], &nx[e + 1], &nd1[e + 1], true).length;
            tangent_pairs.push((set_magnitude(&nd1[e], arc), set_magnitude(&nd1[e + 1], arc)));
            total += arc;
            lengths.push(total);
        }

        let (mid, element_lengths, magnitudes) = self.element_lengths(total);

        let mut points = Vec::with_capacity(self.count + 1);
        let mut locations = Vec::with_capacity(self.count + 1);

        let start_tangent = tangent_pairs[0].0;
        let start_scale = scale_to(magnitudes[0], &start_tangent);
        points.push(SampledPoint {
            position: nx[0],
            d1: start_tangent * start_scale,
            d2: self.d2[0],
            d3: nd3[0],
        });
        locations.push(SampleLocation {
            element: 0,
            xi: 0.0,
            scale: start_scale,
        });

        let mut e = 0;
        let mut distance = 0.0;
        for n in 1..self.count {
            distance += element_lengths[n - 1];
            while e + 1 < last_in && distance >= lengths[e + 1] {
                e += 1;
            }
            let xi = ((distance - lengths[e]) / (lengths[e + 1] - lengths[e])).clamp(0.0, 1.0);
            let (a, b) = &tangent_pairs[e];
            let position = interpolate(&nx[e], a, &nx[e + 1], b, xi);
            let tangent = derivative(&nx[e], a, &nx[e + 1], b, xi);
            let scale = scale_to(magnitudes[n], &tangent);
            points.push(SampledPoint {
                position,
                d1: tangent * scale,
                d2: self.d2[e] * (1.0 - xi) + self.d2[e + 1] * xi,
                d3: nd3[e] * (1.0 - xi) + nd3[e + 1] * xi,
            });
            locations.push(SampleLocation { element: e, xi, scale });
        }

        let end_tangent = tangent_pairs[last_in - 1].1;
        let end_scale = scale_to(magnitudes[self.count], &end_tangent);
        points.push(SampledPoint {
            position: nx[last_in],
            d1: end_tangent * end_scale,
            d2: self.d2[last_in],
            d3: nd3[last_in],
        });
        locations.push(SampleLocation {
            element: last_in - 1,
            xi: 1.0,
            scale: end_scale,
        });

        Ok(SampledCurve {
            points,
            locations,
            element_length: mid,
        })
    }
}

/// Factor taking `tangent` to `magnitude`; zero for a degenerate tangent.
fn scale_to(magnitude: f64, tangent: &Vector3) -> f64 {
    let norm = tangent.norm();
    if norm < TOLERANCE {
        0.0
    } else {
        magnitude / norm
    }
}
