use crate::error::{GeometryError, Result};
use crate::math::arc_length::{gauss_arc_length, solve_arc_length};
use crate::math::hermite::{hermite_lagrange_start_derivative, lagrange_hermite_end_derivative};
use crate::math::{set_magnitude, Point3, Vector3};

/// How an interior derivative magnitude is derived from the two adjoining
/// element arc lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MagnitudeMode {
    #[default]
    ArithmeticMean,
    /// Weights toward the shorter adjoining element.
    HarmonicMean,
}

/// Options controlling derivative smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingOptions {
    /// Only magnitudes change; every direction is kept.
    pub fix_all_directions: bool,
    /// Keep the start derivative exactly as supplied.
    pub fix_start_derivative: bool,
    /// Keep the end derivative exactly as supplied.
    pub fix_end_derivative: bool,
    /// Keep the start direction, rescaling its magnitude.
    pub fix_start_direction: bool,
    /// Keep the end direction, rescaling its magnitude.
    pub fix_end_direction: bool,
    pub magnitude_mode: MagnitudeMode,
    pub max_iterations: usize,
    /// Relative to the mean element arc length.
    pub tolerance: f64,
}

impl Default for SmoothingOptions {
    fn default() -> Self {
        Self {
            fix_all_directions: false,
            fix_start_derivative: false,
            fix_end_derivative: false,
            fix_start_direction: false,
            fix_end_direction: false,
            magnitude_mode: MagnitudeMode::ArithmeticMean,
            max_iterations: 100,
            tolerance: 1.0e-6,
        }
    }
}

impl SmoothingOptions {
    fn start_direction_fixed(&self) -> bool {
        self.fix_all_directions || self.fix_start_direction
    }

    fn end_direction_fixed(&self) -> bool {
        self.fix_all_directions || self.fix_end_direction
    }

    fn any_end_constraint(&self) -> bool {
        self.fix_all_directions
            || self.fix_start_derivative
            || self.fix_end_derivative
            || self.fix_start_direction
            || self.fix_end_direction
    }
}

/// Result of a smoothing run.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedDerivatives {
    /// One derivative per input point.
    pub derivatives: Vec<Vector3>,
    pub iterations: usize,
    /// False when the iteration cap was reached first.
    pub converged: bool,
}

/// Iteratively relaxes derivatives along a sequence of points so they vary
/// smoothly and approximate the element arc lengths.
///
/// Positions are never modified.
#[derive(Debug, Clone)]
pub struct SmoothDerivatives {
    positions: Vec<Point3>,
    derivatives: Vec<Vector3>,
    closed: bool,
    options: SmoothingOptions,
}

impl SmoothDerivatives {
    /// Smoothing of an open chain of points.
    #[must_use]
    pub fn line(positions: Vec<Point3>, derivatives: Vec<Vector3>) -> Self {
        Self {
            positions,
            derivatives,
            closed: false,
            options: SmoothingOptions::default(),
        }
    }

    /// Smoothing of a closed loop; the first point follows the last.
    ///
    /// End constraints in the options do not apply to loops.
    #[must_use]
    pub fn closed_loop(positions: Vec<Point3>, derivatives: Vec<Vector3>) -> Self {
        Self {
            closed: true,
            ..Self::line(positions, derivatives)
        }
    }

    /// Sets the smoothing options.
    #[must_use]
    pub fn with_options(mut self, options: SmoothingOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes the smoothing.
    ///
    /// Never fails on non-convergence: the current estimate is returned and
    /// a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than two points or the derivative
    /// count differs from the point count.
    pub fn execute(&self) -> Result<SmoothedDerivatives> {
        let n = self.positions.len();
        if n < 2 {
            return Err(GeometryError::Degenerate("smoothing needs at least two points".into()).into());
        }
        if self.derivatives.len() != n {
            return Err(GeometryError::MismatchedLengths(format!(
                "{n} positions, {} derivatives",
                self.derivatives.len()
            ))
            .into());
        }
        if !self.closed && n == 2 {
            if let Some(derivatives) = self.single_element() {
                return Ok(SmoothedDerivatives {
                    derivatives,
                    iterations: 0,
                    converged: true,
                });
            }
        }
        Ok(self.relax())
    }

    fn single_element(&self) -> Option<Vec<Vector3>> {
        let x = &self.positions;
        let d = &self.derivatives;
        let opts = &self.options;
        if !opts.any_end_constraint() {
            let chord = x[1] - x[0];
            return Some(vec![chord, chord]);
        }
        if opts.fix_all_directions || (opts.fix_start_direction && opts.fix_end_direction) {
            let length = solve_arc_length(&x[0], &d[0], &x[1], &d[1], true).length;
            return Some(vec![set_magnitude(&d[0], length), set_magnitude(&d[1], length)]);
        }
        None
    }

    fn mean_magnitude(&self, before: f64, after: f64) -> f64 {
        match self.options.magnitude_mode {
            MagnitudeMode::ArithmeticMean => 0.5 * (before + after),
            MagnitudeMode::HarmonicMean => {
                if before <= 0.0 || after <= 0.0 {
                    0.0
                } else {
                    2.0 / (1.0 / before + 1.0 / after)
                }
            }
        }
    }

    fn relax_interior(&self, md: &mut [Vector3], arcs: &[f64], node: usize, prev: usize, next: usize) {
        let x = &self.positions;
        let (arc_before, arc_after) = (arcs[prev], arcs[node]);
        if !self.options.fix_all_directions {
            let dir_before = x[node] - x[prev];
            let dir_after = x[next] - x[node];
            let sum = arc_before + arc_after;
            if sum > 0.0 {
                // Each secant weighted by the opposite element's length.
                md[node] = dir_before * (arc_after / sum) + dir_after * (arc_before / sum);
            }
        }
        md[node] = set_magnitude(&md[node], self.mean_magnitude(arc_before, arc_after));
    }

    fn relax(&self) -> SmoothedDerivatives {
        let x = &self.positions;
        let nd = &self.derivatives;
        let opts = &self.options;
        let n = x.len();
        let elements = if self.closed { n } else { n - 1 };
        let mut md = nd.clone();

        for iteration in 0..opts.max_iterations {
            let last = md.clone();
            let arcs: Vec<f64> = (0..elements)
                .map(|e| {
                    let f = (e + 1) % n;
                    gauss_arc_length(&x[e], &md[e], &x[f], &md[f])
                })
                .collect();

            if self.closed {
                for node in 0..n {
                    let prev = (node + n - 1) % n;
                    self.relax_interior(&mut md, &arcs, node, prev, (node + 1) % n);
                }
            } else {
                if !opts.fix_start_derivative {
                    md[0] = if opts.start_direction_fixed() {
                        fixed_direction_end(&nd[0], arcs[0], &last[1])
                    } else {
                        hermite_lagrange_start_derivative(&x[0], &x[1], &last[1])
                    };
                }
                for node in 1..n - 1 {
                    self.relax_interior(&mut md, &arcs, node, node - 1, node + 1);
                }
                if !opts.fix_end_derivative {
                    md[n - 1] = if opts.end_direction_fixed() {
                        fixed_direction_end(&nd[n - 1], arcs[elements - 1], &last[n - 2])
                    } else {
                        lagrange_hermite_end_derivative(&x[n - 2], &last[n - 2], &x[n - 1])
                    };
                }
            }

            #[allow(clippy::cast_precision_loss)]
            let dtol = opts.tolerance * arcs.iter().sum::<f64>() / arcs.len() as f64;
            let settled = md
                .iter()
                .zip(&last)
                .all(|(now, before)| (now - before).iter().all(|c| c.abs() <= dtol));
            if settled {
                return SmoothedDerivatives {
                    derivatives: md,
                    iterations: iteration + 1,
                    converged: true,
                };
            }
        }

        tracing::warn!(
            iterations = opts.max_iterations,
            points = n,
            closed = self.closed,
            "derivative smoothing did not converge"
        );
        SmoothedDerivatives {
            derivatives: md,
            iterations: opts.max_iterations,
            converged: false,
        }
    }
}

fn fixed_direction_end(direction: &Vector3, arc: f64, neighbour: &Vector3) -> Vector3 {
    let magnitude = 2.0 * arc - neighbour.norm();
    if magnitude > 0.0 {
        set_magnitude(direction, magnitude)
    } else {
        Vector3::zeros()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn on_x(count: usize) -> Vec<Point3> {
        #[allow(clippy::cast_precision_loss)]
        (0..count).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect()
    }

    #[test]
    fn straight_line_settles_on_unit_derivatives() {
        let smoothed = SmoothDerivatives::line(on_x(4), vec![Vector3::new(0.5, 0.0, 0.0); 4])
            .execute()
            .unwrap();
        assert!(smoothed.converged);
        for d in &smoothed.derivatives {
            assert_relative_eq!(d.x, 1.0, epsilon = 1e-5);
            assert!(d.y.abs() < 1e-12 && d.z.abs() < 1e-12);
        }
    }

    #[test]
    fn iteration_cap_reports_not_converged() {
        let options = SmoothingOptions {
            max_iterations: 1,
            ..SmoothingOptions::default()
        };
        let smoothed = SmoothDerivatives::line(on_x(4), vec![Vector3::new(0.5, 0.0, 0.0); 4])
            .with_options(options)
            .execute()
            .unwrap();
        assert!(!smoothed.converged);
        assert_eq!(smoothed.iterations, 1);
    }

    #[test]
    fn fixed_start_derivative_is_untouched() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.5, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(3.0, -0.5, 0.0),
        ];
        let start = Vector3::new(0.0, 2.0, 0.0);
        let mut guess = vec![Vector3::new(1.0, 0.0, 0.0); 4];
        guess[0] = start;
        let options = SmoothingOptions {
            fix_start_derivative: true,
            ..SmoothingOptions::default()
        };
        let smoothed = SmoothDerivatives::line(positions, guess)
            .with_options(options)
            .execute()
            .unwrap();
        assert_eq!(smoothed.derivatives[0], start);
        assert!(smoothed.derivatives[3].norm() > 0.0);
    }

    #[test]
    fn fixed_directions_only_rescale() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 1.5, 0.0),
            Point3::new(4.0, 1.0, 0.0),
        ];
        let guess = vec![
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(1.0, 0.8, 0.0),
            Vector3::new(1.0, 0.1, 0.0),
            Vector3::new(2.0, -0.5, 0.0),
        ];
        let options = SmoothingOptions {
            fix_all_directions: true,
            ..SmoothingOptions::default()
        };
        let smoothed = SmoothDerivatives::line(positions, guess.clone())
            .with_options(options)
            .execute()
            .unwrap();
        for (out, input) in smoothed.derivatives.iter().zip(&guess) {
            assert!(out.cross(input).norm() < 1e-9 * out.norm().max(1.0));
            assert!(out.dot(input) > 0.0);
        }
    }

    #[test]
    fn harmonic_mean_favours_shorter_element() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        ];
        let guess = vec![Vector3::x(); 3];
        let arithmetic = SmoothDerivatives::line(positions.clone(), guess.clone())
            .execute()
            .unwrap();
        let harmonic = SmoothDerivatives::line(positions, guess)
            .with_options(SmoothingOptions {
                magnitude_mode: MagnitudeMode::HarmonicMean,
                ..SmoothingOptions::default()
            })
            .execute()
            .unwrap();
        assert!(harmonic.derivatives[1].norm() < arithmetic.derivatives[1].norm());
    }

    #[test]
    fn single_element_without_constraints_is_chord() {
        let positions = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 1.0, 0.0)];
        let smoothed = SmoothDerivatives::line(positions, vec![Vector3::x(); 2])
            .execute()
            .unwrap();
        assert_eq!(smoothed.derivatives, vec![Vector3::new(2.0, 1.0, 0.0); 2]);
    }

    #[test]
    fn single_element_with_fixed_directions_uses_arc_length() {
        let r = 1.0;
        let mag = 4.0 * r * (PI / 8.0).tan();
        let positions = vec![Point3::new(r, 0.0, 0.0), Point3::new(0.0, r, 0.0)];
        let smoothed = SmoothDerivatives::line(positions, vec![Vector3::y(), -Vector3::x()])
            .with_options(SmoothingOptions {
                fix_start_direction: true,
                fix_end_direction: true,
                ..SmoothingOptions::default()
            })
            .execute()
            .unwrap();
        let d0 = smoothed.derivatives[0];
        assert!(d0.x.abs() < 1e-12);
        assert_relative_eq!(d0.norm(), smoothed.derivatives[1].norm(), epsilon = 1e-12);
        assert!((d0.norm() - mag).abs() / mag < 0.01);
    }

    #[test]
    fn closed_loop_on_circle_is_uniform() {
        let count = 8;
        #[allow(clippy::cast_precision_loss)]
        let (positions, guess): (Vec<Point3>, Vec<Vector3>) = (0..count)
            .map(|i| {
                let a = 2.0 * PI * i as f64 / count as f64;
                (
                    Point3::new(a.cos(), a.sin(), 0.0),
                    Vector3::new(-a.sin(), a.cos(), 0.0) * 0.1,
                )
            })
            .unzip();
        let smoothed = SmoothDerivatives::closed_loop(positions, guess)
            .execute()
            .unwrap();
        assert!(smoothed.converged);
        let expected = PI / 4.0;
        let first = smoothed.derivatives[0].norm();
        for d in &smoothed.derivatives {
            assert!((d.norm() - first).abs() < 1e-9);
        }
        assert!((first - expected).abs() / expected < 0.01, "{first}");
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        assert!(SmoothDerivatives::line(on_x(3), vec![Vector3::x(); 2]).execute().is_err());
        assert!(SmoothDerivatives::closed_loop(on_x(1), vec![Vector3::x()]).execute().is_err());
    }
}
