//! Arc length of cubic Hermite curves by Gauss-Legendre quadrature, and the
//! iterative solve for derivatives scaled to arc length.

use super::hermite::{derivative, interpolate};
use super::{Point3, Vector3};

/// 3-point Gauss-Legendre abscissae mapped to `[0, 1]`:
/// `(1 - sqrt(0.6)) / 2, 0.5, (1 + sqrt(0.6)) / 2`.
pub const GAUSS_XI: [f64; 3] = [0.112_701_665_379_258_3, 0.5, 0.887_298_334_620_741_7];

/// Weights matching [`GAUSS_XI`]: `5/18, 4/9, 5/18`.
pub const GAUSS_WEIGHTS: [f64; 3] = [5.0 / 18.0, 4.0 / 9.0, 5.0 / 18.0];

/// Maximum iterations for [`solve_arc_length`].
pub const MAX_ARC_LENGTH_ITERATIONS: usize = 100;

/// Relative convergence tolerance for [`solve_arc_length`].
pub const ARC_LENGTH_TOLERANCE: f64 = 1.0e-6;

/// Iterations after which the arc-length update is damped.
const UNDAMPED_ITERATIONS: usize = 9;

/// Quadrature estimate of the arc length of the Hermite curve `v1, d1 → v2, d2`.
#[must_use]
pub fn gauss_arc_length(v1: &Point3, d1: &Vector3, v2: &Point3, d2: &Vector3) -> f64 {
    GAUSS_XI
        .iter()
        .zip(GAUSS_WEIGHTS)
        .map(|(&xi, w)| w * derivative(v1, d1, v2, d2, xi).norm())
        .sum()
}

/// Quadrature arc length of the curve from `xi = 0` up to `xi`.
#[must_use]
pub fn arc_length_to_xi(v1: &Point3, d1: &Vector3, v2: &Point3, d2: &Vector3, xi: f64) -> f64 {
    // Reparameterize the sub-curve [0, xi] onto [0, 1].
    let d1m = d1 * xi;
    let v2m = interpolate(v1, d1, v2, d2, xi);
    let d2m = derivative(v1, d1, v2, d2, xi) * xi;
    gauss_arc_length(v1, &d1m, &v2m, &d2m)
}

/// Outcome of [`solve_arc_length`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcLengthSolution {
    /// Final arc length estimate.
    pub length: f64,
    /// Number of quadrature evaluations performed.
    pub iterations: usize,
    /// Whether the relative change fell below [`ARC_LENGTH_TOLERANCE`].
    pub converged: bool,
}

/// Solves for the arc length `L` such that the curve with unit end tangents
/// scaled to `L` has quadrature length `L`.
///
/// With `rescale` the estimate is seeded from the chord `|v2 - v1|`,
/// otherwise from the quadrature length with the derivatives as given.
/// Non-convergence is logged and the last estimate returned.
#[must_use]
pub fn solve_arc_length(
    v1: &Point3,
    d1: &Vector3,
    v2: &Point3,
    d2: &Vector3,
    rescale: bool,
) -> ArcLengthSolution {
    let mut last = if rescale {
        (v2 - v1).norm()
    } else {
        gauss_arc_length(v1, d1, v2, d2)
    };
    let u1 = d1.normalize();
    let u2 = d2.normalize();
    let mut length = last;
    for iteration in 0..MAX_ARC_LENGTH_ITERATIONS {
        length = gauss_arc_length(v1, &(u1 * last), v2, &(u2 * last));
        if iteration > UNDAMPED_ITERATIONS {
            length = 0.8 * length + 0.2 * last;
        }
        if (length - last).abs() < ARC_LENGTH_TOLERANCE * length {
            return ArcLengthSolution {
                length,
                iterations: iteration + 1,
                converged: true,
            };
        }
        last = length;
    }
    tracing::warn!(
        length,
        iterations = MAX_ARC_LENGTH_ITERATIONS,
        "arc length solve did not converge, using last estimate"
    );
    ArcLengthSolution {
        length,
        iterations: MAX_ARC_LENGTH_ITERATIONS,
        converged: false,
    }
}

/// Total quadrature length of the piecewise Hermite curve through `points`.
///
/// A `closed` curve includes the element from the last point back to the first.
#[must_use]
pub fn curves_length(points: &[Point3], derivatives: &[Vector3], closed: bool) -> f64 {
    let count = points.len();
    let elements = if closed { count } else { count.saturating_sub(1) };
    (0..elements)
        .map(|e| {
            let n = (e + 1) % count;
            gauss_arc_length(&points[e], &derivatives[e], &points[n], &derivatives[n])
        })
        .sum()
}

/// A position found on a piecewise curve by [`point_at_arc_distance`].
#[derive(Debug, Clone, Copy)]
pub struct CurvePoint {
    pub position: Point3,
    pub derivative: Vector3,
    /// Index of the element containing the point.
    pub element: usize,
    pub xi: f64,
}

/// Locates the point at `distance` along the piecewise Hermite curve, using
/// the supplied derivatives without rescaling.
///
/// Distances before the start or past the end are clamped to the first or
/// last point. Each element is searched by damped Newton iteration on
/// [`arc_length_to_xi`]; non-convergence is logged.
#[must_use]
pub fn point_at_arc_distance(points: &[Point3], derivatives: &[Vector3], distance: f64) -> CurvePoint {
    const XI_DELTA: f64 = 1.0e-6;
    const XI_TOLERANCE: f64 = 1.0e-6;

    let elements = points.len().saturating_sub(1);
    if distance < 0.0 || elements == 0 {
        return CurvePoint {
            position: points[0],
            derivative: derivatives[0],
            element: 0,
            xi: 0.0,
        };
    }
    let mut length = 0.0;
    for e in 0..elements {
        let (v1, d1, v2, d2) = (&points[e], &derivatives[e], &points[e + 1], &derivatives[e + 1]);
        let part = distance - length;
        let arc = gauss_arc_length(v1, d1, v2, d2);
        if part <= arc {
            let mut xi = part / arc;
            let mut limit = 0.1;
            let mut dist = 0.0;
            for iteration in 0..100 {
                let last_xi = xi;
                dist = arc_length_to_xi(v1, d1, v2, d2, xi);
                let dist_p = arc_length_to_xi(v1, d1, v2, d2, xi + XI_DELTA);
                let mut dist_m = arc_length_to_xi(v1, d1, v2, d2, xi - XI_DELTA);
                if xi - XI_DELTA < 0.0 {
                    dist_m = -dist_m;
                }
                let dxi = (2.0 * XI_DELTA / (dist_p - dist_m) * (part - dist)).clamp(-limit, limit);
                xi += dxi;
                if (xi - last_xi).abs() <= XI_TOLERANCE {
                    return CurvePoint {
                        position: interpolate(v1, d1, v2, d2, xi),
                        derivative: derivative(v1, d1, v2, d2, xi),
                        element: e,
                        xi,
                    };
                }
                if matches!(iteration, 4 | 10 | 25 | 62) {
                    limit *= 0.5;
                }
            }
            tracing::warn!(
                element = e,
                xi,
                closeness = (dist - part).abs(),
                "arc distance search did not converge"
            );
            return CurvePoint {
                position: *v2,
                derivative: *d2,
                element: e,
                xi,
            };
        }
        length += arc;
    }
    CurvePoint {
        position: points[elements],
        derivative: derivatives[elements],
        element: elements - 1,
        xi: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    /// Hermite quarter circle of radius `r` in the xy plane.
    fn quarter_circle(r: f64) -> (Point3, Vector3, Point3, Vector3) {
        let mag = 4.0 * r * (PI / 8.0).tan();
        (p(r, 0.0, 0.0), v(0.0, mag, 0.0), p(0.0, r, 0.0), v(-mag, 0.0, 0.0))
    }

    #[test]
    fn gauss_weights_sum_to_one() {
        assert_relative_eq!(GAUSS_WEIGHTS.iter().sum::<f64>(), 1.0, epsilon = 1e-15);
        assert_relative_eq!(GAUSS_XI[0], (1.0 - 0.6_f64.sqrt()) / 2.0, epsilon = 1e-15);
        assert_relative_eq!(GAUSS_XI[2], (1.0 + 0.6_f64.sqrt()) / 2.0, epsilon = 1e-15);
    }

    #[test]
    fn quarter_circle_length_within_tenth_percent() {
        let r = 2.0;
        let (v1, d1, v2, d2) = quarter_circle(r);
        let len = gauss_arc_length(&v1, &d1, &v2, &d2);
        let exact = FRAC_PI_2 * r;
        assert!(((len - exact) / exact).abs() < 1.0e-3, "len {len} vs {exact}");
    }

    #[test]
    fn straight_segment_solves_in_one_iteration() {
        let v1 = p(1.0, 1.0, 1.0);
        let v2 = p(4.0, 5.0, 1.0);
        let d = v2 - v1;
        let solution = solve_arc_length(&v1, &d, &v2, &d, true);
        assert!(solution.converged);
        assert_eq!(solution.iterations, 1);
        assert_relative_eq!(solution.length, 5.0, epsilon = 1e-12);

        let unscaled = solve_arc_length(&v1, &(d * 0.1), &v2, &(d * 7.0), true);
        assert_relative_eq!(unscaled.length, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn curved_segment_converges_without_rescale_seed() {
        let (v1, d1, v2, d2) = quarter_circle(1.0);
        let seeded = solve_arc_length(&v1, &d1, &v2, &d2, false);
        let chord = solve_arc_length(&v1, &d1, &v2, &d2, true);
        assert!(seeded.converged && chord.converged);
        assert_relative_eq!(seeded.length, chord.length, max_relative = 1e-5);
        assert!(chord.length > 2.0_f64.sqrt());
    }

    #[test]
    fn antiparallel_tangents_need_damped_iterations() {
        let result = solve_arc_length(
            &p(0.0, 0.0, 0.0),
            &v(1.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &v(-1.0, 0.0, 0.0),
            true,
        );
        assert!(result.converged);
        assert!(result.iterations > UNDAMPED_ITERATIONS + 1, "{result:?}");
        assert!(result.length > 1.0 && result.length < 1.5);
    }

    #[test]
    fn collapsed_element_stops_at_iteration_cap() {
        let origin = p(0.0, 0.0, 0.0);
        let tangent = v(2.0, 0.0, 0.0);
        let result = solve_arc_length(&origin, &tangent, &origin, &tangent, false);
        assert!(!result.converged);
        assert_eq!(result.iterations, MAX_ARC_LENGTH_ITERATIONS);
        assert!(result.length.is_finite() && result.length >= 0.0);
    }

    #[test]
    fn partial_arc_length_is_proportional_on_straight_line() {
        let v1 = p(0.0, 0.0, 0.0);
        let v2 = p(10.0, 0.0, 0.0);
        let d = v(10.0, 0.0, 0.0);
        assert_relative_eq!(arc_length_to_xi(&v1, &d, &v2, &d, 0.3), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn curves_length_closed_adds_return_element() {
        let points = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)];
        let derivatives = [v(1.0, 0.0, 0.0), v(0.0, 1.0, 0.0), v(-1.0, -1.0, 0.0)];
        let open = curves_length(&points, &derivatives, false);
        let closed = curves_length(&points, &derivatives, true);
        assert!(closed > open + 1.0);
    }

    #[test]
    fn point_at_distance_on_straight_polyline() {
        let points = [p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(5.0, 0.0, 0.0)];
        let derivatives = [v(2.0, 0.0, 0.0), v(2.0, 0.0, 0.0), v(3.0, 0.0, 0.0)];
        let found = point_at_arc_distance(&points, &derivatives, 3.5);
        assert_eq!(found.element, 1);
        assert!((found.position.x - 3.5).abs() < 1e-5, "{:?}", found.position);

        let past = point_at_arc_distance(&points, &derivatives, 99.0);
        assert_eq!(past.position, points[2]);
        let before = point_at_arc_distance(&points, &derivatives, -1.0);
        assert_eq!(before.position, points[0]);
    }
}
