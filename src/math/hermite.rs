//! Cubic Hermite and quadratic Hermite-Lagrange basis evaluation.
//!
//! All functions are pure. `xi` is the local element coordinate, nominally in
//! `[0, 1]`; derivatives are with respect to `xi`. Zero-length inputs are a
//! caller precondition and are not validated.

use super::{Point3, Vector3};

/// Cubic Hermite basis values `[f1, f2, f3, f4]` weighting `v1, d1, v2, d2` at `xi`.
#[must_use]
pub fn hermite_basis(xi: f64) -> [f64; 4] {
    let xi2 = xi * xi;
    let xi3 = xi2 * xi;
    [
        1.0 - 3.0 * xi2 + 2.0 * xi3,
        xi - 2.0 * xi2 + xi3,
        3.0 * xi2 - 2.0 * xi3,
        -xi2 + xi3,
    ]
}

/// First derivatives of the cubic Hermite basis with respect to `xi`.
#[must_use]
pub fn hermite_basis_derivatives(xi: f64) -> [f64; 4] {
    let xi2 = xi * xi;
    [
        -6.0 * xi + 6.0 * xi2,
        1.0 - 4.0 * xi + 3.0 * xi2,
        6.0 * xi - 6.0 * xi2,
        -2.0 * xi + 3.0 * xi2,
    ]
}

/// Second derivatives of the cubic Hermite basis with respect to `xi`.
#[must_use]
pub fn hermite_basis_second_derivatives(xi: f64) -> [f64; 4] {
    [
        -6.0 + 12.0 * xi,
        -4.0 + 6.0 * xi,
        6.0 - 12.0 * xi,
        -2.0 + 6.0 * xi,
    ]
}

fn blend(f: [f64; 4], v1: &Point3, d1: &Vector3, v2: &Point3, d2: &Vector3) -> Vector3 {
    v1.coords * f[0] + d1 * f[1] + v2.coords * f[2] + d2 * f[3]
}

/// Position on the cubic Hermite curve from `v1, d1` to `v2, d2` at `xi`.
///
/// Reproduces `v1` at `xi = 0` and `v2` at `xi = 1` exactly.
#[must_use]
pub fn interpolate(v1: &Point3, d1: &Vector3, v2: &Point3, d2: &Vector3, xi: f64) -> Point3 {
    Point3::from(blend(hermite_basis(xi), v1, d1, v2, d2))
}

/// Tangent (dx/dxi) of the cubic Hermite curve at `xi`.
///
/// Reproduces `d1` at `xi = 0` and `d2` at `xi = 1` exactly.
#[must_use]
pub fn derivative(v1: &Point3, d1: &Vector3, v2: &Point3, d2: &Vector3, xi: f64) -> Vector3 {
    blend(hermite_basis_derivatives(xi), v1, d1, v2, d2)
}

/// Second derivative (d²x/dxi²) of the cubic Hermite curve at `xi`.
#[must_use]
pub fn second_derivative(
    v1: &Point3,
    d1: &Vector3,
    v2: &Point3,
    d2: &Vector3,
    xi: f64,
) -> Vector3 {
    blend(hermite_basis_second_derivatives(xi), v1, d1, v2, d2)
}

/// Signed curvature in the direction of `radial` (assumed unit and normal to
/// the tangent): `dot(x'', radial) / |x'|²`.
#[must_use]
pub fn curvature(
    v1: &Point3,
    d1: &Vector3,
    v2: &Point3,
    d2: &Vector3,
    radial: &Vector3,
    xi: f64,
) -> f64 {
    let tangent = derivative(v1, d1, v2, d2, xi);
    let d_tangent = second_derivative(v1, d1, v2, d2, xi);
    d_tangent.dot(radial) / tangent.norm_squared()
}

/// Unsigned curvature `|x' × x''| / |x'|³`, zero where the tangent vanishes.
#[must_use]
pub fn curvature_simple(v1: &Point3, d1: &Vector3, v2: &Point3, d2: &Vector3, xi: f64) -> f64 {
    let tangent = derivative(v1, d1, v2, d2, xi);
    let mag = tangent.norm();
    if mag > 0.0 {
        let d_tangent = second_derivative(v1, d1, v2, d2, xi);
        tangent.cross(&d_tangent).norm() / (mag * mag * mag)
    } else {
        0.0
    }
}

/// Curvature at each point of a piecewise Hermite curve, averaging the
/// values from the element before and after the point.
///
/// `radials` must hold one unit radial vector per point.
#[must_use]
pub fn curvatures_along_curve(
    points: &[Point3],
    derivatives: &[Vector3],
    radials: &[Vector3],
    closed: bool,
) -> Vec<f64> {
    let count = points.len();
    let mut curvatures = Vec::with_capacity(count);
    for i in 0..count {
        let mut kappa = None;
        if i > 0 || closed {
            let m = (i + count - 1) % count;
            kappa = Some(curvature(
                &points[m],
                &derivatives[m],
                &points[i],
                &derivatives[i],
                &radials[i],
                1.0,
            ));
        }
        if i + 1 < count || closed {
            let p = (i + 1) % count;
            let kappa_p = curvature(
                &points[i],
                &derivatives[i],
                &points[p],
                &derivatives[p],
                &radials[i],
                0.0,
            );
            kappa = Some(kappa.map_or(kappa_p, |k| 0.5 * (k + kappa_p)));
        }
        curvatures.push(kappa.unwrap_or(0.0));
    }
    curvatures
}

/// Quadratic interpolation from `v1, d1` to `v2` (Hermite at the start, Lagrange at the end).
#[must_use]
pub fn hermite_lagrange(v1: &Point3, d1: &Vector3, v2: &Point3, xi: f64) -> Point3 {
    let xi2 = xi * xi;
    Point3::from(v1.coords * (1.0 - xi2) + d1 * (xi - xi2) + v2.coords * xi2)
}

/// Derivative of [`hermite_lagrange`] with respect to `xi`.
#[must_use]
pub fn hermite_lagrange_derivative(v1: &Point3, d1: &Vector3, v2: &Point3, xi: f64) -> Vector3 {
    v1.coords * (-2.0 * xi) + d1 * (1.0 - 2.0 * xi) + v2.coords * (2.0 * xi)
}

/// Quadratic interpolation from `v1` to `v2, d2` (Lagrange at the start, Hermite at the end).
#[must_use]
pub fn lagrange_hermite(v1: &Point3, v2: &Point3, d2: &Vector3, xi: f64) -> Point3 {
    let xi2 = xi * xi;
    Point3::from(
        v1.coords * (1.0 - 2.0 * xi + xi2) + v2.coords * (2.0 * xi - xi2) + d2 * (-xi + xi2),
    )
}

/// Derivative of [`lagrange_hermite`] with respect to `xi`.
#[must_use]
pub fn lagrange_hermite_derivative(v1: &Point3, v2: &Point3, d2: &Vector3, xi: f64) -> Vector3 {
    v1.coords * (-2.0 + 2.0 * xi) + v2.coords * (2.0 - 2.0 * xi) + d2 * (-1.0 + 2.0 * xi)
}

/// Derivative at `v2` of the quadratic through `v1` with derivative `d1`
/// and through `v2`. Bootstraps an unknown end tangent.
#[must_use]
pub fn lagrange_hermite_end_derivative(v1: &Point3, d1: &Vector3, v2: &Point3) -> Vector3 {
    hermite_lagrange_derivative(v1, d1, v2, 1.0)
}

/// Derivative at `v1` of the quadratic through `v1` and through `v2` with
/// derivative `d2`. Mirror of [`lagrange_hermite_end_derivative`].
#[must_use]
pub fn hermite_lagrange_start_derivative(v1: &Point3, v2: &Point3, d2: &Vector3) -> Vector3 {
    lagrange_hermite_derivative(v1, v2, d2, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::TOLERANCE;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    #[test]
    fn endpoints_are_reproduced_exactly() {
        let cases = [
            (p(0.1, -2.3, 4.7), v(1.3, 0.2, -5.0), p(9.9, 1.1, 0.3), v(-0.7, 8.1, 2.2)),
            (p(-1e3, 3.3, 0.0), v(0.0, 0.0, 1e-4), p(7.0, 7.0, 7.0), v(123.0, -4.5, 6.0)),
        ];
        for (v1, d1, v2, d2) in &cases {
            assert_eq!(interpolate(v1, d1, v2, d2, 0.0), *v1);
            assert_eq!(interpolate(v1, d1, v2, d2, 1.0), *v2);
            assert_eq!(derivative(v1, d1, v2, d2, 0.0), *d1);
            assert_eq!(derivative(v1, d1, v2, d2, 1.0), *d2);
        }
    }

    #[test]
    fn straight_line_with_chord_tangents_is_linear() {
        let v1 = p(0.0, 0.0, 0.0);
        let v2 = p(2.0, 0.0, 0.0);
        let d = v(2.0, 0.0, 0.0);
        let mid = interpolate(&v1, &d, &v2, &d, 0.5);
        assert!((mid - p(1.0, 0.0, 0.0)).norm() < TOLERANCE);
        assert!(second_derivative(&v1, &d, &v2, &d, 0.3).norm() < TOLERANCE);
    }

    #[test]
    fn basis_partitions_unity() {
        for i in 0..=10 {
            let xi = f64::from(i) / 10.0;
            let f = hermite_basis(xi);
            assert_relative_eq!(f[0] + f[2], 1.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn circle_curvature_is_reciprocal_radius() {
        // Hermite quarter circle of radius 2 about the origin.
        let r = 2.0;
        let mag = 4.0 * r * (std::f64::consts::PI / 8.0).tan();
        let v1 = p(r, 0.0, 0.0);
        let v2 = p(0.0, r, 0.0);
        let d1 = v(0.0, mag, 0.0);
        let d2 = v(-mag, 0.0, 0.0);
        let radial = v(-1.0, 0.0, 0.0);
        let k = curvature(&v1, &d1, &v2, &d2, &radial, 0.0);
        assert!((k - 1.0 / r).abs() < 0.05, "curvature {k}");
        let ks = curvature_simple(&v1, &d1, &v2, &d2, 0.0);
        assert_relative_eq!(ks, k.abs(), epsilon = 1e-12);
    }

    #[test]
    fn quadratic_end_fit_matches_parabola() {
        // x(xi) = xi, y(xi) = xi^2 has d1 = (1, 0) at start and (1, 2) at end.
        let v1 = p(0.0, 0.0, 0.0);
        let v2 = p(1.0, 1.0, 0.0);
        let d1 = v(1.0, 0.0, 0.0);
        let d2 = lagrange_hermite_end_derivative(&v1, &d1, &v2);
        assert!((d2 - v(1.0, 2.0, 0.0)).norm() < TOLERANCE);
        let back = hermite_lagrange_start_derivative(&v1, &v2, &d2);
        assert!((back - d1).norm() < TOLERANCE);
        assert!((hermite_lagrange(&v1, &d1, &v2, 0.5) - p(0.5, 0.25, 0.0)).norm() < TOLERANCE);
        assert!((lagrange_hermite(&v1, &v2, &d2, 0.5) - p(0.5, 0.25, 0.0)).norm() < TOLERANCE);
    }

    #[test]
    fn curvatures_of_straight_polyline_are_zero() {
        let points = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)];
        let derivatives = vec![v(1.0, 0.0, 0.0); 3];
        let radials = vec![v(0.0, 1.0, 0.0); 3];
        let ks = curvatures_along_curve(&points, &derivatives, &radials, false);
        assert_eq!(ks.len(), 3);
        assert!(ks.iter().all(|k| k.abs() < TOLERANCE));
    }
}
