use crate::math::{set_magnitude, Vector3};

/// Harmonic mean `n / sum(1 / m)` of `magnitudes`.
///
/// Returns zero for an empty slice or if any magnitude is not positive.
#[must_use]
pub fn harmonic_mean(magnitudes: &[f64]) -> f64 {
    if magnitudes.is_empty() || magnitudes.iter().any(|&m| m <= 0.0) {
        return 0.0;
    }
    let reciprocal_sum: f64 = magnitudes.iter().map(|m| 1.0 / m).sum();
    #[allow(clippy::cast_precision_loss)]
    let count = magnitudes.len() as f64;
    count / reciprocal_sum
}

/// Rescales every tangent to the harmonic mean of their magnitudes, keeping
/// each direction. Returns the common magnitude.
pub fn blend_tangents(tangents: &mut [Vector3]) -> f64 {
    let magnitudes: Vec<f64> = tangents.iter().map(Vector3::norm).collect();
    let mean = harmonic_mean(&magnitudes);
    for tangent in tangents.iter_mut() {
        *tangent = set_magnitude(tangent, mean);
    }
    mean
}
