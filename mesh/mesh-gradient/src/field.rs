//! Per-face gradient field representation.

// Face counts don't overflow f64 mantissa in practice
#![allow(clippy::cast_precision_loss)]

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{GradientError, GradientResult};
use crate::params::ZeroGradientPolicy;

/// Per-face gradient vectors and their magnitudes.
///
/// Magnitudes always describe the raw gradient, even after the vectors have
/// been normalized.
///
/// A magnitude counts as zero when it is at most the given tolerance or NaN;
/// [`normalize`](Self::normalize) and [`zero_count`](Self::zero_count) share
/// that test. The magnitude statistics ignore non-finite values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GradientField {
    /// Gradient vector for each face.
    vectors: Vec<Vector3<f64>>,
    /// Euclidean length of the raw gradient for each face.
    magnitudes: Vec<f64>,
    /// Whether `vectors` holds unit directions.
    normalized: bool,
}

impl GradientField {
    /// Create a field from raw per-face gradients.
    #[must_use]
    pub fn from_vectors(vectors: Vec<Vector3<f64>>) -> Self {
        let magnitudes = vectors.iter().map(Vector3::norm).collect();
        Self {
            vectors,
            magnitudes,
            normalized: false,
        }
    }

    /// Get the gradient of a face.
    ///
    /// Returns `None` if the index is out of bounds.
    #[inline]
    #[must_use]
    pub fn vector(&self, face: usize) -> Option<Vector3<f64>> {
        self.vectors.get(face).copied()
    }

    /// Get the raw gradient magnitude of a face.
    ///
    /// Returns `None` if the index is out of bounds.
    #[inline]
    #[must_use]
    pub fn magnitude(&self, face: usize) -> Option<f64> {
        self.magnitudes.get(face).copied()
    }

    /// All gradient vectors.
    #[inline]
    #[must_use]
    pub fn vectors(&self) -> &[Vector3<f64>] {
        &self.vectors
    }

    /// All raw gradient magnitudes.
    #[inline]
    #[must_use]
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    /// Whether the vectors are unit directions.
    #[inline]
    #[must_use]
    pub const fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Get the number of faces.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Check if the field is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Consume and return the vectors.
    #[must_use]
    pub fn into_vectors(self) -> Vec<Vector3<f64>> {
        self.vectors
    }

    /// Replace every vector by its unit direction.
    ///
    /// Faces whose magnitude is not above `tolerance` are handled by `policy`.
    /// Returns the number of faces that needed the zero policy.
    ///
    /// # Errors
    ///
    /// Returns [`GradientError::ZeroGradientNormalization`] for the first
    /// zero face when `policy` is [`ZeroGradientPolicy::Fail`]. The field is
    /// left unchanged in that case.
    pub fn normalize(
        &mut self,
        policy: ZeroGradientPolicy,
        tolerance: f64,
    ) -> GradientResult<usize> {
        if self.normalized {
            return Ok(0);
        }

        if policy == ZeroGradientPolicy::Fail {
            if let Some(face) = self.magnitudes.iter().position(|&m| is_zero(m, tolerance)) {
                return Err(GradientError::ZeroGradientNormalization { face });
            }
        }

        let mut zeros = 0;
        for (v, &m) in self.vectors.iter_mut().zip(&self.magnitudes) {
            if is_zero(m, tolerance) {
                zeros += 1;
                *v = match policy {
                    ZeroGradientPolicy::Fallback(fallback) => fallback,
                    ZeroGradientPolicy::ZeroVector | ZeroGradientPolicy::Fail => Vector3::zeros(),
                };
            } else {
                *v /= m;
            }
        }

        self.normalized = true;
        Ok(zeros)
    }

    /// Return a normalized copy of the field.
    ///
    /// # Errors
    ///
    /// See [`GradientField::normalize`].
    pub fn normalized(&self, policy: ZeroGradientPolicy, tolerance: f64) -> GradientResult<Self> {
        let mut out = self.clone();
        out.normalize(policy, tolerance)?;
        Ok(out)
    }

    /// Largest finite raw magnitude, or 0 if there is none.
    #[must_use]
    pub fn max_magnitude(&self) -> f64 {
        self.finite_magnitudes().fold(0.0, f64::max)
    }

    /// Mean of the finite raw magnitudes, or 0 if there are none.
    #[must_use]
    pub fn mean_magnitude(&self) -> f64 {
        let (sum, count) = self
            .finite_magnitudes()
            .fold((0.0, 0usize), |(sum, count), m| (sum + m, count + 1));
        if count == 0 { 0.0 } else { sum / count as f64 }
    }

    /// Count faces whose raw magnitude is zero under `tolerance`.
    ///
    /// Matches the faces [`normalize`](Self::normalize) hands to its policy.
    #[must_use]
    pub fn zero_count(&self, tolerance: f64) -> usize {
        self.magnitudes
            .iter()
            .filter(|&&m| is_zero(m, tolerance))
            .count()
    }

    fn finite_magnitudes(&self) -> impl Iterator<Item = f64> + '_ {
        self.magnitudes.iter().copied().filter(|m| m.is_finite())
    }

    /// Iterate over `(face index, vector)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Vector3<f64>)> + '_ {
        self.vectors.iter().copied().enumerate()
    }
}

fn is_zero(magnitude: f64, tolerance: f64) -> bool {
    magnitude.is_nan() || magnitude <= tolerance
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> GradientField {
        GradientField::from_vectors(vec![
            Vector3::new(3.0, 4.0, 0.0),
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, -2.0),
        ])
    }

    #[test]
    fn magnitudes_computed() {
        let field = sample();
        assert_eq!(field.len(), 3);
        assert_relative_eq!(field.magnitude(0).unwrap(), 5.0);
        assert_relative_eq!(field.magnitude(1).unwrap(), 0.0);
        assert_relative_eq!(field.magnitude(2).unwrap(), 2.0);
        assert!(field.magnitude(3).is_none());
        assert!(!field.is_normalized());
    }

    #[test]
    fn normalize_zero_vector_policy() {
        let mut field = sample();
        let zeros = field.normalize(ZeroGradientPolicy::ZeroVector, 0.0).unwrap();

        assert_eq!(zeros, 1);
        assert!(field.is_normalized());
        assert_relative_eq!(field.vector(0).unwrap(), Vector3::new(0.6, 0.8, 0.0));
        assert_eq!(field.vector(1).unwrap(), Vector3::zeros());
        assert_relative_eq!(field.vector(2).unwrap(), Vector3::new(0.0, 0.0, -1.0));

        // Magnitudes still describe the raw field.
        assert_relative_eq!(field.magnitude(0).unwrap(), 5.0);
    }

    #[test]
    fn normalize_fallback_policy() {
        let field = sample()
            .normalized(ZeroGradientPolicy::Fallback(Vector3::z()), 0.0)
            .unwrap();
        assert_eq!(field.vector(1).unwrap(), Vector3::z());
    }

    #[test]
    fn normalize_fail_policy() {
        let mut field = sample();
        let err = field.normalize(ZeroGradientPolicy::Fail, 0.0).unwrap_err();

        assert!(matches!(
            err,
            GradientError::ZeroGradientNormalization { face: 1 }
        ));
        // Untouched on failure.
        assert!(!field.is_normalized());
        assert_eq!(field.vector(0).unwrap(), Vector3::new(3.0, 4.0, 0.0));
    }

    #[test]
    fn tolerance_treats_small_as_zero() {
        let mut field = GradientField::from_vectors(vec![Vector3::new(1e-10, 0.0, 0.0)]);
        let zeros = field.normalize(ZeroGradientPolicy::ZeroVector, 1e-8).unwrap();
        assert_eq!(zeros, 1);
        assert_eq!(field.vector(0).unwrap(), Vector3::zeros());
    }

    #[test]
    fn normalize_twice_is_noop() {
        let mut field = sample();
        field.normalize(ZeroGradientPolicy::ZeroVector, 0.0).unwrap();
        let before = field.clone();
        assert_eq!(field.normalize(ZeroGradientPolicy::Fail, 0.0).unwrap(), 0);
        assert_eq!(field, before);
    }

    #[test]
    fn statistics() {
        let field = sample();
        assert_relative_eq!(field.max_magnitude(), 5.0);
        assert_relative_eq!(field.mean_magnitude(), 7.0 / 3.0);
        assert_eq!(field.zero_count(0.0), 1);

        let empty = GradientField::from_vectors(Vec::new());
        assert!(empty.is_empty());
        assert_relative_eq!(empty.max_magnitude(), 0.0);
        assert_relative_eq!(empty.mean_magnitude(), 0.0);
    }

    #[test]
    fn non_finite_magnitudes() {
        let mut field = GradientField::from_vectors(vec![
            Vector3::new(f64::NAN, 0.0, 0.0),
            Vector3::new(f64::INFINITY, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(4.0, 0.0, 0.0),
        ]);

        // Statistics skip NaN and infinity.
        assert_relative_eq!(field.max_magnitude(), 4.0);
        assert_relative_eq!(field.mean_magnitude(), 3.0);

        // NaN is zero for both counting and normalizing.
        assert_eq!(field.zero_count(0.0), 1);
        let zeros = field.normalize(ZeroGradientPolicy::ZeroVector, 0.0).unwrap();
        assert_eq!(zeros, field.zero_count(0.0));
        assert_eq!(field.vector(0).unwrap(), Vector3::zeros());
    }

    #[test]
    fn iter_pairs() {
        let field = sample();
        let pairs: Vec<_> = field.iter().collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2].0, 2);
    }
}
