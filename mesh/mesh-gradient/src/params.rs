//! Parameters for operator assembly and gradient field computation.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for building a [`GradientOperator`](crate::GradientOperator).
///
/// # Example
///
/// ```
/// use mesh_gradient::OperatorParams;
///
/// let params = OperatorParams::default();
/// assert!(params.parallel);
///
/// let serial = OperatorParams::serial();
/// assert!(!serial.parallel);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OperatorParams {
    /// Relative area threshold. A face whose twice-area is at most this
    /// times its squared longest edge is rejected as degenerate.
    pub degenerate_tolerance: f64,

    /// Whether to assemble triplets in parallel (via rayon).
    pub parallel: bool,

    /// Minimum face count before the parallel path is taken.
    pub parallel_threshold: usize,
}

impl Default for OperatorParams {
    fn default() -> Self {
        Self {
            degenerate_tolerance: 1e-12,
            parallel: true,
            parallel_threshold: 4096,
        }
    }
}

impl OperatorParams {
    /// Single-threaded assembly regardless of mesh size.
    #[must_use]
    pub const fn serial() -> Self {
        Self {
            degenerate_tolerance: 1e-12,
            parallel: false,
            parallel_threshold: 4096,
        }
    }

    /// Reject slivers much more aggressively than the default.
    ///
    /// Useful when the operator feeds a solver that is sensitive to badly
    /// shaped triangles.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            degenerate_tolerance: 1e-6,
            parallel: true,
            parallel_threshold: 4096,
        }
    }

    /// Set the degeneracy tolerance.
    #[must_use]
    pub const fn with_degenerate_tolerance(mut self, tolerance: f64) -> Self {
        self.degenerate_tolerance = tolerance;
        self
    }

    /// Enable or disable parallel assembly.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the face count at which parallel assembly kicks in.
    #[must_use]
    pub const fn with_parallel_threshold(mut self, faces: usize) -> Self {
        self.parallel_threshold = faces;
        self
    }

    /// Whether a mesh with `face_count` faces is assembled in parallel.
    #[must_use]
    pub const fn use_parallel(&self, face_count: usize) -> bool {
        self.parallel && face_count >= self.parallel_threshold
    }
}

/// What to emit when a zero gradient is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ZeroGradientPolicy {
    /// Emit the zero vector.
    #[default]
    ZeroVector,

    /// Emit a fixed vector supplied by the caller.
    Fallback(Vector3<f64>),

    /// Return [`GradientError::ZeroGradientNormalization`](crate::GradientError::ZeroGradientNormalization).
    Fail,
}

/// Parameters for computing and storing a gradient field.
///
/// # Example
///
/// ```
/// use mesh_gradient::{GradientParams, ZeroGradientPolicy};
///
/// let params = GradientParams::for_attribute("v:height")
///     .with_magnitude_attribute("f:height_grad_mag")
///     .with_zero_policy(ZeroGradientPolicy::Fail);
///
/// assert!(params.normalize);
/// assert_eq!(params.scalar_attribute, "v:height");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GradientParams {
    /// Replace each gradient with its unit direction.
    pub normalize: bool,

    /// Handling of zero gradients when normalizing.
    pub zero_policy: ZeroGradientPolicy,

    /// Magnitudes at or below this are treated as zero when normalizing.
    pub zero_tolerance: f64,

    /// Per-vertex scalar attribute to differentiate.
    pub scalar_attribute: String,

    /// Per-face vector attribute that receives the gradient.
    pub vector_attribute: String,

    /// Value the vector attribute is filled with when first created.
    pub vector_default: Vector3<f64>,

    /// Per-face scalar attribute that receives the magnitude, if any.
    pub magnitude_attribute: Option<String>,
}

impl Default for GradientParams {
    fn default() -> Self {
        Self {
            normalize: true,
            zero_policy: ZeroGradientPolicy::ZeroVector,
            zero_tolerance: 0.0,
            scalar_attribute: "v:scalar".to_string(),
            vector_attribute: "f:gradient".to_string(),
            vector_default: Vector3::z(),
            magnitude_attribute: None,
        }
    }
}

impl GradientParams {
    /// Keep raw gradients (no normalization).
    #[must_use]
    pub fn raw() -> Self {
        Self {
            normalize: false,
            ..Self::default()
        }
    }

    /// Differentiate the named per-vertex attribute.
    ///
    /// The output attribute is named `f:<name>_grad`, with any `v:` prefix
    /// on the input stripped.
    #[must_use]
    pub fn for_attribute(name: &str) -> Self {
        let stem = name.strip_prefix("v:").unwrap_or(name);
        Self {
            scalar_attribute: name.to_string(),
            vector_attribute: format!("f:{stem}_grad"),
            ..Self::default()
        }
    }

    /// Enable or disable normalization.
    #[must_use]
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Set the zero gradient policy.
    #[must_use]
    pub fn with_zero_policy(mut self, policy: ZeroGradientPolicy) -> Self {
        self.zero_policy = policy;
        self
    }

    /// Set the zero tolerance.
    #[must_use]
    pub fn with_zero_tolerance(mut self, tolerance: f64) -> Self {
        self.zero_tolerance = tolerance;
        self
    }

    /// Set the output vector attribute name.
    #[must_use]
    pub fn with_vector_attribute(mut self, name: &str) -> Self {
        self.vector_attribute = name.to_string();
        self
    }

    /// Set the value a newly created vector attribute is filled with.
    #[must_use]
    pub fn with_vector_default(mut self, default: Vector3<f64>) -> Self {
        self.vector_default = default;
        self
    }

    /// Also store per-face magnitudes under this name.
    #[must_use]
    pub fn with_magnitude_attribute(mut self, name: &str) -> Self {
        self.magnitude_attribute = Some(name.to_string());
        self
    }
}
