//! Error types for gradient operator construction and application.

use thiserror::Error;

/// Result type for gradient operations.
pub type GradientResult<T> = Result<T, GradientError>;

/// Errors that can occur while building or applying a gradient operator.
#[derive(Debug, Error)]
pub enum GradientError {
    /// A face references a vertex outside the mesh.
    #[error("face {face} references vertex {vertex} (mesh has {vertex_count} vertices)")]
    InvalidTopology {
        /// Index of the offending face.
        face: usize,
        /// The out-of-range vertex index.
        vertex: u32,
        /// Total number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A face has zero (or numerically zero) area.
    #[error("face {face} is degenerate (twice-area {double_area:e})")]
    DegenerateFace {
        /// Index of the degenerate face.
        face: usize,
        /// Twice the face area as computed from the edge cross product.
        double_area: f64,
    },

    /// A per-element array has the wrong length.
    #[error("dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// Unit normalization was requested for a zero gradient.
    #[error("cannot normalize zero gradient on face {face}")]
    ZeroGradientNormalization {
        /// Index of the face with zero gradient.
        face: usize,
    },

    /// A named attribute does not exist.
    #[error("attribute not found: {name}")]
    AttributeNotFound {
        /// Name that was looked up.
        name: String,
    },
}
