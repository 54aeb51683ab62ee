//! Discrete gradient operator for triangle meshes.
//!
//! This crate differentiates piecewise-linear scalar fields on triangle
//! meshes:
//!
//! - **Operator assembly** - Sparse `3|F| × |V|` matrix `G` built once per geometry
//! - **Field computation** - Per-face gradient vectors and magnitudes from `G * u`
//! - **Attribute plumbing** - Read a named vertex field, write a named face field
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. Meshes are
//! accessed through the [`MeshView`] trait and attributes through
//! [`AttributeStore`], so any host mesh type can plug in.
//!
//! # Algorithm
//!
//! Inside each face the field is linear, so its gradient is constant. For a
//! face `(p1, p2, p3)` with values `(u1, u2, u3)`:
//!
//! ```text
//! grad u = eperp13 * (u2 - u1) + eperp21 * (u3 - u1)
//! ```
//!
//! where `eperp21` and `eperp13` are the edges `v21 = p2 - p1` and
//! `v13 = p1 - p3` rotated 90° in the face plane and divided by twice the
//! face area. These coefficients only depend on geometry, so they are stored
//! once in `G` and reused for every field.
//!
//! # Example
//!
//! ```
//! use mesh_gradient::{
//!     compute_gradient_field, GradientOperator, GradientParams, MeshView, OperatorParams,
//!     TriangleMesh,
//! };
//!
//! let mesh = TriangleMesh::planar_grid(8, 8, 0.125);
//! let op = GradientOperator::build(&mesh, &OperatorParams::default()).unwrap();
//!
//! // u(p) = 2x + 3y
//! let u: Vec<f64> = mesh.positions().iter().map(|p| 2.0 * p.x + 3.0 * p.y).collect();
//! let field = compute_gradient_field(&op, &u, &GradientParams::raw()).unwrap();
//!
//! assert_eq!(field.len(), mesh.face_count());
//! for g in field.vectors() {
//!     assert!((g.x - 2.0).abs() < 1e-9);
//!     assert!((g.y - 3.0).abs() < 1e-9);
//! }
//! ```
//!
//! # Quality Standards
//!
//! - Zero clippy/doc warnings
//! - Zero `unwrap`/`expect` in library code

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod attributes;
mod compute;
mod error;
mod field;
mod frame;
mod mesh;
mod operator;
mod params;
mod view;

pub use attributes::{AttributeStore, AttributeTable};
pub use compute::{
    compute_gradient_field, gradient_from_attribute, normalize_range, normalize_vertex_scalar,
    write_gradient_field,
};
pub use error::{GradientError, GradientResult};
pub use field::GradientField;
pub use frame::FaceFrame;
pub use mesh::TriangleMesh;
pub use operator::GradientOperator;
pub use params::{GradientParams, OperatorParams, ZeroGradientPolicy};
pub use view::{MeshView, SliceMesh};

// Re-export the math types used in the public API.
pub use nalgebra::{Point3, Vector3};
