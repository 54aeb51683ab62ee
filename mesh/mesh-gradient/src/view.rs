//! Read-only mesh geometry access.

use nalgebra::Point3;

/// Trait for types that expose triangle mesh geometry.
///
/// This is the only view of a mesh the gradient engine needs, so any mesh
/// representation can be used by implementing these four methods.
pub trait MeshView {
    /// Get the number of vertices.
    fn vertex_count(&self) -> usize;

    /// Get the number of faces (triangles).
    fn face_count(&self) -> usize;

    /// Get a face by index as three vertex indices.
    ///
    /// Returns `None` if the index is out of bounds.
    fn face(&self, index: usize) -> Option<[u32; 3]>;

    /// Get a vertex position by index.
    ///
    /// Returns `None` if the index is out of bounds.
    fn position(&self, index: usize) -> Option<Point3<f64>>;

    /// Check if the mesh has no vertices or no faces.
    fn is_empty(&self) -> bool {
        self.vertex_count() == 0 || self.face_count() == 0
    }

    /// Resolve the corner positions of a face.
    ///
    /// Returns `None` if the face or any of its vertices is out of bounds.
    fn corners(&self, face_index: usize) -> Option<[Point3<f64>; 3]> {
        let [a, b, c] = self.face(face_index)?;
        Some([
            self.position(a as usize)?,
            self.position(b as usize)?,
            self.position(c as usize)?,
        ])
    }
}

/// Borrowed positions and faces viewed as a mesh.
///
/// Lets callers holding plain arrays build an operator without copying
/// into a mesh type.
#[derive(Debug, Clone, Copy)]
pub struct SliceMesh<'a> {
    /// Vertex positions.
    pub positions: &'a [Point3<f64>],
    /// Triangle faces as indices into `positions`.
    pub faces: &'a [[u32; 3]],
}

impl<'a> SliceMesh<'a> {
    /// Wrap position and face slices.
    #[must_use]
    pub const fn new(positions: &'a [Point3<f64>], faces: &'a [[u32; 3]]) -> Self {
        Self { positions, faces }
    }
}

impl MeshView for SliceMesh<'_> {
    fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn face(&self, index: usize) -> Option<[u32; 3]> {
        self.faces.get(index).copied()
    }

    fn position(&self, index: usize) -> Option<Point3<f64>> {
        self.positions.get(index).copied()
    }
}
