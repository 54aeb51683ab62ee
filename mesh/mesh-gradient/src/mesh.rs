//! Indexed triangle mesh with named attributes.

// Grid sizes are small enough to be exactly representable.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]

use nalgebra::{Point3, Vector3};

use crate::attributes::{AttributeStore, AttributeTable};
use crate::error::GradientResult;
use crate::view::MeshView;

/// An indexed triangle mesh that carries its own attribute table.
///
/// Geometry is fixed at construction so the attribute arrays always match
/// the element counts. Faces use counter-clockwise winding.
///
/// # Example
///
/// ```
/// use mesh_gradient::{MeshView, Point3, TriangleMesh};
///
/// let mesh = TriangleMesh::new(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![[0, 1, 2]],
/// );
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    positions: Vec<Point3<f64>>,
    faces: Vec<[u32; 3]>,
    attributes: AttributeTable,
}

impl TriangleMesh {
    /// Create a mesh from vertex positions and faces.
    #[must_use]
    pub fn new(positions: Vec<Point3<f64>>, faces: Vec<[u32; 3]>) -> Self {
        let attributes = AttributeTable::new(positions.len(), faces.len());
        Self {
            positions,
            faces,
            attributes,
        }
    }

    /// Create a mesh from raw coordinate and index data.
    ///
    /// Returns an empty mesh if either slice length is not a multiple of 3.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_gradient::{MeshView, TriangleMesh};
    ///
    /// let mesh = TriangleMesh::from_raw(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], &[0, 1, 2]);
    /// assert_eq!(mesh.face_count(), 1);
    /// ```
    #[must_use]
    pub fn from_raw(positions: &[f64], indices: &[u32]) -> Self {
        if positions.len() % 3 != 0 || indices.len() % 3 != 0 {
            return Self::default();
        }

        let positions = positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        let faces = indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();

        Self::new(positions, faces)
    }

    /// Build a flat rectangular grid in the XY plane.
    ///
    /// The grid has `(cols + 1) * (rows + 1)` vertices spaced `spacing` apart,
    /// starting at the origin, and two triangles per cell.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_gradient::{MeshView, TriangleMesh};
    ///
    /// let grid = TriangleMesh::planar_grid(4, 3, 0.5);
    /// assert_eq!(grid.vertex_count(), 20);
    /// assert_eq!(grid.face_count(), 24);
    /// ```
    #[must_use]
    pub fn planar_grid(cols: usize, rows: usize, spacing: f64) -> Self {
        let stride = cols + 1;
        let mut positions = Vec::with_capacity(stride * (rows + 1));
        for j in 0..=rows {
            for i in 0..=cols {
                positions.push(Point3::new(i as f64 * spacing, j as f64 * spacing, 0.0));
            }
        }

        let mut faces = Vec::with_capacity(cols * rows * 2);
        for j in 0..rows {
            for i in 0..cols {
                let a = (j * stride + i) as u32;
                let b = a + 1;
                let c = a + stride as u32;
                let d = c + 1;
                faces.push([a, b, d]);
                faces.push([a, d, c]);
            }
        }

        Self::new(positions, faces)
    }

    /// Vertex positions.
    #[must_use]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Triangle faces.
    #[must_use]
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// Attribute table.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }

    /// Mutable attribute table.
    pub fn attributes_mut(&mut self) -> &mut AttributeTable {
        &mut self.attributes
    }

    /// Move every vertex by `offset`.
    ///
    /// Connectivity is unchanged, so attributes are kept. Any gradient
    /// operator built from the old positions is stale after this call.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for p in &mut self.positions {
            *p += offset;
        }
    }

    /// Replace the geometry, dropping all attributes.
    pub fn set_geometry(&mut self, positions: Vec<Point3<f64>>, faces: Vec<[u32; 3]>) {
        self.attributes.reset(positions.len(), faces.len());
        self.positions = positions;
        self.faces = faces;
    }
}

impl MeshView for TriangleMesh {
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

impl AttributeStore for TriangleMesh {
    fn vertex_len(&self) -> usize {
        self.attributes.vertex_count()
    }

    fn face_len(&self) -> usize {
        self.attributes.face_count()
    }

    fn vertex_scalars(&self, name: &str) -> Option<&[f64]> {
        self.attributes.vertex_scalars(name)
    }

    fn set_vertex_scalars(&mut self, name: &str, values: Vec<f64>) -> GradientResult<()> {
        self.attributes.set_vertex_scalars(name, values)
    }

    fn face_scalars(&self, name: &str) -> Option<&[f64]> {
        self.attributes.face_scalars(name)
    }

    fn set_face_scalars(&mut self, name: &str, values: Vec<f64>) -> GradientResult<()> {
        self.attributes.set_face_scalars(name, values)
    }

    fn face_vectors(&self, name: &str) -> Option<&[Vector3<f64>]> {
        self.attributes.face_vectors(name)
    }

    fn face_vectors_or_insert(
        &mut self,
        name: &str,
        default: Vector3<f64>,
    ) -> &mut [Vector3<f64>] {
        self.attributes.face_vectors_or_insert(name, default)
    }
}
