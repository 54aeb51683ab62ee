//! Named per-vertex and per-face attributes.
//!
//! An [`AttributeStore`] maps string keys to per-element arrays. Scalars can
//! live on vertices or faces; vectors live on faces, which is where gradient
//! fields are stored.

use hashbrown::HashMap;
use nalgebra::Vector3;

use crate::error::{GradientError, GradientResult};

/// Trait for named attribute storage attached to a mesh.
///
/// Setters replace the whole array and reject arrays whose length does not
/// match the element count.
pub trait AttributeStore {
    /// Number of entries in every per-vertex attribute.
    fn vertex_len(&self) -> usize;

    /// Number of entries in every per-face attribute.
    fn face_len(&self) -> usize;

    /// Get a per-vertex scalar attribute.
    fn vertex_scalars(&self, name: &str) -> Option<&[f64]>;

    /// Set (or overwrite) a per-vertex scalar attribute.
    ///
    /// # Errors
    ///
    /// Returns [`GradientError::DimensionMismatch`] if `values` does not have
    /// one entry per vertex.
    fn set_vertex_scalars(&mut self, name: &str, values: Vec<f64>) -> GradientResult<()>;

    /// Get a per-face scalar attribute.
    fn face_scalars(&self, name: &str) -> Option<&[f64]>;

    /// Set (or overwrite) a per-face scalar attribute.
    ///
    /// # Errors
    ///
    /// Returns [`GradientError::DimensionMismatch`] if `values` does not have
    /// one entry per face.
    fn set_face_scalars(&mut self, name: &str, values: Vec<f64>) -> GradientResult<()>;

    /// Get a per-face vector attribute.
    fn face_vectors(&self, name: &str) -> Option<&[Vector3<f64>]>;

    /// Get a per-face vector attribute for writing, creating it filled with
    /// `default` if it does not exist yet.
    fn face_vectors_or_insert(&mut self, name: &str, default: Vector3<f64>)
    -> &mut [Vector3<f64>];
}

/// Hash-map backed attribute storage for a fixed vertex and face count.
///
/// # Example
///
/// ```
/// use mesh_gradient::{AttributeStore, AttributeTable, Vector3};
///
/// let mut table = AttributeTable::new(3, 1);
/// table.set_vertex_scalars("height", vec![0.0, 1.0, 2.0]).unwrap();
/// assert_eq!(table.vertex_scalars("height"), Some(&[0.0, 1.0, 2.0][..]));
///
/// let field = table.face_vectors_or_insert("grad", Vector3::z());
/// assert_eq!(field.len(), 1);
/// assert_eq!(field[0], Vector3::z());
/// ```
#[derive(Debug, Clone, Default)]
#[allow(clippy::struct_field_names)]
pub struct AttributeTable {
    vertex_count: usize,
    face_count: usize,
    vertex_scalars: HashMap<String, Vec<f64>>,
    face_scalars: HashMap<String, Vec<f64>>,
    face_vectors: HashMap<String, Vec<Vector3<f64>>>,
}

impl AttributeTable {
    /// Create an empty table for a mesh with the given element counts.
    #[must_use]
    pub fn new(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertex_count,
            face_count,
            ..Self::default()
        }
    }

    /// Number of vertices every vertex attribute must cover.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of faces every face attribute must cover.
    #[must_use]
    pub const fn face_count(&self) -> usize {
        self.face_count
    }

    /// Check whether any attribute with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.vertex_scalars.contains_key(name)
            || self.face_scalars.contains_key(name)
            || self.face_vectors.contains_key(name)
    }

    /// Remove every attribute with this name.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let a = self.vertex_scalars.remove(name).is_some();
        let b = self.face_scalars.remove(name).is_some();
        let c = self.face_vectors.remove(name).is_some();
        a || b || c
    }

    /// Drop all attributes and adopt new element counts.
    ///
    /// Called when the owning mesh changes size.
    pub fn reset(&mut self, vertex_count: usize, face_count: usize) {
        self.vertex_count = vertex_count;
        self.face_count = face_count;
        self.vertex_scalars.clear();
        self.face_scalars.clear();
        self.face_vectors.clear();
    }

    /// Sorted list of all attribute names.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .vertex_scalars
            .keys()
            .chain(self.face_scalars.keys())
            .chain(self.face_vectors.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    fn check_len(expected: usize, actual: usize) -> GradientResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(GradientError::DimensionMismatch { expected, actual })
        }
    }
}

impl AttributeStore for AttributeTable {
    fn vertex_len(&self) -> usize {
        self.vertex_count
    }

    fn face_len(&self) -> usize {
        self.face_count
    }

    fn vertex_scalars(&self, name: &str) -> Option<&[f64]> {
        self.vertex_scalars.get(name).map(Vec::as_slice)
    }

    fn set_vertex_scalars(&mut self, name: &str, values: Vec<f64>) -> GradientResult<()> {
        Self::check_len(self.vertex_count, values.len())?;
        self.vertex_scalars.insert(name.to_string(), values);
        Ok(())
    }

    fn face_scalars(&self, name: &str) -> Option<&[f64]> {
        self.face_scalars.get(name).map(Vec::as_slice)
    }

    fn set_face_scalars(&mut self, name: &str, values: Vec<f64>) -> GradientResult<()> {
        Self::check_len(self.face_count, values.len())?;
        self.face_scalars.insert(name.to_string(), values);
        Ok(())
    }

    fn face_vectors(&self, name: &str) -> Option<&[Vector3<f64>]> {
        self.face_vectors.get(name).map(Vec::as_slice)
    }

    fn face_vectors_or_insert(
        &mut self,
        name: &str,
        default: Vector3<f64>,
    ) -> &mut [Vector3<f64>] {
        let face_count = self.face_count;
        self.face_vectors
            .entry(name.to_string())
            .or_insert_with(|| vec![default; face_count])
    }
}
