//! Sparse gradient operator assembly.
//!
//! The operator `G` has `3 * |F|` rows and `|V|` columns. Rows
//! `[0, |F|)` hold the x component of each face gradient, `[|F|, 2|F|)` the
//! y component and `[2|F|, 3|F|)` the z component, so `G * u` is the stacked
//! per-face gradient of the vertex field `u`.
//!
//! # Sparsity Pattern
//!
//! Each face row has non-zeros only in the columns of its three vertices.
//! Assembly emits 4 triplets per face and dimension; the first vertex of the
//! face appears twice and the two contributions are summed when the
//! triplets are compressed into CSR form.

use nalgebra::{DMatrix, DVector, Point3, Vector3};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{GradientError, GradientResult};
use crate::frame::FaceFrame;
use crate::params::OperatorParams;
use crate::view::{MeshView, SliceMesh};

/// A `(row, column, value)` entry.
type Triplet = (usize, usize, f64);

/// Triplets contributed by one face: 4 per dimension.
type FaceTriplets = [Triplet; 12];

/// Discrete gradient operator for a fixed mesh geometry.
///
/// Build once per mesh snapshot and apply to as many scalar fields as
/// needed. The operator is immutable and `Send + Sync`, so it can be shared
/// across threads without locking. Rebuild it whenever positions or
/// connectivity change.
///
/// # Example
///
/// ```
/// use mesh_gradient::{GradientOperator, OperatorParams, Point3, SliceMesh};
///
/// let positions = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let faces = [[0, 1, 2]];
///
/// let op = GradientOperator::build(&SliceMesh::new(&positions, &faces), &OperatorParams::default())
///     .unwrap();
/// assert_eq!(op.nrows(), 3);
/// assert_eq!(op.ncols(), 3);
///
/// // u(p) = x
/// let grads = op.apply(&[0.0, 1.0, 0.0]).unwrap();
/// assert!((grads[0].x - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct GradientOperator {
    /// The sparse matrix in CSR format.
    matrix: CsrMatrix<f64>,
    /// Number of faces (a third of the row count).
    face_count: usize,
    /// Number of vertices (the column count).
    vertex_count: usize,
}

impl GradientOperator {
    /// Build the gradient operator of a mesh.
    ///
    /// All face indices are validated before any geometry is touched, and
    /// every face must have positive area.
    ///
    /// # Errors
    ///
    /// - [`GradientError::InvalidTopology`] if a face references a vertex
    ///   outside the mesh.
    /// - [`GradientError::DegenerateFace`] if a face has (near) zero area.
    ///   The lowest such face index is reported.
    pub fn build<M>(mesh: &M, params: &OperatorParams) -> GradientResult<Self>
    where
        M: MeshView + Sync + ?Sized,
    {
        let vertex_count = mesh.vertex_count();
        let face_count = mesh.face_count();

        info!(
            vertices = vertex_count,
            faces = face_count,
            "Building gradient operator"
        );

        let faces = collect_faces(mesh)?;

        let per_face: Vec<GradientResult<FaceTriplets>> = if params.use_parallel(face_count) {
            debug!(faces = face_count, "Using parallel triplet assembly");
            (0..face_count)
                .into_par_iter()
                .map(|f| face_triplets(mesh, f, faces[f], face_count, params))
                .collect()
        } else {
            debug!(faces = face_count, "Using serial triplet assembly");
            (0..face_count)
                .map(|f| face_triplets(mesh, f, faces[f], face_count, params))
                .collect()
        };

        // Merge after the join, in face order, so the result does not depend
        // on how work was split.
        let mut triplets = Vec::with_capacity(face_count * 12);
        for result in per_face {
            triplets.extend_from_slice(&result?);
        }

        let op = Self::from_triplets(face_count, vertex_count, &triplets);

        info!(
            rows = op.nrows(),
            cols = op.ncols(),
            nnz = op.nnz(),
            "Gradient operator built"
        );

        Ok(op)
    }

    /// Build the operator from plain position and face slices.
    ///
    /// # Errors
    ///
    /// Same as [`GradientOperator::build`].
    pub fn from_parts(
        positions: &[Point3<f64>],
        faces: &[[u32; 3]],
        params: &OperatorParams,
    ) -> GradientResult<Self> {
        Self::build(&SliceMesh::new(positions, faces), params)
    }

    /// Compress triplets into CSR form, summing duplicate entries.
    fn from_triplets(face_count: usize, vertex_count: usize, triplets: &[Triplet]) -> Self {
        let mut coo = CooMatrix::new(3 * face_count, vertex_count);
        for &(row, col, val) in triplets {
            coo.push(row, col, val);
        }

        Self {
            matrix: CsrMatrix::from(&coo),
            face_count,
            vertex_count,
        }
    }

    /// Number of faces the operator was built for.
    #[must_use]
    pub const fn face_count(&self) -> usize {
        self.face_count
    }

    /// Number of vertices the operator was built for.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of rows (`3 * face_count`).
    #[must_use]
    pub const fn nrows(&self) -> usize {
        3 * self.face_count
    }

    /// Number of columns (`vertex_count`).
    #[must_use]
    pub const fn ncols(&self) -> usize {
        self.vertex_count
    }

    /// Number of stored entries after duplicate summation.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    /// Get the underlying CSR matrix.
    #[must_use]
    pub const fn csr(&self) -> &CsrMatrix<f64> {
        &self.matrix
    }

    /// Whether `mesh` has the element counts this operator was built for.
    ///
    /// This only catches size changes; moved vertices still need a rebuild.
    #[must_use]
    pub fn matches<M: MeshView + ?Sized>(&self, mesh: &M) -> bool {
        mesh.face_count() == self.face_count && mesh.vertex_count() == self.vertex_count
    }

    /// Compute `G * u` as the stacked `3 * face_count` vector.
    ///
    /// # Errors
    ///
    /// Returns [`GradientError::DimensionMismatch`] if `u` does not have one
    /// entry per vertex.
    pub fn mul_vec(&self, u: &[f64]) -> GradientResult<DVector<f64>> {
        if u.len() != self.vertex_count {
            return Err(GradientError::DimensionMismatch {
                expected: self.vertex_count,
                actual: u.len(),
            });
        }

        let mut result = DVector::zeros(self.nrows());
        for (row_idx, row) in self.matrix.row_iter().enumerate() {
            let mut sum = 0.0;
            for (&col_idx, &val) in row.col_indices().iter().zip(row.values().iter()) {
                sum += val * u[col_idx];
            }
            result[row_idx] = sum;
        }

        Ok(result)
    }

    /// Apply the operator to a per-vertex scalar field.
    ///
    /// Returns one gradient vector per face. Row block `k` of `G * u`
    /// supplies component `k` of every face vector.
    ///
    /// # Errors
    ///
    /// Returns [`GradientError::DimensionMismatch`] if `u` does not have one
    /// entry per vertex.
    pub fn apply(&self, u: &[f64]) -> GradientResult<Vec<Vector3<f64>>> {
        let gu = self.mul_vec(u)?;
        let n = self.face_count;

        Ok((0..n)
            .map(|f| Vector3::new(gu[f], gu[n + f], gu[2 * n + f]))
            .collect())
    }

    /// Convert to a dense matrix (for testing or small meshes).
    #[must_use]
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.nrows(), self.ncols());

        for (row_idx, row) in self.matrix.row_iter().enumerate() {
            for (&col_idx, &val) in row.col_indices().iter().zip(row.values().iter()) {
                dense[(row_idx, col_idx)] = val;
            }
        }

        dense
    }
}

/// Read every face and check its indices against the vertex count.
fn collect_faces<M: MeshView + ?Sized>(mesh: &M) -> GradientResult<Vec<[u32; 3]>> {
    let vertex_count = mesh.vertex_count();
    let mut faces = Vec::with_capacity(mesh.face_count());

    for f in 0..mesh.face_count() {
        // A view that reports more faces than it yields is malformed.
        let Some(face) = mesh.face(f) else {
            return Err(GradientError::DimensionMismatch {
                expected: mesh.face_count(),
                actual: f,
            });
        };
        if let Some(&vertex) = face.iter().find(|&&v| v as usize >= vertex_count) {
            return Err(GradientError::InvalidTopology {
                face: f,
                vertex,
                vertex_count,
            });
        }
        faces.push(face);
    }

    Ok(faces)
}

/// Emit the 12 triplets of one face.
fn face_triplets<M: MeshView + ?Sized>(
    mesh: &M,
    face: usize,
    [i1, i2, i3]: [u32; 3],
    face_count: usize,
    params: &OperatorParams,
) -> GradientResult<FaceTriplets> {
    let (Some(p1), Some(p2), Some(p3)) = (
        mesh.position(i1 as usize),
        mesh.position(i2 as usize),
        mesh.position(i3 as usize),
    ) else {
        return Err(GradientError::InvalidTopology {
            face,
            vertex: i1.max(i2).max(i3),
            vertex_count: mesh.vertex_count(),
        });
    };

    let frame = FaceFrame::new(&p1, &p2, &p3, params.degenerate_tolerance).ok_or_else(|| {
        GradientError::DegenerateFace {
            face,
            double_area: FaceFrame::double_area_of(&p1, &p2, &p3),
        }
    })?;

    let (c1, c2, c3) = (i1 as usize, i2 as usize, i3 as usize);
    let mut out = [(0, 0, 0.0); 12];
    for d in 0..3 {
        let row = d * face_count + face;
        let e13 = frame.eperp13[d];
        let e21 = frame.eperp21[d];
        out[4 * d] = (row, c2, e13);
        out[4 * d + 1] = (row, c1, -e13);
        out[4 * d + 2] = (row, c3, e21);
        out[4 * d + 3] = (row, c1, -e21);
    }

    Ok(out)
}
