//! Gradient field computation on top of a built operator.

use tracing::{debug, warn};

use crate::attributes::AttributeStore;
use crate::error::{GradientError, GradientResult};
use crate::field::GradientField;
use crate::operator::GradientOperator;
use crate::params::{GradientParams, OperatorParams};
use crate::view::MeshView;

/// Compute the per-face gradient of a vertex scalar field.
///
/// Applies `operator` to `u` and, if `params.normalize` is set, replaces
/// each vector by its unit direction using `params.zero_policy` for flat
/// faces. Magnitudes are always those of the raw gradient.
///
/// # Errors
///
/// - [`GradientError::DimensionMismatch`] if `u` does not have one entry per
///   vertex.
/// - [`GradientError::ZeroGradientNormalization`] if normalization hits a
///   zero gradient under [`ZeroGradientPolicy::Fail`](crate::ZeroGradientPolicy::Fail).
///
/// # Example
///
/// ```
/// use mesh_gradient::{
///     compute_gradient_field, GradientOperator, GradientParams, OperatorParams, Point3,
/// };
///
/// let positions = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(2.0, 0.0, 0.0),
///     Point3::new(0.0, 2.0, 0.0),
/// ];
/// let op = GradientOperator::from_parts(&positions, &[[0, 1, 2]], &OperatorParams::default())
///     .unwrap();
///
/// // u(p) = 3x
/// let field = compute_gradient_field(&op, &[0.0, 6.0, 0.0], &GradientParams::default()).unwrap();
/// assert!((field.magnitude(0).unwrap() - 3.0).abs() < 1e-12);
/// assert!((field.vector(0).unwrap().x - 1.0).abs() < 1e-12);
/// ```
pub fn compute_gradient_field(
    operator: &GradientOperator,
    u: &[f64],
    params: &GradientParams,
) -> GradientResult<GradientField> {
    let mut field = GradientField::from_vectors(operator.apply(u)?);

    if params.normalize {
        let zeros = field.normalize(params.zero_policy, params.zero_tolerance)?;
        if zeros > 0 {
            warn!(
                faces = zeros,
                policy = ?params.zero_policy,
                "Zero gradients replaced during normalization"
            );
        }
    }

    Ok(field)
}

/// Differentiate a named vertex attribute and store the result on faces.
///
/// Reads `params.scalar_attribute`, writes the gradient into
/// `params.vector_attribute` (created with `params.vector_default` if
/// missing) and, if set, the raw magnitudes into
/// `params.magnitude_attribute`. The scalar attribute is not modified.
///
/// Element counts are checked before any numeric work, and nothing is
/// written to `store` unless the whole computation succeeds.
///
/// # Errors
///
/// - [`GradientError::DimensionMismatch`] if the operator does not match the
///   store's element counts, or an existing output attribute has the wrong
///   length.
/// - [`GradientError::AttributeNotFound`] if the scalar attribute is missing.
/// - Anything [`compute_gradient_field`] returns.
pub fn write_gradient_field<S: AttributeStore + ?Sized>(
    store: &mut S,
    operator: &GradientOperator,
    params: &GradientParams,
) -> GradientResult<GradientField> {
    check_counts(store.vertex_len(), operator.vertex_count())?;
    check_counts(store.face_len(), operator.face_count())?;
    if let Some(existing) = store.face_vectors(&params.vector_attribute) {
        check_counts(existing.len(), operator.face_count())?;
    }

    let u = store
        .vertex_scalars(&params.scalar_attribute)
        .ok_or_else(|| GradientError::AttributeNotFound {
            name: params.scalar_attribute.clone(),
        })?;

    let field = compute_gradient_field(operator, u, params)?;

    if let Some(name) = &params.magnitude_attribute {
        store.set_face_scalars(name, field.magnitudes().to_vec())?;
    }

    let target = store.face_vectors_or_insert(&params.vector_attribute, params.vector_default);
    for (dst, src) in target.iter_mut().zip(field.vectors()) {
        *dst = *src;
    }

    debug!(
        attribute = %params.vector_attribute,
        faces = field.len(),
        normalized = field.is_normalized(),
        "Stored gradient field"
    );

    Ok(field)
}

fn check_counts(expected: usize, actual: usize) -> GradientResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(GradientError::DimensionMismatch { expected, actual })
    }
}

/// Build the operator for `mesh` and store the gradient of a named vertex
/// attribute in one step.
///
/// Use [`GradientOperator::build`] plus [`write_gradient_field`] instead when
/// several fields are differentiated on the same geometry.
///
/// # Errors
///
/// Anything [`GradientOperator::build`] or [`write_gradient_field`] returns.
///
/// # Example
///
/// ```
/// use mesh_gradient::{
///     gradient_from_attribute, AttributeStore, GradientParams, MeshView, OperatorParams,
///     TriangleMesh,
/// };
///
/// let mut mesh = TriangleMesh::planar_grid(4, 4, 0.25);
/// let u: Vec<f64> = mesh.positions().iter().map(|p| p.y).collect();
/// mesh.set_vertex_scalars("v:height", u).unwrap();
///
/// let params = GradientParams::for_attribute("v:height");
/// gradient_from_attribute(&mut mesh, &OperatorParams::default(), &params).unwrap();
///
/// let grads = mesh.face_vectors("f:height_grad").unwrap();
/// assert_eq!(grads.len(), mesh.face_count());
/// assert!(grads.iter().all(|g| (g.y - 1.0).abs() < 1e-9));
/// ```
pub fn gradient_from_attribute<M>(
    mesh: &mut M,
    operator_params: &OperatorParams,
    params: &GradientParams,
) -> GradientResult<GradientField>
where
    M: MeshView + AttributeStore + Sync + ?Sized,
{
    let operator = GradientOperator::build(&*mesh, operator_params)?;
    write_gradient_field(mesh, &operator, params)
}

/// Rescale values to `[0, 1]` in place.
///
/// Non-finite values are skipped and left unchanged. If every finite value
/// is the same, they all become 0.
pub fn normalize_range(values: &mut [f64]) {
    let (min, max) = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() {
        return;
    }

    let span = max - min;
    for v in values.iter_mut().filter(|v| v.is_finite()) {
        *v = if span > 0.0 { (*v - min) / span } else { 0.0 };
    }
}

/// Rescale a named vertex scalar attribute to `[0, 1]`.
///
/// # Errors
///
/// Returns [`GradientError::AttributeNotFound`] if the attribute is missing.
pub fn normalize_vertex_scalar<S: AttributeStore + ?Sized>(
    store: &mut S,
    name: &str,
) -> GradientResult<()> {
    let mut values = store
        .vertex_scalars(name)
        .ok_or_else(|| GradientError::AttributeNotFound {
            name: name.to_string(),
        })?
        .to_vec();

    normalize_range(&mut values);
    store.set_vertex_scalars(name, values)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{AttributeTable, TriangleMesh, ZeroGradientPolicy};
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn unit_triangle_op() -> GradientOperator {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        GradientOperator::from_parts(&positions, &[[0, 1, 2]], &OperatorParams::default()).unwrap()
    }

    #[test]
    fn x_field_scenario() {
        let op = unit_triangle_op();
        let field = compute_gradient_field(&op, &[0.0, 1.0, 0.0], &GradientParams::raw()).unwrap();

        assert_relative_eq!(field.vector(0).unwrap(), Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(field.magnitude(0).unwrap(), 1.0, epsilon = 1e-12);

        let normalized = compute_gradient_field(&op, &[0.0, 1.0, 0.0], &GradientParams::default())
            .unwrap();
        assert_relative_eq!(normalized.vector(0).unwrap(), Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn y_field_scenario() {
        let op = unit_triangle_op();
        let field = compute_gradient_field(&op, &[0.0, 0.0, 1.0], &GradientParams::raw()).unwrap();
        assert_relative_eq!(field.vector(0).unwrap(), Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn constant_field_scenario() {
        let op = unit_triangle_op();
        let field = compute_gradient_field(&op, &[1.0, 1.0, 1.0], &GradientParams::raw()).unwrap();
        assert!(field.vector(0).unwrap().norm() < 1e-12);

        // Normalizing a flat field falls back to zero by default.
        let field = compute_gradient_field(&op, &[1.0, 1.0, 1.0], &GradientParams::default())
            .unwrap();
        assert_eq!(field.vector(0).unwrap(), Vector3::zeros());

        let fail = GradientParams::default().with_zero_policy(ZeroGradientPolicy::Fail);
        let err = compute_gradient_field(&op, &[1.0, 1.0, 1.0], &fail).unwrap_err();
        assert!(matches!(err, GradientError::ZeroGradientNormalization { face: 0 }));
    }

    #[test]
    fn write_creates_attributes() {
        let mut mesh = TriangleMesh::planar_grid(3, 2, 1.0);
        let u: Vec<f64> = mesh.positions().iter().map(|p| 2.0 * p.x - p.y).collect();
        mesh.set_vertex_scalars("u", u.clone()).unwrap();

        let op = GradientOperator::build(&mesh, &OperatorParams::default()).unwrap();
        let params = GradientParams::raw()
            .with_vector_attribute("grad_u")
            .with_magnitude_attribute("grad_u_mag");
        let params = GradientParams {
            scalar_attribute: "u".to_string(),
            ..params
        };

        let field = write_gradient_field(&mut mesh, &op, &params).unwrap();
        assert_eq!(field.len(), 12);

        let grads = mesh.face_vectors("grad_u").unwrap();
        for g in grads {
            assert_relative_eq!(*g, Vector3::new(2.0, -1.0, 0.0), epsilon = 1e-9);
        }

        let mags = mesh.face_scalars("grad_u_mag").unwrap();
        for m in mags {
            assert_relative_eq!(*m, 5.0_f64.sqrt(), epsilon = 1e-9);
        }

        // Input untouched.
        assert_eq!(mesh.vertex_scalars("u").unwrap(), u.as_slice());
    }

    #[test]
    fn write_overwrites_existing_attribute() {
        let mut mesh = TriangleMesh::planar_grid(1, 1, 1.0);
        let u: Vec<f64> = mesh.positions().iter().map(|p| p.x).collect();
        mesh.set_vertex_scalars("v:scalar", u).unwrap();
        mesh.face_vectors_or_insert("f:gradient", Vector3::new(9.0, 9.0, 9.0));

        let op = GradientOperator::build(&mesh, &OperatorParams::default()).unwrap();
        write_gradient_field(&mut mesh, &op, &GradientParams::default()).unwrap();

        for g in mesh.face_vectors("f:gradient").unwrap() {
            assert_relative_eq!(*g, Vector3::x(), epsilon = 1e-12);
        }
    }

    #[test]
    fn write_missing_attribute() {
        let mut table = AttributeTable::new(3, 1);
        let op = unit_triangle_op();

        let err = write_gradient_field(&mut table, &op, &GradientParams::for_attribute("nope"))
            .unwrap_err();
        assert!(matches!(err, GradientError::AttributeNotFound { name } if name == "nope"));
        assert!(table.face_vectors("f:nope_grad").is_none());
    }

    #[test]
    fn write_rejects_mismatched_store() {
        let mut table = AttributeTable::new(3, 2);
        table.set_vertex_scalars("v:scalar", vec![0.0, 1.0, 0.0]).unwrap();
        let op = unit_triangle_op();

        let params = GradientParams::default().with_magnitude_attribute("f:gradient_mag");
        let err = write_gradient_field(&mut table, &op, &params).unwrap_err();
        assert!(matches!(
            err,
            GradientError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));

        // Nothing written on failure.
        assert!(table.face_vectors("f:gradient").is_none());
        assert!(table.face_scalars("f:gradient_mag").is_none());
    }

    #[test]
    fn write_rejects_vertex_count_mismatch_before_lookup() {
        let mut table = AttributeTable::new(4, 1);
        let op = unit_triangle_op();

        // Counts are checked before the scalar attribute is looked up.
        let err = write_gradient_field(&mut table, &op, &GradientParams::default()).unwrap_err();
        assert!(matches!(
            err,
            GradientError::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        ));
        assert!(table.names().is_empty());
    }

    #[test]
    fn write_leaves_store_untouched_on_zero_gradient_failure() {
        let mut table = AttributeTable::new(3, 1);
        table.set_vertex_scalars("v:scalar", vec![2.0, 2.0, 2.0]).unwrap();
        let op = unit_triangle_op();

        let params = GradientParams::default()
            .with_zero_policy(ZeroGradientPolicy::Fail)
            .with_magnitude_attribute("f:gradient_mag");
        assert!(write_gradient_field(&mut table, &op, &params).is_err());
        assert_eq!(table.names(), vec!["v:scalar"]);
    }

    #[test]
    fn one_step_wrapper() {
        let mut mesh = TriangleMesh::planar_grid(2, 2, 0.5);
        let u: Vec<f64> = mesh.positions().iter().map(|p| p.x + p.y).collect();
        mesh.set_vertex_scalars("v:scalar", u).unwrap();

        let params = GradientParams::default();
        let field = gradient_from_attribute(&mut mesh, &OperatorParams::serial(), &params).unwrap();
        let expected = Vector3::new(1.0, 1.0, 0.0).normalize();
        for g in field.vectors() {
            assert_relative_eq!(*g, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn one_step_wrapper_honors_operator_params() {
        // Thin but valid sliver: accepted by default, rejected by the strict preset.
        let mut mesh = TriangleMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.5, 1e-8, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        mesh.set_vertex_scalars("v:scalar", vec![0.0, 1.0, 0.5]).unwrap();

        let params = GradientParams::raw();
        assert!(gradient_from_attribute(&mut mesh, &OperatorParams::default(), &params).is_ok());

        let err =
            gradient_from_attribute(&mut mesh, &OperatorParams::strict(), &params).unwrap_err();
        assert!(matches!(err, GradientError::DegenerateFace { face: 0, .. }));
    }

    #[test]
    fn range_normalization() {
        let mut values = vec![2.0, 4.0, f64::NAN, 6.0];
        normalize_range(&mut values);
        assert_relative_eq!(values[0], 0.0);
        assert_relative_eq!(values[1], 0.5);
        assert!(values[2].is_nan());
        assert_relative_eq!(values[3], 1.0);

        let mut flat = vec![3.0; 4];
        normalize_range(&mut flat);
        assert!(flat.iter().all(|&v| v == 0.0));

        let mut empty: Vec<f64> = Vec::new();
        normalize_range(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn vertex_scalar_normalization() {
        let mut table = AttributeTable::new(3, 1);
        table.set_vertex_scalars("u", vec![-1.0, 0.0, 1.0]).unwrap();

        normalize_vertex_scalar(&mut table, "u").unwrap();
        assert_eq!(table.vertex_scalars("u").unwrap(), &[0.0, 0.5, 1.0]);

        assert!(normalize_vertex_scalar(&mut table, "missing").is_err());
    }
}
