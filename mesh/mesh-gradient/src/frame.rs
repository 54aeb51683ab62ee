//! Per-face local frame used during operator assembly.
//!
//! For a face with corners `(p1, p2, p3)` the gradient of the piecewise-linear
//! hat function at `p2` is `eperp13` and at `p3` is `eperp21`; the hat at
//! `p1` is their negated sum. Those two vectors are all the operator needs.

use nalgebra::{Point3, Vector3};

/// Geometric quantities of one triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceFrame {
    /// Unit face normal, `normalize(v32 × v13)`.
    pub normal: Vector3<f64>,
    /// Twice the face area, `|v32 × v13|`.
    pub double_area: f64,
    /// `v21` rotated 90° about the normal, scaled to `|v21| / double_area`.
    pub eperp21: Vector3<f64>,
    /// `v13` rotated 90° about the normal, scaled to `|v13| / double_area`.
    pub eperp13: Vector3<f64>,
}

impl FaceFrame {
    /// Compute the frame of the triangle `(p1, p2, p3)`.
    ///
    /// Returns `None` when the triangle is degenerate: its twice-area is not
    /// finite or is at most `tolerance` times the squared longest edge.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_gradient::{FaceFrame, Point3};
    ///
    /// let frame = FaceFrame::new(
    ///     &Point3::new(0.0, 0.0, 0.0),
    ///     &Point3::new(1.0, 0.0, 0.0),
    ///     &Point3::new(0.0, 1.0, 0.0),
    ///     1e-12,
    /// )
    /// .unwrap();
    ///
    /// assert!((frame.double_area - 1.0).abs() < 1e-12);
    /// assert!((frame.normal.z - 1.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn new(
        p1: &Point3<f64>,
        p2: &Point3<f64>,
        p3: &Point3<f64>,
        tolerance: f64,
    ) -> Option<Self> {
        let v32 = p3 - p2;
        let v13 = p1 - p3;
        let v21 = p2 - p1;

        let n = v32.cross(&v13);
        let double_area = n.norm();

        let longest_sq = v32
            .norm_squared()
            .max(v13.norm_squared())
            .max(v21.norm_squared());
        if !double_area.is_finite() || double_area <= tolerance * longest_sq {
            return None;
        }

        let normal = n / double_area;

        let eperp21 = normal.cross(&v21).normalize() * (v21.norm() / double_area);
        let eperp13 = normal.cross(&v13).normalize() * (v13.norm() / double_area);

        Some(Self {
            normal,
            double_area,
            eperp21,
            eperp13,
        })
    }

    /// Compute twice the area of `(p1, p2, p3)` without building a frame.
    #[must_use]
    pub fn double_area_of(p1: &Point3<f64>, p2: &Point3<f64>, p3: &Point3<f64>) -> f64 {
        (p3 - p2).cross(&(p1 - p3)).norm()
    }

    /// Gradient of a linear function with values `(u1, u2, u3)` at the corners.
    #[must_use]
    pub fn gradient(&self, u1: f64, u2: f64, u3: f64) -> Vector3<f64> {
        self.eperp13 * (u2 - u1) + self.eperp21 * (u3 - u1)
    }
}
