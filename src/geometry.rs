//! Rigid transforms and panel placements shared by the pipeline stages.

use crate::{constants::GEOMETRY_EPSILON, Error, Result};
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Tolerance used by the debug-only rigidity checks
const RIGIDITY_TOLERANCE: f64 = 1e-6;

/// Origin plus an orthonormal, right-handed basis. No scale, no shear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    origin: Point3<f64>,
    rotation: Rotation3<f64>,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    /// Identity transform at the world origin
    #[must_use]
    pub fn identity() -> Self {
        Self {
            origin: Point3::origin(),
            rotation: Rotation3::identity(),
        }
    }

    /// Build a transform from an origin and its three local axes.
    ///
    /// The axes must be unit length, mutually perpendicular and right-handed.
    /// Violations are programmer errors and only checked in debug builds.
    #[must_use]
    pub fn from_axes(origin: Point3<f64>, x_axis: Vector3<f64>, y_axis: Vector3<f64>, z_axis: Vector3<f64>) -> Self {
        let basis = Matrix3::from_columns(&[x_axis, y_axis, z_axis]);
        debug_assert!(is_rotation(&basis), "basis is not orthonormal: {basis}");
        Self {
            origin,
            rotation: Rotation3::from_matrix_unchecked(basis),
        }
    }

    /// Build a transform from an origin and a rotation
    #[must_use]
    pub fn from_rotation(origin: Point3<f64>, rotation: Rotation3<f64>) -> Self {
        Self { origin, rotation }
    }

    /// Transform at `eye` whose local +Z axis points at `target`.
    ///
    /// The local X axis is `up × Z`, so X stays horizontal with respect to `up`.
    ///
    /// # Errors
    ///
    /// - [`Error::DegenerateViewpoint`] if `eye` and `target` coincide
    /// - [`Error::ParallelAxes`] if the view direction is parallel to `up`
    pub fn look_at(eye: Point3<f64>, target: Point3<f64>, up: &Vector3<f64>) -> Result<Self> {
        let forward = target - eye;
        if forward.norm() < GEOMETRY_EPSILON {
            return Err(Error::DegenerateViewpoint);
        }
        let z_axis = forward.normalize();

        let x_unnormalized = up.cross(&z_axis);
        if x_unnormalized.norm() < GEOMETRY_EPSILON {
            return Err(Error::ParallelAxes);
        }
        let x_axis = x_unnormalized.normalize();
        let y_axis = z_axis.cross(&x_axis);

        Ok(Self::from_axes(eye, x_axis, y_axis, z_axis))
    }

    /// World-space origin
    #[must_use]
    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// Rotation part
    #[must_use]
    pub fn rotation(&self) -> &Rotation3<f64> {
        &self.rotation
    }

    /// Local X axis in world space
    #[must_use]
    pub fn x_axis(&self) -> Vector3<f64> {
        self.rotation.matrix().column(0).into_owned()
    }

    /// Local Y axis in world space
    #[must_use]
    pub fn y_axis(&self) -> Vector3<f64> {
        self.rotation.matrix().column(1).into_owned()
    }

    /// Local Z axis in world space
    #[must_use]
    pub fn z_axis(&self) -> Vector3<f64> {
        self.rotation.matrix().column(2).into_owned()
    }

    /// Map a point from this transform's local frame to world space
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.origin + self.rotation * local.coords
    }

    /// Map a world-space point into this transform's local frame
    #[must_use]
    pub fn inverse_transform_point(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse() * (world - self.origin))
    }

    /// Same origin, basis rotated by `local` expressed in the local frame
    #[must_use]
    pub fn rotated_locally(&self, local: &Rotation3<f64>) -> Self {
        Self {
            origin: self.origin,
            rotation: self.rotation * *local,
        }
    }

    /// 4x4 column-major matrix with the axes in columns 0..3 and the origin in column 3
    #[must_use]
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        let mut matrix = self.rotation.to_homogeneous();
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.origin.coords);
        matrix
    }

    /// True when the basis is orthonormal and right-handed within `tolerance`
    #[must_use]
    pub fn is_rigid(&self, tolerance: f64) -> bool {
        is_rotation_within(self.rotation.matrix(), tolerance)
    }
}

/// Half turn about the local Z axis: negates X and Y, keeps Z.
///
/// Fitted plane bases carry this rotation so the crop comes out upright on the
/// display panel the rest of the application renders into.
#[must_use]
pub fn legacy_display_flip() -> Rotation3<f64> {
    Rotation3::from_matrix_unchecked(Matrix3::new(
        -1.0, 0.0, 0.0, //
        0.0, -1.0, 0.0, //
        0.0, 0.0, 1.0,
    ))
}

fn is_rotation(basis: &Matrix3<f64>) -> bool {
    is_rotation_within(basis, RIGIDITY_TOLERANCE)
}

fn is_rotation_within(basis: &Matrix3<f64>, tolerance: f64) -> bool {
    let gram = basis.transpose() * basis;
    (gram - Matrix3::identity()).abs().max() < tolerance && (basis.determinant() - 1.0).abs() < tolerance
}

/// A rigid transform plus the physical panel size in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelPlacement {
    /// Pose of the panel center
    pub transform: RigidTransform,
    /// Width along the local X axis
    pub width: f64,
    /// Height along the local Y axis
    pub height: f64,
}

impl PanelPlacement {
    /// Create a placement
    #[must_use]
    pub fn new(transform: RigidTransform, width: f64, height: f64) -> Self {
        Self { transform, width, height }
    }

    /// World-space center of the panel
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        self.transform.origin()
    }

    /// World-space corners of the panel rectangle
    #[must_use]
    pub fn corners(&self) -> PanelCorners {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        let at = |x: f64, y: f64| self.transform.transform_point(&Point3::new(x, y, 0.0));
        PanelCorners {
            top_left: at(-half_w, half_h),
            top_right: at(half_w, half_h),
            bottom_right: at(half_w, -half_h),
            bottom_left: at(-half_w, -half_h),
        }
    }
}

/// Four world-space corners of a panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelCorners {
    /// Local (-w/2, +h/2)
    pub top_left: Point3<f64>,
    /// Local (+w/2, +h/2)
    pub top_right: Point3<f64>,
    /// Local (+w/2, -h/2)
    pub bottom_right: Point3<f64>,
    /// Local (-w/2, -h/2)
    pub bottom_left: Point3<f64>,
}

impl PanelCorners {
    /// Corners in TL, TR, BR, BL order together with their names
    #[must_use]
    pub fn named(&self) -> [(&'static str, Point3<f64>); 4] {
        [
            ("top-left", self.top_left),
            ("top-right", self.top_right),
            ("bottom-right", self.bottom_right),
            ("bottom-left", self.bottom_left),
        ]
    }
}
