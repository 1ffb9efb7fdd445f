//! Projection of world points into a plane's local 2D frame, and panel sizing.

use crate::{geometry::RigidTransform, Error, Result};
use nalgebra::{Point2, Point3};

/// Local `(x, y)` of `point` in the frame of `plane`; the local Z is dropped
#[must_use]
pub fn project(point: &Point3<f64>, plane: &RigidTransform) -> Point2<f64> {
    debug_assert!(plane.is_rigid(1e-6), "plane transform is not rigid");
    let local = plane.inverse_transform_point(point);
    Point2::new(local.x, local.y)
}

/// [`project`] applied to every point
#[must_use]
pub fn project_all(points: &[Point3<f64>], plane: &RigidTransform) -> Vec<Point2<f64>> {
    points.iter().map(|p| project(p, plane)).collect()
}

/// Width and height of the axis-aligned box around the projected points.
///
/// # Errors
///
/// Returns [`Error::EmptyPointSet`] when `points` is empty
pub fn bounding_box_size(points: &[Point3<f64>], plane: &RigidTransform) -> Result<(f64, f64)> {
    let projected = project_all(points, plane);
    let (&first, rest) = projected.split_first().ok_or(Error::EmptyPointSet)?;

    let (min, max) = rest.iter().fold((first, first), |(min, max), p| {
        (
            Point2::new(min.x.min(p.x), min.y.min(p.y)),
            Point2::new(max.x.max(p.x), max.y.max(p.y)),
        )
    });

    let size = (max.x - min.x, max.y - min.y);
    log::debug!("Bounding box {:.4} x {:.4}", size.0, size.1);
    Ok(size)
}
