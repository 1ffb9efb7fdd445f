//! Oriented plane fitting for a resampled gesture curve.
//!
//! The curve is reduced to three representative points (the means of three
//! contiguous thirds), which fix the plane normal. The normal is turned toward
//! the viewer, and the in-plane X axis is kept horizontal with respect to the
//! viewer's up axis.

use crate::{
    config::PipelineConfig,
    constants::{GEOMETRY_EPSILON, REPRESENTATIVE_GROUPS},
    geometry::{legacy_display_flip, RigidTransform},
    Error, Result,
};
use nalgebra::{Point3, Vector3};

/// Means of the three contiguous groups of `curve`.
///
/// Group `g` holds `n / 3` points plus one extra for the first `n % 3` groups.
///
/// # Errors
///
/// Returns [`Error::InsufficientPoints`] for fewer than three points
pub fn representative_points(curve: &[Point3<f64>]) -> Result<[Point3<f64>; 3]> {
    let n = curve.len();
    if n < REPRESENTATIVE_GROUPS {
        return Err(Error::InsufficientPoints {
            required: REPRESENTATIVE_GROUPS,
            actual: n,
        });
    }

    let base = n / REPRESENTATIVE_GROUPS;
    let extra = n % REPRESENTATIVE_GROUPS;

    let mut means = [Point3::origin(); REPRESENTATIVE_GROUPS];
    let mut start = 0;
    for (g, mean) in means.iter_mut().enumerate() {
        let size = base + usize::from(g < extra);
        // Every group is non-empty because n >= 3
        *mean = compute_center(&curve[start..start + size]).unwrap_or(curve[start]);
        start += size;
    }
    Ok(means)
}

/// Arithmetic mean of `points`, or `None` when there are none
#[must_use]
pub fn compute_center(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
    #[allow(clippy::cast_precision_loss)]
    let count = points.len() as f64;
    Some(Point3::from(sum / count))
}

/// Builds viewer-facing plane transforms
#[derive(Debug, Clone, Copy)]
pub struct PlaneFitter {
    legacy_display_flip: bool,
}

impl Default for PlaneFitter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PlaneFitter {
    /// Create a fitter; `legacy_display_flip` turns the fitted basis half a turn about the normal
    #[must_use]
    pub fn new(legacy_display_flip: bool) -> Self {
        Self { legacy_display_flip }
    }

    /// Create a fitter from the pipeline configuration
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.legacy_display_flip)
    }

    /// Plane through `center` spanned by `a`, `b`, `c`, oriented toward `viewer`.
    ///
    /// The resulting Z axis is the normal pointing at the viewer. X is
    /// `normal × up`, Y is `normal × X`.
    ///
    /// # Errors
    ///
    /// - [`Error::ColinearPoints`] if `a`, `b`, `c` do not span a plane
    /// - [`Error::DegenerateViewpoint`] if the viewer sits on `center`
    /// - [`Error::ParallelAxes`] if the normal is parallel to `up`
    pub fn fit_plane(
        &self,
        a: &Point3<f64>,
        b: &Point3<f64>,
        c: &Point3<f64>,
        center: &Point3<f64>,
        viewer: &Point3<f64>,
        up: &Vector3<f64>,
    ) -> Result<RigidTransform> {
        let cross = (b - a).cross(&(c - a));
        if cross.norm() < GEOMETRY_EPSILON {
            return Err(Error::ColinearPoints);
        }
        let mut normal = cross.normalize();

        let to_viewer = viewer - center;
        if to_viewer.norm() < GEOMETRY_EPSILON {
            return Err(Error::DegenerateViewpoint);
        }
        if normal.dot(&to_viewer.normalize()) < 0.0 {
            normal = -normal;
        }

        if up.norm() < GEOMETRY_EPSILON {
            return Err(Error::ParallelAxes);
        }
        let x_unnormalized = normal.cross(&up.normalize());
        if x_unnormalized.norm() < GEOMETRY_EPSILON {
            return Err(Error::ParallelAxes);
        }
        let x_axis = x_unnormalized.normalize();
        let y_axis = normal.cross(&x_axis).normalize();

        let fitted = RigidTransform::from_axes(*center, x_axis, y_axis, normal);
        log::debug!("Fitted plane at {center} with normal {normal:?}");

        if self.legacy_display_flip {
            Ok(fitted.rotated_locally(&legacy_display_flip()))
        } else {
            Ok(fitted)
        }
    }

    /// Fit the plane of a resampled curve as seen from `viewer`
    ///
    /// # Errors
    ///
    /// Any error of [`representative_points`] or [`PlaneFitter::fit_plane`]
    pub fn fit_curve(&self, resampled: &[Point3<f64>], viewer: &Point3<f64>, up: &Vector3<f64>) -> Result<RigidTransform> {
        let [a, b, c] = representative_points(resampled)?;
        let center = compute_center(resampled).ok_or(Error::EmptyPointSet)?;
        self.fit_plane(&a, &b, &c, &center, viewer, up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resample::resample;

    fn line(n: usize) -> Vec<Point3<f64>> {
        (0..n).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect()
    }

    #[test]
    fn test_group_sizes() {
        // 10 -> 4, 3, 3: means of 0..4, 4..7, 7..10
        let [a, b, c] = representative_points(&line(10)).unwrap();
        assert!((a.x - 1.5).abs() < 1e-12);
        assert!((b.x - 5.0).abs() < 1e-12);
        assert!((c.x - 8.0).abs() < 1e-12);

        // 11 -> 4, 4, 3: means of 0..4, 4..8, 8..11
        let [a, b, c] = representative_points(&line(11)).unwrap();
        assert!((a.x - 1.5).abs() < 1e-12);
        assert!((b.x - 5.5).abs() < 1e-12);
        assert!((c.x - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_points() {
        assert!(matches!(
            representative_points(&line(2)),
            Err(Error::InsufficientPoints { required: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_center() {
        assert_eq!(compute_center(&[]), None);
        let center = compute_center(&[Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, -2.0)]).unwrap();
        assert_eq!(center, Point3::new(1.0, 2.0, -1.0));
    }

    #[test]
    fn test_colinear_points() {
        let result = PlaneFitter::default().fit_plane(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(2.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 0.0, 5.0),
            &Vector3::y(),
        );
        assert!(matches!(result, Err(Error::ColinearPoints)));
    }

    #[test]
    fn test_degenerate_viewpoint() {
        let center = Point3::new(0.5, 0.5, 0.0);
        let result = PlaneFitter::default().fit_plane(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
            &center,
            &center,
            &Vector3::y(),
        );
        assert!(matches!(result, Err(Error::DegenerateViewpoint)));
    }

    #[test]
    fn test_horizontal_plane_with_vertical_up() {
        // Plane normal along Y, up along Y
        let result = PlaneFitter::default().fit_plane(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 0.0, 1.0),
            &Point3::new(0.3, 0.0, 0.3),
            &Point3::new(0.0, 5.0, 0.0),
            &Vector3::y(),
        );
        assert!(matches!(result, Err(Error::ParallelAxes)));
    }

    #[test]
    fn test_normal_faces_viewer() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let center = Point3::new(0.3, 0.3, 0.0);
        let fitter = PlaneFitter::new(false);

        for viewer_z in [5.0, -5.0] {
            let viewer = Point3::new(0.0, 0.0, viewer_z);
            // Winding order must not matter
            for (p, q, r) in [(a, b, c), (a, c, b)] {
                let fit = fitter.fit_plane(&p, &q, &r, &center, &viewer, &Vector3::y()).unwrap();
                assert!(fit.z_axis().dot(&(viewer - center)) > 0.0);
                assert!(fit.is_rigid(1e-9));
            }
        }
    }

    #[test]
    fn test_display_flip_negates_in_plane_axes() {
        let args = (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.3, 0.3, 0.0),
            Point3::new(0.0, 0.0, 3.0),
        );
        let plain = PlaneFitter::new(false)
            .fit_plane(&args.0, &args.1, &args.2, &args.3, &args.4, &Vector3::y())
            .unwrap();
        let flipped = PlaneFitter::new(true)
            .fit_plane(&args.0, &args.1, &args.2, &args.3, &args.4, &Vector3::y())
            .unwrap();

        assert!((plain.x_axis() + flipped.x_axis()).norm() < 1e-12);
        assert!((plain.y_axis() + flipped.y_axis()).norm() < 1e-12);
        assert!((plain.z_axis() - flipped.z_axis()).norm() < 1e-12);
        assert!(flipped.is_rigid(1e-9));
    }

    #[test]
    fn test_square_gesture_faces_camera() {
        let square = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ];
        let resampled = resample(&square, 1024).unwrap();
        let fit = PlaneFitter::default()
            .fit_curve(&resampled, &Point3::new(0.5, 0.5, 2.0), &Vector3::y())
            .unwrap();

        assert!((fit.z_axis() - Vector3::z()).norm() < 1e-6);
        assert!((fit.origin() - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-2);
    }
}
