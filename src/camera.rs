//! Camera collaborator: world-to-pixel mapping and the frame bundle handed to the pipeline.

use crate::geometry::RigidTransform;
use image::RgbaImage;
use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Maps a world-space point to a pixel of the camera image
pub trait CameraProjector: Send + Sync {
    /// Pixel coordinates of `world`, or `None` if the camera cannot see it
    fn project(&self, world: &Point3<f64>) -> Option<Point2<f64>>;
}

impl<F> CameraProjector for F
where
    F: Fn(&Point3<f64>) -> Option<Point2<f64>> + Send + Sync,
{
    fn project(&self, world: &Point3<f64>) -> Option<Point2<f64>> {
        self(world)
    }
}

/// Pinhole camera intrinsics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    /// Focal length in pixels along u
    pub fx: f64,
    /// Focal length in pixels along v
    pub fy: f64,
    /// Principal point u
    pub cx: f64,
    /// Principal point v
    pub cy: f64,
}

/// Ideal pinhole camera.
///
/// The camera looks along its local −Z axis with +Y up. Image `v` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinholeProjector {
    /// Intrinsics
    pub intrinsics: Intrinsics,
    /// Camera pose in world space
    pub pose: RigidTransform,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl PinholeProjector {
    /// Create a projector
    #[must_use]
    pub fn new(intrinsics: Intrinsics, pose: RigidTransform, width: u32, height: u32) -> Self {
        Self {
            intrinsics,
            pose,
            width,
            height,
        }
    }

    /// Camera with the principal point at the image center and square pixels
    #[must_use]
    pub fn centered(focal_px: f64, pose: RigidTransform, width: u32, height: u32) -> Self {
        let intrinsics = Intrinsics {
            fx: focal_px,
            fy: focal_px,
            cx: f64::from(width) / 2.0,
            cy: f64::from(height) / 2.0,
        };
        Self::new(intrinsics, pose, width, height)
    }
}

impl CameraProjector for PinholeProjector {
    fn project(&self, world: &Point3<f64>) -> Option<Point2<f64>> {
        let local = self.pose.inverse_transform_point(world);
        let depth = -local.z;
        if depth <= f64::EPSILON {
            return None;
        }

        let Intrinsics { fx, fy, cx, cy } = self.intrinsics;
        let pixel = Point2::new(cx + fx * local.x / depth, cy - fy * local.y / depth);

        let inside = (0.0..=f64::from(self.width)).contains(&pixel.x) && (0.0..=f64::from(self.height)).contains(&pixel.y);
        (pixel.x.is_finite() && pixel.y.is_finite() && inside).then_some(pixel)
    }
}

/// Everything the pipeline needs from the headset for one finished curve
#[derive(Clone)]
pub struct CameraFrame {
    /// Device (viewer) pose in world space
    pub device_transform: RigidTransform,
    /// Camera image
    pub image: Arc<RgbaImage>,
    /// World-to-pixel mapping for `image`
    pub projector: Arc<dyn CameraProjector>,
}

impl CameraFrame {
    /// Bundle a frame
    pub fn new(device_transform: RigidTransform, image: RgbaImage, projector: Arc<dyn CameraProjector>) -> Self {
        Self {
            device_transform,
            image: Arc::new(image),
            projector,
        }
    }

    /// Viewer position, the device origin
    #[must_use]
    pub fn viewer_position(&self) -> Point3<f64> {
        self.device_transform.origin()
    }

    /// Viewer up axis, the device Y axis
    #[must_use]
    pub fn viewer_up(&self) -> Vector3<f64> {
        self.device_transform.y_axis()
    }
}

impl fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraFrame")
            .field("device_transform", &self.device_transform)
            .field("image", &(self.image.width(), self.image.height()))
            .finish_non_exhaustive()
    }
}
