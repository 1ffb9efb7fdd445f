//! Perspective crop of the camera image under a world-space panel.
//!
//! The panel corners are mapped into the camera image, a homography from that
//! quadrilateral to an upright rectangle is solved, and the image is warped
//! through its inverse with bilinear sampling. Destination pixels use integer
//! coordinates; samples outside the source are transparent black.

use crate::{
    camera::CameraProjector,
    config::CropConfig,
    constants::{GEOMETRY_EPSILON, HOMOGRAPHY_DET_EPSILON},
    geometry::PanelPlacement,
    Error, Result,
};
use image::{Rgba, RgbaImage};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};
use rayon::prelude::*;

/// Solve the homography mapping each `src[i]` onto `dst[i]`, normalized so `h33 = 1`.
///
/// # Errors
///
/// Returns [`Error::DegenerateQuadrilateral`] when three source points are
/// colinear or the system is singular
pub fn solve_homography(src: &[Point2<f64>; 4], dst: &[Point2<f64>; 4]) -> Result<Matrix3<f64>> {
    check_quad(src)?;

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for (i, (p, q)) in src.iter().zip(dst).enumerate() {
        let (x, y, u, v) = (p.x, p.y, q.x, q.y);
        let r0 = 2 * i;
        let r1 = 2 * i + 1;

        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let h = a
        .lu()
        .solve(&b)
        .ok_or_else(|| Error::DegenerateQuadrilateral("singular correspondence system".to_string()))?;

    let homography = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
    let det = homography.determinant();
    if !det.is_finite() || det.abs() < HOMOGRAPHY_DET_EPSILON {
        return Err(Error::DegenerateQuadrilateral(format!("homography determinant {det:e}")));
    }
    Ok(homography)
}

/// Reject quads with any three colinear corners, relative to the quad's size
fn check_quad(quad: &[Point2<f64>; 4]) -> Result<()> {
    let extent = quad
        .iter()
        .flat_map(|p| quad.iter().map(move |q| (p - q).norm()))
        .fold(0.0_f64, f64::max);
    if !extent.is_finite() || extent < GEOMETRY_EPSILON {
        return Err(Error::DegenerateQuadrilateral(format!("quad extent {extent}")));
    }

    let tolerance = GEOMETRY_EPSILON * extent * extent;
    for (i, j, k) in [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)] {
        let e1 = quad[j] - quad[i];
        let e2 = quad[k] - quad[i];
        let area = (e1.x * e2.y - e1.y * e2.x).abs();
        if area < tolerance {
            return Err(Error::DegenerateQuadrilateral(format!(
                "corners {i}, {j} and {k} are colinear"
            )));
        }
    }
    Ok(())
}

/// Warp `src` through `homography` into a `width` × `height` image.
///
/// Each destination pixel `(x, y)` samples the source at `H⁻¹ · (x, y, 1)`.
///
/// # Errors
///
/// - [`Error::DegenerateQuadrilateral`] if `homography` is not invertible
/// - [`Error::CropFailure`] for an empty output size or if a destination pixel maps to a non-finite source position
pub fn warp_perspective(src: &RgbaImage, homography: &Matrix3<f64>, width: u32, height: u32) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(Error::CropFailure(format!("empty output size {width}x{height}")));
    }
    let inverse = homography
        .try_inverse()
        .ok_or_else(|| Error::DegenerateQuadrilateral("homography is not invertible".to_string()))?;

    let stride = width as usize * 4;
    let mut buffer = vec![0u8; stride * height as usize];

    buffer.par_chunks_mut(stride).enumerate().try_for_each(|(y, row)| {
        #[allow(clippy::cast_precision_loss)]
        let dst_y = y as f64;
        for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let mapped = inverse * Vector3::new(x as f64, dst_y, 1.0);
            let sx = mapped.x / mapped.z;
            let sy = mapped.y / mapped.z;
            if !sx.is_finite() || !sy.is_finite() {
                return Err(Error::CropFailure(format!("pixel ({x}, {y}) maps to a non-finite position")));
            }
            pixel.copy_from_slice(&bilinear_sample(src, sx, sy).0);
        }
        Ok(())
    })?;

    RgbaImage::from_raw(width, height, buffer)
        .ok_or_else(|| Error::CropFailure(format!("buffer does not fit {width}x{height}")))
}

/// Bilinear sample with a transparent black border
fn bilinear_sample(src: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (width, height) = src.dimensions();
    if x <= -1.0 || y <= -1.0 || x >= f64::from(width) || y >= f64::from(height) {
        return Rgba([0, 0, 0, 0]);
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let mut acc = [0.0_f64; 4];
    for (dx, dy, weight) in [
        (0.0, 0.0, (1.0 - fx) * (1.0 - fy)),
        (1.0, 0.0, fx * (1.0 - fy)),
        (0.0, 1.0, (1.0 - fx) * fy),
        (1.0, 1.0, fx * fy),
    ] {
        let px = x0 + dx;
        let py = y0 + dy;
        if weight == 0.0 || px < 0.0 || py < 0.0 || px >= f64::from(width) || py >= f64::from(height) {
            continue;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let sample = src.get_pixel(px as u32, py as u32);
        for (channel, value) in acc.iter_mut().zip(sample.0) {
            *channel += weight * f64::from(value);
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let channels = acc.map(|v| v.round().clamp(0.0, 255.0) as u8);
    Rgba(channels)
}

/// Extracts the camera image under a panel as an upright rectangle
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCropper {
    short_side_px: u32,
    max_output_side_px: u32,
}

impl Default for PerspectiveCropper {
    fn default() -> Self {
        Self::from_config(&CropConfig::default())
    }
}

impl PerspectiveCropper {
    /// Create a cropper from configuration
    #[must_use]
    pub fn from_config(config: &CropConfig) -> Self {
        Self {
            short_side_px: config.short_side_px,
            max_output_side_px: config.max_output_side_px,
        }
    }

    /// Output size for a panel of `width` × `height` meters.
    ///
    /// The shorter side gets `short_side_px`, the other keeps the aspect ratio.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CropFailure`] for a non-positive panel or an output above the size limit
    pub fn output_size(&self, width: f64, height: f64) -> Result<(u32, u32)> {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(Error::CropFailure(format!("panel has no extent: {width} x {height}")));
        }

        let short = f64::from(self.short_side_px);
        let (w, h) = if width <= height {
            (short, (short * height / width).round())
        } else {
            ((short * width / height).round(), short)
        };

        let limit = f64::from(self.max_output_side_px);
        if w > limit || h > limit {
            return Err(Error::CropFailure(format!(
                "output {w}x{h} exceeds {} pixels",
                self.max_output_side_px
            )));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let size = (w.max(1.0) as u32, h.max(1.0) as u32);
        Ok(size)
    }

    /// Crop the part of `image` covered by `panel`.
    ///
    /// # Errors
    ///
    /// - [`Error::CropFailure`] for an empty source image or an unusable panel size
    /// - [`Error::ProjectionFailure`] if a corner cannot be mapped into the image
    /// - [`Error::DegenerateQuadrilateral`] if the mapped corners admit no homography
    pub fn crop(&self, panel: &PanelPlacement, projector: &dyn CameraProjector, image: &RgbaImage) -> Result<RgbaImage> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::CropFailure("source image is empty".to_string()));
        }

        let mut src = [Point2::origin(); 4];
        for (slot, (corner, world)) in src.iter_mut().zip(panel.corners().named()) {
            *slot = projector.project(&world).ok_or(Error::ProjectionFailure { corner })?;
        }

        let (width, height) = self.output_size(panel.width, panel.height)?;
        let (w, h) = (f64::from(width), f64::from(height));
        let dst = [
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ];

        let homography = solve_homography(&src, &dst)?;
        log::debug!("Cropping quad {src:?} into {width}x{height}");
        warp_perspective(image, &homography, width, height)
    }
}
