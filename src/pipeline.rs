//! Per-curve geometry pipeline: resample, fit, size, crop, place.

use crate::{
    camera::CameraFrame,
    circle_store::{CurveId, CurveSnapshot},
    config::Config,
    crop::PerspectiveCropper,
    geometry::PanelPlacement,
    panel::PanelPlacer,
    plane_fit::PlaneFitter,
    projection::bounding_box_size,
    resample::resample,
    Result,
};
use image::RgbaImage;
use std::time::Instant;

/// Everything produced for one finished curve
#[derive(Debug, Clone)]
pub struct CircleVisuals {
    /// Curve the visuals belong to
    pub curve: CurveId,
    /// Perspective-corrected crop of the camera image
    pub image: RgbaImage,
    /// Placement of the image panel
    pub image_panel: PanelPlacement,
    /// Placement of the companion result panel
    pub companion_panel: PanelPlacement,
}

/// The pure pipeline with its configuration baked in
#[derive(Debug, Clone, Copy)]
pub struct CurvePipeline {
    resample_count: usize,
    fitter: PlaneFitter,
    cropper: PerspectiveCropper,
    placer: PanelPlacer,
}

impl Default for CurvePipeline {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl CurvePipeline {
    /// Create a pipeline from configuration
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            resample_count: config.pipeline.resample_count,
            fitter: PlaneFitter::from_config(&config.pipeline),
            cropper: PerspectiveCropper::from_config(&config.crop),
            placer: PanelPlacer::from_config(&config.panel),
        }
    }

    /// Image panel placement for a finished curve, without touching the camera image
    ///
    /// # Errors
    ///
    /// Any resampling, plane fitting or sizing error
    pub fn image_panel(&self, snapshot: &CurveSnapshot, frame: &CameraFrame) -> Result<PanelPlacement> {
        let viewer = frame.viewer_position();
        let resampled = resample(&snapshot.points, self.resample_count)?;
        let plane = self.fitter.fit_curve(&resampled, &viewer, &frame.viewer_up())?;
        let (width, height) = bounding_box_size(&snapshot.points, &plane)?;
        Ok(PanelPlacement::new(plane, width, height))
    }

    /// Run the whole pipeline for a finished curve
    ///
    /// # Errors
    ///
    /// The first error of any stage; nothing is produced for the curve in that case
    pub fn process(&self, snapshot: &CurveSnapshot, frame: &CameraFrame) -> Result<CircleVisuals> {
        let start = Instant::now();

        let image_panel = self.image_panel(snapshot, frame)?;
        let image = self.cropper.crop(&image_panel, frame.projector.as_ref(), &frame.image)?;
        let companion_panel = self.placer.place(&image_panel, &frame.viewer_position())?;

        log::info!(
            "Curve {}: {:.3} x {:.3} m panel, {}x{} crop in {:?}",
            snapshot.id,
            image_panel.width,
            image_panel.height,
            image.width(),
            image.height(),
            start.elapsed()
        );

        Ok(CircleVisuals {
            curve: snapshot.id,
            image,
            image_panel,
            companion_panel,
        })
    }
}
