//! Placement of the companion result panel next to the image panel.

use crate::{
    config::PanelConfig,
    geometry::{PanelPlacement, RigidTransform},
    Result,
};
use nalgebra::{Point3, Vector3};

/// Places the companion panel to the right of the image panel, top edges aligned
#[derive(Debug, Clone, Copy)]
pub struct PanelPlacer {
    width: f64,
    height: f64,
    spacing: f64,
    world_up: Vector3<f64>,
}

impl Default for PanelPlacer {
    fn default() -> Self {
        Self::from_config(&PanelConfig::default())
    }
}

impl PanelPlacer {
    /// Create a placer from configuration
    #[must_use]
    pub fn from_config(config: &PanelConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            spacing: config.spacing,
            world_up: config.world_up(),
        }
    }

    /// Companion panel placement for `image_panel` seen from `viewer`.
    ///
    /// The panel center sits at `(w/2 + spacing + width/2, h/2 - height/2, 0)` in
    /// the image panel's frame, and its +Z axis points at the viewer.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::DegenerateViewpoint`] if the viewer sits on the panel center
    /// - [`crate::Error::ParallelAxes`] if the viewer is straight above or below the panel
    pub fn place(&self, image_panel: &PanelPlacement, viewer: &Point3<f64>) -> Result<PanelPlacement> {
        let offset = Point3::new(
            image_panel.width / 2.0 + self.spacing + self.width / 2.0,
            image_panel.height / 2.0 - self.height / 2.0,
            0.0,
        );
        let position = image_panel.transform.transform_point(&offset);
        let transform = RigidTransform::look_at(position, *viewer, &self.world_up)?;

        log::debug!("Companion panel at {position}");
        Ok(PanelPlacement::new(transform, self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn image_panel() -> PanelPlacement {
        PanelPlacement::new(RigidTransform::identity(), 1.0, 1.0)
    }

    #[test]
    fn test_offset_and_size() {
        let placement = PanelPlacer::default()
            .place(&image_panel(), &Point3::new(0.7, 0.25, 3.0))
            .unwrap();
        assert!((placement.center() - Point3::new(0.7, 0.25, 0.0)).norm() < 1e-12);
        assert_eq!((placement.width, placement.height), (0.3, 0.5));
    }

    #[test]
    fn test_top_edges_align_when_facing() {
        let companion = PanelPlacer::default()
            .place(&image_panel(), &Point3::new(0.7, 0.25, 3.0))
            .unwrap();
        let image_top = image_panel().corners().top_left.y;
        let companion_top = companion.corners().top_left.y;
        assert!((image_top - companion_top).abs() < 1e-12);
        // Left edge of the companion is `spacing` right of the image panel
        assert!((companion.corners().top_left.x - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_faces_viewer() {
        let viewer = Point3::new(-1.0, 1.5, 2.0);
        let companion = PanelPlacer::default().place(&image_panel(), &viewer).unwrap();
        let to_viewer = (viewer - companion.center()).normalize();
        assert!((companion.transform.z_axis() - to_viewer).norm() < 1e-9);
        // X stays horizontal
        assert!(companion.transform.x_axis().y.abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_viewpoints() {
        let placer = PanelPlacer::default();
        assert!(matches!(
            placer.place(&image_panel(), &Point3::new(0.7, 0.25, 0.0)),
            Err(Error::DegenerateViewpoint)
        ));
        assert!(matches!(
            placer.place(&image_panel(), &Point3::new(0.7, 5.0, 0.0)),
            Err(Error::ParallelAxes)
        ));
    }
}
