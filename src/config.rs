//! Configuration management for the circle search core

use crate::{constants, Error, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stroke tracking configuration
    pub tracker: TrackerConfig,

    /// Curve pipeline configuration
    pub pipeline: PipelineConfig,

    /// Perspective crop configuration
    pub crop: CropConfig,

    /// Companion panel configuration
    pub panel: PanelConfig,
}

/// Stroke tracking parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Length of the sliding speed window in seconds
    pub speed_window_secs: f64,

    /// Speed filter specification, e.g. `truncated_mean:2`
    pub speed_filter: String,

    /// Duration of the stroke fade-out in seconds
    pub fade_duration_secs: f64,
}

/// Curve pipeline parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of points a finished curve is resampled to
    pub resample_count: usize,

    /// Rotate fitted planes half a turn about their normal
    pub legacy_display_flip: bool,
}

/// Perspective crop parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Length of the shorter output side in pixels
    pub short_side_px: u32,

    /// Upper bound for either output side in pixels; longer crops fail instead of allocating
    pub max_output_side_px: u32,
}

/// Companion panel parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Panel width in meters
    pub width: f64,

    /// Panel height in meters
    pub height: f64,

    /// Gap between the image panel and the companion panel in meters
    pub spacing: f64,

    /// World up direction used to orient the companion panel
    pub world_up: [f64; 3],
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            speed_window_secs: constants::SPEED_WINDOW_SECS,
            speed_filter: constants::DEFAULT_SPEED_FILTER.to_string(),
            fade_duration_secs: constants::FADE_DURATION_SECS,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resample_count: constants::RESAMPLE_COUNT,
            legacy_display_flip: true,
        }
    }
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            short_side_px: constants::CROP_SHORT_SIDE_PX,
            max_output_side_px: constants::MAX_CROP_SIDE_PX,
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: constants::COMPANION_PANEL_WIDTH,
            height: constants::COMPANION_PANEL_HEIGHT,
            spacing: constants::COMPANION_PANEL_SPACING,
            world_up: constants::WORLD_UP,
        }
    }
}

impl PanelConfig {
    /// World up as a vector
    #[must_use]
    pub fn world_up(&self) -> Vector3<f64> {
        Vector3::from(self.world_up)
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        // Tracker
        if !(self.tracker.speed_window_secs > 0.0) {
            return Err(Error::ConfigError("Speed window must be greater than 0".to_string()));
        }
        if !(self.tracker.fade_duration_secs >= 0.0) {
            return Err(Error::ConfigError("Fade duration must not be negative".to_string()));
        }
        crate::filters::create_filter(&self.tracker.speed_filter)
            .map_err(|e| Error::ConfigError(format!("Invalid speed filter: {e}")))?;

        // Pipeline
        if self.pipeline.resample_count < 3 {
            return Err(Error::ConfigError("Resample count must be at least 3".to_string()));
        }

        // Crop
        if self.crop.short_side_px == 0 {
            return Err(Error::ConfigError("Crop short side must be greater than 0".to_string()));
        }
        if self.crop.max_output_side_px < self.crop.short_side_px {
            return Err(Error::ConfigError(
                "Maximum crop side must not be smaller than the short side".to_string(),
            ));
        }

        // Panel
        if !(self.panel.width > 0.0 && self.panel.height > 0.0) {
            return Err(Error::ConfigError("Panel size must be positive".to_string()));
        }
        if !(self.panel.spacing >= 0.0) {
            return Err(Error::ConfigError("Panel spacing must not be negative".to_string()));
        }
        let up = self.panel.world_up();
        if !up.iter().all(|c| c.is_finite()) || up.norm() < constants::GEOMETRY_EPSILON {
            return Err(Error::ConfigError("World up must be a finite non-zero vector".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Circle Search Configuration

# Stroke tracking
tracker:
  speed_window_secs: 0.1
  speed_filter: "truncated_mean:2"
  fade_duration_secs: 0.3

# Curve pipeline
pipeline:
  resample_count: 1024
  legacy_display_flip: true

# Perspective crop
crop:
  short_side_px: 1080
  max_output_side_px: 8192

# Companion panel
panel:
  width: 0.3
  height: 0.5
  spacing: 0.05
  world_up: [0.0, 1.0, 0.0]
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_example_matches_default() {
        let parsed: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = serde_yaml::from_str("crop:\n  short_side_px: 720\n").unwrap();
        assert_eq!(parsed.crop.short_side_px, 720);
        assert_eq!(parsed.crop.max_output_side_px, constants::MAX_CROP_SIDE_PX);
        assert_eq!(parsed.tracker, TrackerConfig::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.tracker.speed_filter = "kalman".to_string();
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let mut config = Config::default();
        config.pipeline.resample_count = 2;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.panel.world_up = [0.0, 0.0, 0.0];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tracker.speed_window_secs = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.crop.max_output_side_px = 100;
        assert!(config.validate().is_err());
    }
}
