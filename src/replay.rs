//! Recorded stroke sessions and their replay through a [`CaptureSession`].
//!
//! A recording is a YAML document holding the device pose, a pinhole camera and
//! the per-tick fingertip samples:
//!
//! ```yaml
//! device:
//!   position: [0.0, 0.0, 2.0]
//! camera:
//!   focal_px: 800.0
//!   width: 1280
//!   height: 960
//! samples:
//!   - { time: 0.00, tip: [0.2, 0.0, 0.0], drawing: true }
//!   - { time: 0.01, tip: [0.19, 0.06, 0.0], drawing: true }
//!   - { time: 0.02 }
//! ```
//!
//! A sample without `tip` means the hand was not tracked on that tick.

use crate::{
    camera::{CameraFrame, PinholeProjector},
    circle_store::CurveId,
    config::Config,
    geometry::RigidTransform,
    pipeline::CircleVisuals,
    session::{CaptureSession, SessionUpdate},
    stroke_tracker::{StrokeInput, TrackerEvent},
    Error, Result,
};
use image::RgbaImage;
use nalgebra::{Point3, Rotation3};
use serde::{Deserialize, Serialize};
use std::{path::Path, sync::Arc, time::Duration};

/// How long a replay waits for each pipeline result
const RESULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Position plus Euler angles in degrees (roll, pitch, yaw)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    /// World position
    pub position: [f64; 3],
    /// Roll, pitch and yaw in degrees
    #[serde(default)]
    pub rotation_deg: [f64; 3],
}

impl PoseRecord {
    /// Rigid transform of this pose
    #[must_use]
    pub fn to_transform(&self) -> RigidTransform {
        let [roll, pitch, yaw] = self.rotation_deg.map(f64::to_radians);
        RigidTransform::from_rotation(
            Point3::from(self.position),
            Rotation3::from_euler_angles(roll, pitch, yaw),
        )
    }
}

/// Pinhole camera of the recording
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    /// Focal length in pixels
    pub focal_px: f64,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Camera pose; the device pose when absent
    #[serde(default)]
    pub pose: Option<PoseRecord>,
}

/// One input tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Timestamp in seconds
    pub time: f64,
    /// Fingertip position, absent when the hand was not tracked
    #[serde(default)]
    pub tip: Option<[f64; 3]>,
    /// Whether the fingers were pinched
    #[serde(default)]
    pub drawing: bool,
}

impl SampleRecord {
    /// Tracker input for this tick
    #[must_use]
    pub fn input(&self) -> Option<StrokeInput> {
        self.tip.map(|tip| StrokeInput {
            tip: Point3::from(tip),
            is_drawing: self.drawing,
        })
    }
}

/// A recorded drawing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Device (viewer) pose
    pub device: PoseRecord,
    /// Camera
    pub camera: CameraRecord,
    /// Input ticks in time order
    pub samples: Vec<SampleRecord>,
}

impl Recording {
    /// Load a recording from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a recording from YAML
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for malformed or inconsistent recordings
    pub fn from_yaml(content: &str) -> Result<Self> {
        let recording: Self =
            serde_yaml::from_str(content).map_err(|e| Error::InvalidInput(format!("Failed to parse recording: {e}")))?;
        recording.validate()?;
        Ok(recording)
    }

    /// Save the recording as YAML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::InvalidInput(format!("Failed to serialize recording: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check timestamps and camera parameters
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] describing the first problem
    pub fn validate(&self) -> Result<()> {
        if !(self.camera.focal_px > 0.0) || self.camera.width == 0 || self.camera.height == 0 {
            return Err(Error::InvalidInput("Camera needs a positive focal length and size".to_string()));
        }

        let mut previous = f64::NEG_INFINITY;
        for (index, sample) in self.samples.iter().enumerate() {
            if !sample.time.is_finite() || sample.time < previous {
                return Err(Error::InvalidInput(format!(
                    "Sample {index} has time {} after {previous}",
                    sample.time
                )));
            }
            if sample.tip.is_some_and(|tip| !tip.iter().all(|c| c.is_finite())) {
                return Err(Error::InvalidInput(format!("Sample {index} has a non-finite tip")));
            }
            previous = sample.time;
        }
        Ok(())
    }

    /// Device transform
    #[must_use]
    pub fn device_transform(&self) -> RigidTransform {
        self.device.to_transform()
    }

    /// Pinhole camera of the recording
    #[must_use]
    pub fn projector(&self) -> PinholeProjector {
        let pose = self.camera.pose.unwrap_or(self.device).to_transform();
        PinholeProjector::centered(self.camera.focal_px, pose, self.camera.width, self.camera.height)
    }

    /// Camera frame bundling `image` with this recording's poses
    #[must_use]
    pub fn camera_frame(&self, image: RgbaImage) -> CameraFrame {
        CameraFrame::new(self.device_transform(), image, Arc::new(self.projector()))
    }

    /// Recording of one circle of `radius` around `center`, parallel to the world XY plane,
    /// drawn over `ticks` samples 10 ms apart and then released by losing the hand
    #[must_use]
    pub fn circle(device: PoseRecord, camera: CameraRecord, center: Point3<f64>, radius: f64, ticks: u32) -> Self {
        let step = 0.01;
        let mut samples: Vec<SampleRecord> = (0..=ticks)
            .map(|i| {
                let angle = f64::from(i) / f64::from(ticks.max(1)) * std::f64::consts::TAU;
                SampleRecord {
                    time: f64::from(i) * step,
                    tip: Some([center.x + radius * angle.cos(), center.y + radius * angle.sin(), center.z]),
                    drawing: true,
                }
            })
            .collect();
        samples.push(SampleRecord {
            time: f64::from(ticks + 1) * step,
            tip: None,
            drawing: false,
        });
        Self { device, camera, samples }
    }
}

/// What a replay produced
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    /// Curves finished during the replay
    pub finished: Vec<CurveId>,
    /// Visuals of the last finished curve, if its pipeline succeeded
    pub visuals: Option<CircleVisuals>,
    /// Curves whose pipeline failed, with the reason
    pub failures: Vec<(CurveId, String)>,
}

/// Pipeline results seen so far
#[derive(Default)]
struct Tally {
    handled: usize,
    failures: Vec<(CurveId, String)>,
}

impl Tally {
    fn record(&mut self, updates: Vec<SessionUpdate>) {
        for update in updates {
            match update {
                SessionUpdate::VisualsReady { .. } | SessionUpdate::StaleDiscarded { .. } => self.handled += 1,
                SessionUpdate::PipelineFailed { curve, reason } => {
                    self.handled += 1;
                    self.failures.push((curve, reason));
                }
                SessionUpdate::StrokeFade(_) | SessionUpdate::VisualsFade(_) => {}
            }
        }
    }
}

/// Feed `recording` through a worker-backed session, using `image` as the camera image.
///
/// # Errors
///
/// Returns an error for an invalid configuration, a store failure or a worker that stops responding
pub fn replay(recording: &Recording, image: RgbaImage, config: &Config) -> Result<ReplayOutcome> {
    let mut session = CaptureSession::new(config)?;
    session.set_camera_frame(recording.camera_frame(image));

    let mut finished = Vec::new();
    let mut tally = Tally::default();
    let mut last_time = 0.0;
    for sample in &recording.samples {
        for event in session.receive(sample.input(), sample.time)? {
            if let TrackerEvent::CurveFinished { curve } = event {
                finished.push(curve);
            }
        }
        tally.record(session.poll(sample.time));
        last_time = sample.time;
    }

    while tally.handled < finished.len() {
        if !session.wait_for_result(RESULT_TIMEOUT)? {
            return Err(Error::WorkerUnavailable);
        }
        tally.record(session.poll(last_time));
    }

    log::info!(
        "Replay finished {} curve(s), {} failure(s)",
        finished.len(),
        tally.failures.len()
    );
    Ok(ReplayOutcome {
        visuals: session.current_visuals().cloned(),
        finished,
        failures: tally.failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> PoseRecord {
        PoseRecord {
            position: [0.0, 0.0, 2.0],
            rotation_deg: [0.0, 0.0, 0.0],
        }
    }

    fn camera() -> CameraRecord {
        CameraRecord {
            focal_px: 500.0,
            width: 640,
            height: 480,
            pose: None,
        }
    }

    #[test]
    fn test_parse_recording() {
        let yaml = r"
device:
  position: [0.0, 0.0, 2.0]
camera:
  focal_px: 800.0
  width: 1280
  height: 960
samples:
  - { time: 0.00, tip: [0.2, 0.0, 0.0], drawing: true }
  - { time: 0.01, tip: [0.19, 0.06, 0.0], drawing: true }
  - { time: 0.02 }
";
        let recording = Recording::from_yaml(yaml).unwrap();
        assert_eq!(recording.samples.len(), 3);
        assert_eq!(recording.samples[2].input(), None);
        assert_eq!(recording.device.rotation_deg, [0.0, 0.0, 0.0]);
        assert!(recording.samples[0].input().unwrap().is_drawing);
    }

    #[test]
    fn test_time_must_not_go_backwards() {
        let mut recording = Recording::circle(device(), camera(), Point3::origin(), 0.2, 10);
        recording.samples[3].time = 0.0;
        assert!(matches!(recording.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_camera_defaults_to_device_pose() {
        let recording = Recording::circle(device(), camera(), Point3::origin(), 0.2, 10);
        let pixel = crate::camera::CameraProjector::project(&recording.projector(), &Point3::origin()).unwrap();
        assert!((pixel.x - 320.0).abs() < 1e-9);
        assert!((pixel.y - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_file_round_trip() {
        let recording = Recording::circle(device(), camera(), Point3::origin(), 0.2, 12);
        let file = tempfile::NamedTempFile::new().unwrap();
        recording.to_file(file.path()).unwrap();
        assert_eq!(Recording::from_file(file.path()).unwrap(), recording);
    }

    #[test]
    fn test_replay_circle() {
        let recording = Recording::circle(device(), camera(), Point3::origin(), 0.2, 40);
        let outcome = replay(&recording, RgbaImage::new(640, 480), &Config::default()).unwrap();

        assert_eq!(outcome.finished.len(), 1);
        assert!(outcome.failures.is_empty());
        let visuals = outcome.visuals.unwrap();
        assert_eq!(visuals.curve, outcome.finished[0]);
        assert!((visuals.image_panel.width - 0.4).abs() < 1e-3);
    }
}
