//! Circle search core: from a freehand circle gesture to a perspective-corrected crop.
//!
//! A user pinches and traces a loose circle in the air around something they see.
//! This library turns that stroke into:
//! - a rectangular, perspective-corrected image cut out of the live camera frame
//! - world placements for the panel showing that image and for a companion panel
//!
//! The pipeline for a finished stroke consists of:
//! 1. Arc-length resampling of the stroke to a fixed number of points
//! 2. Fitting a viewer-facing plane through three representative points
//! 3. Sizing the panel from the stroke's extent in that plane
//! 4. Solving a homography from the panel corners seen by the camera and warping the image
//! 5. Placing the companion panel next to the image panel, facing the viewer
//!
//! # Examples
//!
//! ## Running the pipeline for one curve
//!
//! ```no_run
//! use circle_search::{
//!     camera::{CameraFrame, PinholeProjector},
//!     circle_store::CircleStore,
//!     geometry::RigidTransform,
//!     pipeline::CurvePipeline,
//! };
//! use image::RgbaImage;
//! use nalgebra::{Point3, Rotation3};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = CircleStore::new();
//! let curve = store.create_new_circle();
//! for i in 0..64 {
//!     let angle = f64::from(i) / 64.0 * std::f64::consts::TAU;
//!     store.add_point(curve, Point3::new(0.2 * angle.cos(), 0.2 * angle.sin(), 0.0))?;
//! }
//! store.mark_done(curve)?;
//!
//! let device = RigidTransform::from_rotation(Point3::new(0.0, 0.0, 1.5), Rotation3::identity());
//! let camera = PinholeProjector::centered(900.0, device, 1280, 960);
//! let frame = CameraFrame::new(device, RgbaImage::new(1280, 960), Arc::new(camera));
//!
//! let visuals = CurvePipeline::default().process(&store.snapshot(curve)?, &frame)?;
//! println!("{}x{} crop", visuals.image.width(), visuals.image.height());
//! # Ok(())
//! # }
//! ```
//!
//! ## Driving a session from input ticks
//!
//! ```no_run
//! use circle_search::{config::Config, session::CaptureSession, stroke_tracker::StrokeInput};
//! use nalgebra::Point3;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = CaptureSession::new(&Config::default())?;
//! session.receive(Some(StrokeInput::drawing(Point3::new(0.1, 0.0, 0.0))), 0.00)?;
//! session.receive(Some(StrokeInput::drawing(Point3::new(0.0, 0.1, 0.0))), 0.01)?;
//! session.receive(None, 0.02)?;
//! for update in session.poll(0.03) {
//!     println!("{update:?}");
//! }
//! # Ok(())
//! # }
//! ```

/// Lifecycle registry of gesture curves
pub mod circle_store;

/// Arc-length resampling of point sequences
pub mod resample;

/// Speed smoothing filters for the stroke tracker
pub mod filters;

/// Fingertip ingestion and the drawing state machine
pub mod stroke_tracker;

/// Cancelable fade-out timelines
pub mod fade;

/// Rigid transforms and panel placements
pub mod geometry;

/// Viewer-facing plane fitting
pub mod plane_fit;

/// Projection into a plane frame and bounding box sizing
pub mod projection;

/// Camera projection seam and camera frames
pub mod camera;

/// Homography solving and perspective cropping
pub mod crop;

/// Companion panel placement
pub mod panel;

/// The per-curve geometry pipeline
pub mod pipeline;

/// Background pipeline worker
pub mod worker;

/// Input-thread session wiring tracker, store and worker
pub mod session;

/// Recorded stroke sessions
pub mod replay;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
