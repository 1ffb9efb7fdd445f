//! Helper functions and utilities for tests

#![allow(dead_code)]

use circle_search::{
    camera::{CameraFrame, PinholeProjector},
    geometry::RigidTransform,
    session::CaptureSession,
    stroke_tracker::{StrokeInput, TrackerEvent},
    Result,
};
use image::{Rgba, RgbaImage};
use nalgebra::{Point3, Rotation3};
use std::sync::Arc;

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Points of a circle parallel to the XY plane, closed (first point repeated at the end)
pub fn circle_points(center: Point3<f64>, radius: f64, n: usize) -> Vec<Point3<f64>> {
    (0..=n)
        .map(|i| {
            let angle = i as f64 / n as f64 * std::f64::consts::TAU;
            Point3::new(center.x + radius * angle.cos(), center.y + radius * angle.sin(), center.z)
        })
        .collect()
}

/// Closed unit square in the XY plane, corners only
pub fn unit_square() -> Vec<Point3<f64>> {
    vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
    ]
}

/// Image split into four colored quadrants: red, green / blue, white
pub fn quadrant_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| match (x < width / 2, y < height / 2) {
        (true, true) => RED,
        (false, true) => GREEN,
        (true, false) => BLUE,
        (false, false) => WHITE,
    })
}

/// Device and camera at `position`, looking along -Z
pub fn frontal_frame(position: Point3<f64>, image: RgbaImage) -> CameraFrame {
    let pose = RigidTransform::from_rotation(position, Rotation3::identity());
    let camera = PinholeProjector::centered(500.0, pose, image.width(), image.height());
    CameraFrame::new(pose, image, Arc::new(camera))
}

/// Draw `points` with 10 ms ticks starting at `t0`, then release the pinch
pub fn draw(session: &mut CaptureSession, points: &[Point3<f64>], t0: f64) -> Result<Vec<TrackerEvent>> {
    let mut events = Vec::new();
    for (i, point) in points.iter().enumerate() {
        events.extend(session.receive(Some(StrokeInput::drawing(*point)), t0 + i as f64 * 0.01)?);
    }
    let last = points.last().copied().unwrap_or_else(Point3::origin);
    events.extend(session.receive(Some(StrokeInput::released(last)), t0 + points.len() as f64 * 0.01)?);
    Ok(events)
}
