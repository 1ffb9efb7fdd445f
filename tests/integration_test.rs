//! Integration tests for the gesture-to-crop pipeline

mod test_helpers;

use circle_search::{
    circle_store::{CircleStore, CurveId, CurveSnapshot},
    config::Config,
    pipeline::CurvePipeline,
    plane_fit::{compute_center, PlaneFitter},
    projection::{bounding_box_size, project},
    resample::resample,
    replay::{replay, CameraRecord, PoseRecord, Recording},
    session::{CaptureSession, SessionUpdate},
    stroke_tracker::{StrokeInput, StrokeTracker, TrackerEvent},
    Result,
};
use nalgebra::{Point3, Vector3};
use std::time::Duration;
use test_helpers::{circle_points, draw, frontal_frame, quadrant_image, unit_square, BLUE, GREEN, RED, WHITE};

/// Tracker, store and pipeline wired by hand
#[test]
fn test_full_pipeline() -> Result<()> {
    let mut store = CircleStore::new();
    let mut tracker = StrokeTracker::default();

    let points = circle_points(Point3::origin(), 0.2, 48);
    let mut finished = None;
    for (i, point) in points.iter().enumerate() {
        tracker.receive(&mut store, Some(StrokeInput::drawing(*point)), i as f64 * 0.01)?;
    }
    for event in tracker.receive(&mut store, None, 1.0)? {
        if let TrackerEvent::CurveFinished { curve } = event {
            finished = Some(curve);
        }
    }

    let curve = finished.expect("curve should finish on release");
    let frame = frontal_frame(Point3::new(0.0, 0.0, 2.0), quadrant_image(640, 480));
    let visuals = CurvePipeline::default().process(&store.snapshot(curve)?, &frame)?;

    assert_eq!(visuals.curve, curve);
    assert!((visuals.image_panel.width - 0.4).abs() < 1e-3);
    assert!((visuals.image_panel.height - 0.4).abs() < 1e-3);
    assert_eq!(visuals.image.dimensions(), (1080, 1080));
    Ok(())
}

/// The unit square drawn facing the viewer fits a plane with normal +Z and size 1 x 1
#[test]
fn test_square_gesture_end_to_end() -> Result<()> {
    let mut session = CaptureSession::inline(&Config::default())?;
    session.set_camera_frame(frontal_frame(Point3::new(0.5, 0.5, 3.0), quadrant_image(1280, 960)));
    draw(&mut session, &unit_square(), 0.0)?;

    session.poll(1.0);
    let visuals = session.current_visuals().expect("visuals for the square");
    let panel = &visuals.image_panel;
    assert!((panel.transform.z_axis() - Vector3::z()).norm() < 1e-6);
    assert!((panel.width - 1.0).abs() < 1e-6);
    assert!((panel.height - 1.0).abs() < 1e-6);
    Ok(())
}

/// Open square of four corners resampled to 100 points, viewer straight ahead at z = 5
#[test]
fn test_open_square_stages() -> Result<()> {
    let square = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let viewer = Point3::new(0.5, 0.5, 5.0);

    let resampled = resample(&square, 100)?;
    assert_eq!(resampled.len(), 100);
    let plane = PlaneFitter::default().fit_curve(&resampled, &viewer, &Vector3::y())?;
    assert!((plane.z_axis() - Vector3::z()).norm() < 1e-9);

    let (width, height) = bounding_box_size(&square, &plane)?;
    assert!((width - 1.0).abs() < 1e-9);
    assert!((height - 1.0).abs() < 1e-9);

    let center = compute_center(&resampled).expect("non-empty curve");
    let local = project(&center, &plane);
    assert!(local.x.abs() < 1e-9 && local.y.abs() < 1e-9);

    // Same inputs through the configured pipeline
    let mut config = Config::default();
    config.pipeline.resample_count = 100;
    let snapshot = CurveSnapshot {
        id: CurveId::new(0),
        points: square.to_vec(),
    };
    let frame = frontal_frame(viewer, quadrant_image(1280, 960));
    let visuals = CurvePipeline::new(&config).process(&snapshot, &frame)?;
    assert!((visuals.image_panel.transform.z_axis() - Vector3::z()).norm() < 1e-9);
    assert!((visuals.image_panel.width - 1.0).abs() < 1e-9);
    assert!((visuals.image_panel.height - 1.0).abs() < 1e-9);
    assert_eq!(visuals.image.dimensions(), (1080, 1080));
    Ok(())
}

/// The crop comes out upright: the image's top-left quadrant lands in the crop's top-left
#[test]
fn test_crop_is_upright() -> Result<()> {
    let frame = frontal_frame(Point3::new(0.0, 0.0, 2.0), quadrant_image(640, 480));
    let mut store = CircleStore::new();
    let curve = store.create_new_circle();
    for point in circle_points(Point3::origin(), 0.2, 64) {
        store.add_point(curve, point)?;
    }
    store.mark_done(curve)?;

    let visuals = CurvePipeline::default().process(&store.snapshot(curve)?, &frame)?;
    let crop = &visuals.image;
    assert_eq!(*crop.get_pixel(100, 100), RED);
    assert_eq!(*crop.get_pixel(980, 100), GREEN);
    assert_eq!(*crop.get_pixel(100, 980), BLUE);
    assert_eq!(*crop.get_pixel(980, 980), WHITE);

    // Without the display flip the crop is turned half a turn
    let mut config = Config::default();
    config.pipeline.legacy_display_flip = false;
    let unflipped = CurvePipeline::new(&config).process(&store.snapshot(curve)?, &frame)?;
    assert_eq!(*unflipped.image.get_pixel(100, 100), WHITE);
    assert_eq!(*unflipped.image.get_pixel(980, 980), RED);
    Ok(())
}

/// A circle drawn at an angle still produces a rectangular crop and faces the viewer
#[test]
fn test_tilted_circle() -> Result<()> {
    let viewer = Point3::new(0.0, 0.0, 2.0);
    let tilt = nalgebra::Rotation3::from_axis_angle(&Vector3::y_axis(), 0.5);
    let points: Vec<_> = circle_points(Point3::origin(), 0.25, 64)
        .into_iter()
        .map(|p| tilt * p)
        .collect();

    let mut store = CircleStore::new();
    let curve = store.create_new_circle();
    for point in points {
        store.add_point(curve, point)?;
    }
    store.mark_done(curve)?;

    let frame = frontal_frame(viewer, quadrant_image(800, 600));
    let visuals = CurvePipeline::default().process(&store.snapshot(curve)?, &frame)?;

    let normal = visuals.image_panel.transform.z_axis();
    let expected = tilt * Vector3::z();
    assert!((normal - expected).norm() < 1e-6);
    assert!(normal.dot(&(viewer - visuals.image_panel.center())) > 0.0);
    // Panel keeps the circle's true size, not its foreshortened one
    assert!((visuals.image_panel.width - 0.5).abs() < 1e-2);
    assert!((visuals.image_panel.height - 0.5).abs() < 1e-2);

    let to_viewer = (viewer - visuals.companion_panel.center()).normalize();
    assert!((visuals.companion_panel.transform.z_axis() - to_viewer).norm() < 1e-9);
    Ok(())
}

/// Two curves through the background worker: the last one wins
#[test]
fn test_worker_session_keeps_latest() -> Result<()> {
    let mut session = CaptureSession::new(&Config::default())?;
    session.set_camera_frame(frontal_frame(Point3::new(0.0, 0.0, 2.0), quadrant_image(640, 480)));

    draw(&mut session, &circle_points(Point3::origin(), 0.2, 40), 0.0)?;
    draw(&mut session, &circle_points(Point3::new(0.1, 0.0, 0.0), 0.15, 40), 1.0)?;
    let latest = session.latest_finished().expect("two finished curves");

    let mut handled = 0;
    let mut shown = Vec::new();
    while handled < 2 {
        assert!(session.wait_for_result(Duration::from_secs(30))?);
        for update in session.poll(2.0) {
            match update {
                SessionUpdate::VisualsReady { curve } => {
                    handled += 1;
                    shown.push(curve);
                }
                SessionUpdate::StaleDiscarded { .. } | SessionUpdate::PipelineFailed { .. } => handled += 1,
                _ => {}
            }
        }
    }

    assert_eq!(shown, vec![latest]);
    assert_eq!(session.current_visuals().map(|v| v.curve), Some(latest));
    Ok(())
}

/// A recording replayed end to end
#[test]
fn test_replay_recording() -> Result<()> {
    let device = PoseRecord {
        position: [0.0, 1.6, 1.0],
        rotation_deg: [0.0, 0.0, 0.0],
    };
    let camera = CameraRecord {
        focal_px: 600.0,
        width: 960,
        height: 720,
        pose: None,
    };
    let recording = Recording::circle(device, camera, Point3::new(0.0, 1.6, 0.0), 0.15, 60);

    let outcome = replay(&recording, quadrant_image(960, 720), &Config::default())?;
    assert_eq!(outcome.finished.len(), 1);
    assert!(outcome.failures.is_empty());
    let visuals = outcome.visuals.expect("visuals for the circle");
    assert_eq!(visuals.image.dimensions(), (1080, 1080));
    Ok(())
}
