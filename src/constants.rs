//! Constants used throughout the crate

/// Guard for near-zero vector lengths and curve lengths
pub const GEOMETRY_EPSILON: f64 = 1e-6;

/// Smallest homography determinant accepted as non-singular
pub const HOMOGRAPHY_DET_EPSILON: f64 = 1e-12;

/// Sliding window used for fingertip speed estimation, in seconds
pub const SPEED_WINDOW_SECS: f64 = 0.1;

/// Number of extremes trimmed from each end when smoothing speed
pub const SPEED_TRUNCATION: usize = 2;

/// Default speed filter specification
pub const DEFAULT_SPEED_FILTER: &str = "truncated_mean:2";

/// Duration of the stroke and panel fade-out, in seconds
pub const FADE_DURATION_SECS: f64 = 0.3;

/// Number of points a finished curve is resampled to before plane fitting
pub const RESAMPLE_COUNT: usize = 1024;

/// Number of representative points used to fit the plane
pub const REPRESENTATIVE_GROUPS: usize = 3;

/// Length of the shorter side of every crop, in pixels
pub const CROP_SHORT_SIDE_PX: u32 = 1080;

/// Upper bound on either crop side, in pixels.
///
/// Resource guard: with the short side fixed at 1080 px this caps a crop at
/// about 35 MB of RGBA and rejects gestures thinner than roughly 7.6:1. Raise
/// `crop.max_output_side_px` to accept thinner gestures.
pub const MAX_CROP_SIDE_PX: u32 = 8192;

/// Companion panel width in meters
pub const COMPANION_PANEL_WIDTH: f64 = 0.3;

/// Companion panel height in meters
pub const COMPANION_PANEL_HEIGHT: f64 = 0.5;

/// Gap between the image panel and the companion panel, in meters
pub const COMPANION_PANEL_SPACING: f64 = 0.05;

/// World up axis used when orienting the companion panel
pub const WORLD_UP: [f64; 3] = [0.0, 1.0, 0.0];
