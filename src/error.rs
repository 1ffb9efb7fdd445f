//! Error types for the circle search core.

use crate::circle_store::CurveId;
use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Not enough points for the requested operation
    #[error("Insufficient points: need at least {required}, got {actual}")]
    InsufficientPoints {
        /// Minimum number of points the operation needs
        required: usize,
        /// Number of points that were supplied
        actual: usize,
    },

    /// The representative points do not span a plane
    #[error("The given points are colinear and cannot form a plane")]
    ColinearPoints,

    /// The viewer sits on the plane center, so the normal cannot be oriented
    #[error("Viewer position coincides with the plane center")]
    DegenerateViewpoint,

    /// The viewer up axis is parallel to the plane normal
    #[error("Plane normal is parallel to the up axis, no perpendicular X axis exists")]
    ParallelAxes,

    /// Bounding box requested for a curve without points
    #[error("Cannot size a bounding box for an empty point set")]
    EmptyPointSet,

    /// The camera could not map a panel corner to a pixel
    #[error("Camera projection failed for {corner} corner")]
    ProjectionFailure {
        /// Name of the corner that failed to project
        corner: &'static str,
    },

    /// The projected quadrilateral admits no homography
    #[error("Degenerate quadrilateral: {0}")]
    DegenerateQuadrilateral(String),

    /// Warping the camera image failed
    #[error("Crop failed: {0}")]
    CropFailure(String),

    /// No curve with this id exists in the store
    #[error("Unknown curve {0}")]
    UnknownCurve(CurveId),

    /// The curve was already finalized
    #[error("Curve {0} is already finished")]
    CurveAlreadyFinished(CurveId),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Speed filter construction error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The background pipeline worker has shut down
    #[error("Pipeline worker unavailable")]
    WorkerUnavailable,

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
