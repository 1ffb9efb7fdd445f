//! Arc-length resampling of 3D polylines.

use crate::{constants::GEOMETRY_EPSILON, Error, Result};
use nalgebra::Point3;

/// Redistribute `m` points along the polyline so neighbours are equally spaced by path length.
///
/// The first output point is the first input point. When the polyline has a
/// length of at least `GEOMETRY_EPSILON` the last output point is the last input point. Zero-length
/// segments (repeated consecutive points) are skipped by the search.
///
/// # Errors
///
/// - [`Error::InsufficientPoints`] if `points` is empty
/// - [`Error::InvalidInput`] if `m` is zero
pub fn resample(points: &[Point3<f64>], m: usize) -> Result<Vec<Point3<f64>>> {
    let first = *points.first().ok_or(Error::InsufficientPoints {
        required: 1,
        actual: 0,
    })?;
    if m == 0 {
        return Err(Error::InvalidInput("Resample count must be greater than 0".to_string()));
    }

    if points.len() == 1 {
        return Ok(vec![first; m]);
    }

    let cumulative = cumulative_lengths(points);
    let total_length = cumulative[cumulative.len() - 1];
    if total_length < GEOMETRY_EPSILON {
        return Ok(vec![first; m]);
    }
    if m == 1 {
        return Ok(vec![first]);
    }

    #[allow(clippy::cast_precision_loss)]
    let spacing = total_length / (m - 1) as f64;
    let last_index = points.len() - 1;

    let resampled = (0..m)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let target = i as f64 * spacing;
            // First index whose cumulative length reaches the target. Rounding can
            // push the final target past the total, which clamps to the last point.
            let index = cumulative.partition_point(|&length| length < target);
            if index == 0 {
                return first;
            }
            if index > last_index {
                return points[last_index];
            }

            let previous = cumulative[index - 1];
            let t = (target - previous) / (cumulative[index] - previous);
            points[index - 1] + (points[index] - points[index - 1]) * t
        })
        .collect();

    Ok(resampled)
}

/// Total path length of a polyline
#[must_use]
pub fn path_length(points: &[Point3<f64>]) -> f64 {
    points.windows(2).map(|pair| (pair[1] - pair[0]).norm()).sum()
}

/// Cumulative arc length at every input point, starting at 0
fn cumulative_lengths(points: &[Point3<f64>]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(points.len());
    let mut running = 0.0;
    cumulative.push(running);
    for pair in points.windows(2) {
        running += (pair[1] - pair[0]).norm();
        cumulative.push(running);
    }
    cumulative
}
