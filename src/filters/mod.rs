//! Robust averaging of fingertip speed samples.
//!
//! Hand tracking produces occasional position jumps, which show up as speed
//! spikes. The stroke tracker collapses the speeds inside its sliding window
//! into one value with one of these filters.

/// Truncated mean, the default speed smoother
pub mod truncated_mean;

/// Plain arithmetic mean
pub mod mean;

/// Median of the window
pub mod median;

use crate::{Error, Result};

/// Trait for all speed filters
pub trait SpeedFilter: Send + Sync {
    /// Collapse a window of speed samples into one value. Empty input yields 0.
    fn smooth(&self, speeds: &[f64]) -> f64;

    /// Get filter name
    fn name(&self) -> &str;
}

/// Create a speed filter from a `name[:param]` specification.
///
/// Supported: `truncated_mean[:k]`, `mean`, `median`.
///
/// # Errors
///
/// Returns [`Error::FilterError`] for unknown names or malformed parameters
pub fn create_filter(spec: &str) -> Result<Box<dyn SpeedFilter>> {
    let spec = spec.trim().to_lowercase();
    let (name, param) = match spec.split_once(':') {
        Some((name, param)) => (name, Some(param)),
        None => (spec.as_str(), None),
    };

    match (name, param) {
        ("truncated_mean" | "truncatedmean", None) => Ok(Box::new(truncated_mean::TruncatedMean::default())),
        ("truncated_mean" | "truncatedmean", Some(param)) => {
            let truncation = param
                .parse::<usize>()
                .map_err(|_| Error::FilterError(format!("Invalid truncation count: {param}")))?;
            Ok(Box::new(truncated_mean::TruncatedMean::new(truncation)))
        }
        ("mean" | "average", None) => Ok(Box::new(mean::MeanFilter)),
        ("median", None) => Ok(Box::new(median::MedianFilter)),
        (_, Some(param)) if matches!(name, "mean" | "average" | "median") => Err(Error::FilterError(format!(
            "Filter {name} takes no parameter, got {param}"
        ))),
        _ => Err(Error::FilterError(format!("Unknown filter type: {spec}"))),
    }
}

/// Sort a copy of the samples ascending; NaNs compare equal and stay in place
fn sorted(speeds: &[f64]) -> Vec<f64> {
    let mut sorted = speeds.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}
