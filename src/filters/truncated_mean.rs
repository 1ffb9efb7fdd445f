use super::{sorted, SpeedFilter};
use crate::constants::SPEED_TRUNCATION;

/// Mean after dropping up to `truncation` of the smallest and largest samples
pub struct TruncatedMean {
    truncation: usize,
}

impl TruncatedMean {
    #[must_use]
    pub fn new(truncation: usize) -> Self {
        Self { truncation }
    }

    /// Number of samples removed from each end for a window of `len` samples.
    ///
    /// Never more than `(len - 1) / 2`, so at least one sample always survives.
    #[must_use]
    pub fn trimmed_per_side(&self, len: usize) -> usize {
        (len.saturating_sub(1) / 2).min(self.truncation)
    }
}

impl Default for TruncatedMean {
    fn default() -> Self {
        Self::new(SPEED_TRUNCATION)
    }
}

impl SpeedFilter for TruncatedMean {
    fn smooth(&self, speeds: &[f64]) -> f64 {
        if speeds.is_empty() {
            return 0.0;
        }

        let sorted = sorted(speeds);
        let trim = self.trimmed_per_side(sorted.len());
        let kept = &sorted[trim..sorted.len() - trim];

        #[allow(clippy::cast_precision_loss)]
        let mean = kept.iter().sum::<f64>() / kept.len() as f64;
        mean
    }

    fn name(&self) -> &str {
        "TruncatedMean"
    }
}
