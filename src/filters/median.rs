use super::{sorted, SpeedFilter};

/// Median filter
pub struct MedianFilter;

impl SpeedFilter for MedianFilter {
    fn smooth(&self, speeds: &[f64]) -> f64 {
        let sorted = sorted(speeds);

        let len = sorted.len();
        if len == 0 {
            0.0
        } else if len % 2 == 0 {
            (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
        } else {
            sorted[len / 2]
        }
    }

    fn name(&self) -> &str {
        "MedianFilter"
    }
}
