use super::SpeedFilter;

/// Arithmetic mean of the window
pub struct MeanFilter;

impl SpeedFilter for MeanFilter {
    fn smooth(&self, speeds: &[f64]) -> f64 {
        if speeds.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = speeds.iter().sum::<f64>() / speeds.len() as f64;
        mean
    }

    fn name(&self) -> &str {
        "MeanFilter"
    }
}
