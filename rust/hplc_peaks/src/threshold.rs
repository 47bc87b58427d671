use tracing::debug;

use crate::config::DetectionConfig;
use crate::utils::stats::{
    linspace,
    quantile_sorted,
};

/// Minimum apex height for peak detection.
///
/// Looks at `quantile_count` evenly spaced quantiles of the corrected trace
/// between `quantile_low` and 1. Most of a chromatogram is flat, so the low
/// quantiles sit close together; the first jump larger than
/// `quantile_max_diff` marks where the peaks begin, and the quantile just
/// before it is returned. When there is no such jump the lowest quantile is
/// used.
///
/// # Panics
/// Panics if `corrected` is empty.
pub fn select_threshold(corrected: &[f64], config: &DetectionConfig) -> f64 {
    let mut sorted = corrected.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    let quantiles: Vec<f64> = linspace(config.quantile_low, 1.0, config.quantile_count)
        .map(|q| quantile_sorted(&sorted, q))
        .collect();

    match quantiles
        .windows(2)
        .find(|w| w[1] - w[0] > config.quantile_max_diff)
    {
        Some(w) => w[0],
        None => {
            debug!(
                "No quantile jump above {}, using the lowest quantile",
                config.quantile_max_diff
            );
            quantiles[0]
        }
    }
}
