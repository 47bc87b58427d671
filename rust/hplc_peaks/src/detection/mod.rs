//! Peak detection on a baseline-corrected trace.
//!
//! Candidates are local maxima at or above the threshold, thinned so no two
//! apexes are closer than the minimum peak duration. Each survivor gets
//! bounds where the trace drops to `rel_height` of its prominence, and
//! candidates narrower than the minimum duration are discarded.

mod local_maxima;
mod widths;

pub use local_maxima::{
    local_maxima,
    select_by_distance,
};
pub use widths::{
    peak_width,
    prominence,
    PeakWidth,
    Prominence,
};

use tracing::debug;

use crate::config::DetectionConfig;
use crate::models::{
    Peak,
    Series,
};

/// Minimum peak duration expressed in samples.
fn min_samples(samples_per_second: f64, seconds: f64) -> f64 {
    samples_per_second * seconds
}

/// Maxima of `corrected` at or above `threshold`, at least the minimum peak
/// duration apart, in sample order.
pub fn find_apexes(corrected: &[f64], threshold: f64, distance: usize) -> Vec<usize> {
    let above: Vec<usize> = local_maxima(corrected)
        .into_iter()
        .filter(|&i| corrected[i] >= threshold)
        .collect();
    select_by_distance(&above, corrected, distance)
}

/// Detects peaks on a baseline-corrected series.
///
/// Returned peaks are top-level candidates without children, ordered by apex.
#[cfg_attr(
    feature = "instrumentation",
    tracing::instrument(skip_all, level = "trace")
)]
pub fn detect_peaks(corrected: &Series, threshold: f64, config: &DetectionConfig) -> Vec<Peak> {
    let values = corrected.values();
    let times = corrected.times();
    let min_width = min_samples(corrected.samples_per_second(), config.min_seconds_per_peak);
    let distance = min_width.ceil().max(1.0) as usize;

    let apexes = find_apexes(values, threshold, distance);
    debug!(
        "{} maxima above threshold {:.4} (min distance {} samples)",
        apexes.len(),
        threshold,
        distance
    );

    let mut peaks = Vec::with_capacity(apexes.len());
    for apex in apexes {
        let width = peak_width(values, apex, config.rel_height);
        if width.prominence <= 0.0 {
            continue;
        }
        if width.width < min_width {
            debug!(
                "Dropping peak at {:.4} min, {:.2} samples wide",
                times[apex], width.width
            );
            continue;
        }
        let start = (width.left.floor().max(0.0) as usize).min(apex);
        let end = (width.right.ceil() as usize).min(values.len() - 1);
        if start >= apex || end <= apex {
            debug!("Dropping peak at {:.4} min, apex on a bound", times[apex]);
            continue;
        }
        peaks.push(Peak::new(times[apex], times[start], times[end]));
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian_trace(centers: &[(f64, f64, f64)]) -> Series {
        let samples: Vec<f64> = (0..600)
            .map(|i| {
                let t = i as f64 / 60.0;
                centers
                    .iter()
                    .map(|(c, s, h)| h * (-0.5 * ((t - c) / s).powi(2)).exp())
                    .sum()
            })
            .collect();
        Series::from_samples(&samples, 1000.0).unwrap()
    }

    #[test]
    fn test_single_bump() {
        let trace = gaussian_trace(&[(5.0, 0.1, 50.0)]);
        let peaks = detect_peaks(&trace, 0.5, &DetectionConfig::default());
        assert_eq!(peaks.len(), 1);
        let peak = &peaks[0];
        assert!((peak.apex - 5.0).abs() < 1e-9);
        assert!(peak.start < peak.apex && peak.apex < peak.end);
        assert!(peak.width() * 60.0 >= 5.0);
    }

    #[test]
    fn test_narrow_spike_is_dropped() {
        let mut samples = vec![0.0; 100];
        samples[50] = 10.0;
        let trace = Series::from_samples(&samples, 1000.0).unwrap();
        assert!(detect_peaks(&trace, 1.0, &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn test_below_threshold_is_ignored() {
        let trace = gaussian_trace(&[(3.0, 0.1, 40.0), (7.0, 0.1, 3.0)]);
        let peaks = detect_peaks(&trace, 10.0, &DetectionConfig::default());
        assert_eq!(peaks.len(), 1);
        assert!((peaks[0].apex - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_trace_has_no_peaks() {
        let trace = Series::from_samples(&[0.0; 100], 1000.0).unwrap();
        assert!(detect_peaks(&trace, 0.0, &DetectionConfig::default()).is_empty());
    }
}
