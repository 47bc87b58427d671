//! Baseline estimation.
//!
//! The automatic baseline is an asymmetric least squares fit pulled towards
//! the lower envelope of the trace. It runs on a decimated copy of the trace
//! (the smoothing strength is tuned for a fixed sampling rate) and is then
//! interpolated back onto the full time axis. Operators can replace it
//! wholesale with a hand-drawn baseline, see [`manual`].

mod als;
mod banded;
pub mod manual;

pub use als::{
    asymmetric_least_squares,
    MIN_SOLVE_LEN,
};
pub use manual::{
    manual_baseline,
    ControlPoint,
};

use tracing::debug;

use crate::config::BaselineConfig;
use crate::errors::Result;
use crate::models::Series;
use crate::utils::interpolation::fill_gaps;

/// How many samples to skip so the solver sees roughly `target_sps` samples
/// per second.
pub fn decimation_step(samples_per_second: f64, target_sps: f64) -> usize {
    let step = (samples_per_second / target_sps).round();
    if step.is_finite() && step >= 1.0 {
        step as usize
    } else {
        1
    }
}

/// The smoothed baseline estimate on the full time axis of `data`.
///
/// This is the raw solver output; it may exceed `data` locally. Use
/// [`correct_baseline`] for the clamped baseline.
#[cfg_attr(
    feature = "instrumentation",
    tracing::instrument(skip_all, level = "trace")
)]
pub fn estimate_baseline(data: &Series, config: &BaselineConfig) -> Result<Series> {
    let mut step = if config.downsample {
        decimation_step(data.samples_per_second(), config.target_samples_per_second)
    } else {
        1
    };
    let mut reduced = data.decimate(step);
    if reduced.len() < MIN_SOLVE_LEN {
        step = 1;
        reduced = data.clone();
    }
    debug!(
        "Estimating baseline on {} of {} samples (step {})",
        reduced.len(),
        data.len(),
        step
    );

    let solved = asymmetric_least_squares(
        reduced.values(),
        config.lambda,
        config.asymmetry,
        config.iterations,
    );

    let mut known = vec![None; data.len()];
    for (k, z) in solved.into_iter().enumerate() {
        known[k * step] = Some(z);
    }
    let values = fill_gaps(data.times(), &known).unwrap_or_else(|| data.values().to_vec());
    Ok(data.with_values(values)?)
}

/// Splits `data` into a baseline-corrected trace and its baseline.
///
/// The baseline is the pointwise minimum of `data` and the smoothed estimate,
/// so it never exceeds the data and the corrected trace is never negative.
/// Corrected values within solver round-off of zero are set to exactly zero.
pub fn correct_baseline(data: &Series, config: &BaselineConfig) -> Result<(Series, Series)> {
    let estimate = estimate_baseline(data, config)?;
    let baseline: Vec<f64> = data
        .values()
        .iter()
        .zip(estimate.values())
        .map(|(d, b)| d.min(*b))
        .collect();

    let scale = data.values().iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    let floor = f64::EPSILON.sqrt() * scale;
    let corrected: Vec<f64> = data
        .values()
        .iter()
        .zip(baseline.iter())
        .map(|(d, b)| {
            let diff = d - b;
            if diff > floor {
                diff
            } else {
                0.0
            }
        })
        .collect();

    Ok((data.with_values(corrected)?, data.with_values(baseline)?))
}
