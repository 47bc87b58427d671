use serde::{
    Deserialize,
    Serialize,
};
use tracing::debug;

use crate::errors::{
    PipelineError,
    Result,
};
use crate::models::Series;
use crate::utils::interpolation::{
    fill_gaps,
    snap_nearest,
};

/// One operator-drawn baseline point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub time: f64,
    pub value: f64,
}

impl ControlPoint {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Builds a baseline on the axis of `data` from operator control points.
///
/// Each point is snapped to the nearest sample within one sample period;
/// samples between snapped points are linearly interpolated and samples
/// outside them hold the closest snapped value. The result is used as-is,
/// it is not clamped to the data.
pub fn manual_baseline(data: &Series, points: &[ControlPoint]) -> Result<Series> {
    let mut sorted: Vec<(f64, f64)> = points
        .iter()
        .filter(|p| p.time.is_finite() && p.value.is_finite())
        .map(|p| (p.time, p.value))
        .collect();
    if sorted.len() < points.len() {
        debug!(
            "Ignoring {} non-finite control points",
            points.len() - sorted.len()
        );
    }
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let tolerance = data.first_period().unwrap_or(0.0);
    let snapped = snap_nearest(data.times(), &sorted, tolerance);
    let values = fill_gaps(data.times(), &snapped).ok_or(PipelineError::NoUsableControlPoints)?;
    Ok(data.with_values(values)?)
}
