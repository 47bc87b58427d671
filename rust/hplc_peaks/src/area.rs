use tracing::debug;

use crate::models::{
    Peak,
    Series,
};
use crate::utils::stats::trapezoid;

/// Area above the straight line joining the first and last samples.
pub fn simple_area(slice: &Series) -> f64 {
    let times = slice.times();
    let values = slice.values();
    let (t0, t1) = (slice.first_time(), slice.last_time());
    let (v0, v1) = (values[0], values[values.len() - 1]);
    let span = t1 - t0;
    let above_chord: Vec<f64> = slice
        .iter()
        .map(|(t, v)| {
            let chord = if span > 0.0 {
                v0 + (v1 - v0) * (t - t0) / span
            } else {
                v0
            };
            v - chord
        })
        .collect();
    trapezoid(times, &above_chord)
}

/// Area of `slice` above the chord an operator drew from `(start,
/// start_value)` to `(end, end_value)`.
pub fn manual_area(slice: &Series, start: f64, end: f64, start_value: f64, end_value: f64) -> f64 {
    let under_chord = (end - start) * (start_value + end_value) / 2.0;
    trapezoid(slice.times(), slice.values()) - under_chord
}

fn simple_area_of(peak: &Peak, data: &Series) -> f64 {
    peak.data_slice(data).map_or(0.0, |s| simple_area(&s))
}

/// Sets the area of `peak` (and of its children, for mixed peaks).
///
/// * Mixed peaks take the fitted amplitude of each member as its area. When
///   the group has no fit, every member falls back to the simple rule over
///   its own slice.
/// * Manual peaks are integrated above the operator's chord.
/// * Everything else is integrated above the chord between its first and
///   last samples.
pub fn assign_area(peak: &mut Peak, data: &Series) {
    if peak.is_mixed() {
        if peak.fit.is_some() {
            peak.area = peak.fit_params().map(|p| p.amplitude);
            for child in peak.children.iter_mut() {
                child.area = child.fit_params().map(|p| p.amplitude);
            }
        } else {
            debug!(
                "Group at {:.4} min has no fit, integrating members separately",
                peak.apex
            );
            peak.area = Some(simple_area_of(peak, data));
            for child in peak.children.iter_mut() {
                child.area = Some(simple_area_of(child, data));
            }
        }
        return;
    }

    let area = match (peak.start_value, peak.end_value) {
        (Some(sv), Some(ev)) => peak
            .data_slice(data)
            .map_or(0.0, |s| manual_area(&s, peak.start, peak.end, sv, ev)),
        _ => simple_area_of(peak, data),
    };
    peak.area = Some(area);
}

pub fn assign_areas(peaks: &mut [Peak], data: &Series) {
    for peak in peaks.iter_mut() {
        assign_area(peak, data);
    }
}
