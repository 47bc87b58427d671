use tracing::debug;

use crate::models::Series;

/// Sign-normalizes a raw detector trace.
///
/// Traces recorded with inverted polarity have a negative median; those are
/// shifted up by `|median|` first. Every sample is then replaced by its
/// absolute value, so the output is never negative.
pub fn preprocess(raw: &Series) -> Series {
    let median = raw.median();
    let shift = if median < 0.0 {
        debug!("Negative median {} detected, shifting trace up", median);
        median.abs()
    } else {
        0.0
    };
    raw.map_values(|v| (v + shift).abs())
}
