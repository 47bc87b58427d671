use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::SeriesError;
use crate::utils::stats;

const MS_PER_MINUTE: f64 = 60_000.0;

/// An ordered mapping from time (minutes) to intensity (mAU).
///
/// Times are strictly increasing but not necessarily uniform; every
/// constructor validates this, including deserialization. A series is never
/// mutated in place, stages build derived series instead.
///
/// ```
/// use hplc_peaks::Series;
///
/// // 4 samples taken every 30 seconds
/// let series = Series::from_samples(&[1.0, 2.0, 3.0, 2.0], 30_000.0).unwrap();
/// assert_eq!(series.times(), &[0.0, 0.5, 1.0, 1.5]);
/// assert_eq!(series.argmax(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesRepr")]
pub struct Series {
    times: Vec<f64>,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct SeriesRepr {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl TryFrom<SeriesRepr> for Series {
    type Error = SeriesError;

    fn try_from(repr: SeriesRepr) -> Result<Self, Self::Error> {
        Series::try_new(repr.times, repr.values)
    }
}

impl Series {
    pub fn try_new(times: Vec<f64>, values: Vec<f64>) -> Result<Self, SeriesError> {
        if times.len() != values.len() {
            return Err(SeriesError::ExpectedSameLength {
                times: times.len(),
                values: values.len(),
            });
        }
        if times.is_empty() {
            return Err(SeriesError::ExpectedNonEmptyData);
        }
        if let Some(index) = times
            .iter()
            .zip(values.iter())
            .position(|(t, v)| !t.is_finite() || !v.is_finite())
        {
            return Err(SeriesError::NonFiniteValue { index });
        }
        if let Some(index) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SeriesError::NonIncreasingTime { index: index + 1 });
        }
        Ok(Self { times, values })
    }

    /// Builds a series from evenly spaced detector samples.
    ///
    /// `period_ms` is the time between samples in milliseconds; sample `i`
    /// lands at `i * period_ms / 1000 / 60` minutes.
    pub fn from_samples(samples: &[f64], period_ms: f64) -> Result<Self, SeriesError> {
        if !period_ms.is_finite() || period_ms <= 0.0 {
            return Err(SeriesError::InvalidPeriod(period_ms));
        }
        let times = (0..samples.len())
            .map(|i| i as f64 * period_ms / MS_PER_MINUTE)
            .collect();
        Self::try_new(times, samples.to_vec())
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always false for a constructed series, kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    pub fn first_time(&self) -> f64 {
        self.times[0]
    }

    pub fn last_time(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    pub fn median(&self) -> f64 {
        // Construction guarantees at least one finite value.
        stats::median(&self.values).unwrap_or(0.0)
    }

    pub fn min_value(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Index of the first maximum.
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (i, v) in self.values.iter().enumerate() {
            if *v > self.values[best] {
                best = i;
            }
        }
        best
    }

    /// Effective sampling rate, assuming samples span `[first_time, last_time]`.
    ///
    /// Returns 0 for a single-sample series.
    pub fn samples_per_second(&self) -> f64 {
        let span_minutes = self.last_time() - self.first_time();
        if self.len() < 2 || span_minutes <= 0.0 {
            return 0.0;
        }
        (self.len() - 1) as f64 / span_minutes / 60.0
    }

    /// Time between the first two samples, the tolerance used when snapping
    /// external points onto this axis.
    pub fn first_period(&self) -> Option<f64> {
        match self.times.as_slice() {
            [t0, t1, ..] => Some(t1 - t0),
            _ => None,
        }
    }

    /// Inclusive index range of the samples within `[start, end]`.
    pub fn index_range(&self, start: f64, end: f64) -> Option<std::ops::RangeInclusive<usize>> {
        let lo = self.times.partition_point(|t| *t < start);
        let hi = self.times.partition_point(|t| *t <= end);
        if lo >= hi {
            return None;
        }
        Some(lo..=(hi - 1))
    }

    /// Samples with `start <= time <= end`, or `None` when there are none.
    pub fn slice(&self, start: f64, end: f64) -> Option<Series> {
        let range = self.index_range(start, end)?;
        Some(Series {
            times: self.times[range.clone()].to_vec(),
            values: self.values[range].to_vec(),
        })
    }

    pub fn nearest_index(&self, time: f64) -> usize {
        let pos = self.times.partition_point(|t| *t < time);
        if pos == 0 {
            return 0;
        }
        if pos >= self.len() {
            return self.len() - 1;
        }
        if (self.times[pos] - time).abs() < (time - self.times[pos - 1]).abs() {
            pos
        } else {
            pos - 1
        }
    }

    /// Value of the sample closest to `time`.
    pub fn value_at(&self, time: f64) -> f64 {
        self.values[self.nearest_index(time)]
    }

    /// A new series on the same time axis.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Series, SeriesError> {
        if values.len() != self.len() {
            return Err(SeriesError::ExpectedSameLength {
                times: self.len(),
                values: values.len(),
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(SeriesError::NonFiniteValue { index });
        }
        Ok(Series {
            times: self.times.clone(),
            values,
        })
    }

    pub(crate) fn map_values(&self, f: impl Fn(f64) -> f64) -> Series {
        Series {
            times: self.times.clone(),
            values: self.values.iter().map(|v| f(*v)).collect(),
        }
    }

    /// Every `step`-th sample, starting with the first.
    pub(crate) fn decimate(&self, step: usize) -> Series {
        let step = step.max(1);
        Series {
            times: self.times.iter().step_by(step).copied().collect(),
            values: self.values.iter().step_by(step).copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_series() -> Series {
        Series::try_new(vec![0.0, 1.0, 2.0, 3.0, 4.0], vec![5.0, 1.0, 7.0, 7.0, 2.0]).unwrap()
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            Series::try_new(vec![], vec![]),
            Err(SeriesError::ExpectedNonEmptyData)
        );
        assert_eq!(
            Series::try_new(vec![0.0, 1.0], vec![1.0]),
            Err(SeriesError::ExpectedSameLength {
                times: 2,
                values: 1
            })
        );
        assert_eq!(
            Series::try_new(vec![0.0, 1.0, 1.0], vec![1.0, 2.0, 3.0]),
            Err(SeriesError::NonIncreasingTime { index: 2 })
        );
        assert_eq!(
            Series::try_new(vec![0.0, 1.0], vec![1.0, f64::NAN]),
            Err(SeriesError::NonFiniteValue { index: 1 })
        );
        assert_eq!(
            Series::from_samples(&[1.0, 2.0], 0.0),
            Err(SeriesError::InvalidPeriod(0.0))
        );
    }

    #[test]
    fn test_from_samples_uses_minutes() {
        let series = Series::from_samples(&[0.0; 601], 1000.0).unwrap();
        assert!((series.last_time() - 10.0).abs() < 1e-12);
        assert!((series.samples_per_second() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_slice_is_inclusive() {
        let series = sample_series();
        let sliced = series.slice(1.0, 3.0).unwrap();
        assert_eq!(sliced.times(), &[1.0, 2.0, 3.0]);
        assert_eq!(sliced.values(), &[1.0, 7.0, 7.0]);
        assert!(series.slice(3.2, 3.8).is_none());
        assert!(series.slice(4.0, 1.0).is_none());
    }

    #[test]
    fn test_argmax_takes_first_maximum() {
        assert_eq!(sample_series().argmax(), 2);
    }

    #[test]
    fn test_nearest_index() {
        let series = sample_series();
        assert_eq!(series.nearest_index(-3.0), 0);
        assert_eq!(series.nearest_index(1.4), 1);
        assert_eq!(series.nearest_index(1.6), 2);
        assert_eq!(series.nearest_index(40.0), 4);
        assert_eq!(series.value_at(2.9), 7.0);
    }

    #[test]
    fn test_decimate_keeps_first_sample() {
        let series = sample_series().decimate(2);
        assert_eq!(series.times(), &[0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Series = serde_json::from_str(r#"{"times": [0.0, 0.5], "values": [1.0, 2.0]}"#)
            .unwrap();
        assert_eq!(ok.len(), 2);
        let bad = serde_json::from_str::<Series>(r#"{"times": [0.5, 0.0], "values": [1.0, 2.0]}"#);
        assert!(bad.is_err());
    }
}
