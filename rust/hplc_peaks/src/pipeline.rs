use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    info,
    instrument,
};

use crate::area::{
    assign_area,
    assign_areas,
};
use crate::baseline::{
    correct_baseline,
    manual_baseline,
    ControlPoint,
    MIN_SOLVE_LEN,
};
use crate::config::PipelineConfig;
use crate::detection::detect_peaks;
use crate::errors::{
    PipelineError,
    Result,
    SeriesError,
};
use crate::fitting::fit_mixed_peaks;
use crate::grouping::fold_peaks;
use crate::models::{
    Peak,
    PeakBound,
    Series,
};
use crate::preprocessing::preprocess;
use crate::processing_state::{
    ProcessingGuard,
    ProcessingState,
};
use crate::threshold::select_threshold;

/// Result of a full pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingOutput {
    /// Top-level peaks in apex order; mixed peaks carry their children.
    pub peaks: Vec<Peak>,
    /// Baseline on the input time axis, never above the preprocessed trace.
    pub baseline: Series,
}

/// The peak extraction pipeline.
///
/// Holds nothing but a validated configuration; every operation is a pure
/// function of its inputs, so one pipeline can be shared across threads.
///
/// ```
/// use hplc_peaks::{PeakPipeline, PipelineConfig, Series};
///
/// let samples: Vec<f64> = (0..600)
///     .map(|i| {
///         let t = i as f64 / 60.0;
///         2.0 + 50.0 * (-0.5 * ((t - 5.0) / 0.1).powi(2)).exp()
///     })
///     .collect();
/// let series = Series::from_samples(&samples, 1000.0).unwrap();
///
/// let pipeline = PeakPipeline::new(PipelineConfig::default()).unwrap();
/// let output = pipeline.process(&series).unwrap();
/// assert_eq!(output.peaks.len(), 1);
/// assert!((output.peaks[0].apex - 5.0).abs() < 0.02);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PeakPipeline {
    config: PipelineConfig,
}

fn require_samples(series: &Series) -> Result<()> {
    if series.len() < MIN_SOLVE_LEN {
        return Err(SeriesError::InsufficientData {
            real: series.len(),
            expected: MIN_SOLVE_LEN,
        }
        .into());
    }
    Ok(())
}

impl PeakPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage: preprocessing, baseline correction, detection,
    /// grouping, fitting of mixed peaks and integration.
    #[instrument(skip_all, fields(samples = raw.len()))]
    pub fn process(&self, raw: &Series) -> Result<ProcessingOutput> {
        require_samples(raw)?;
        let data = preprocess(raw);
        let (corrected, baseline) = correct_baseline(&data, &self.config.baseline)?;

        let threshold = select_threshold(corrected.values(), &self.config.detection);
        let candidates = detect_peaks(&corrected, threshold, &self.config.detection);
        debug!(
            "Threshold {:.4} mAU, {} candidate peaks",
            threshold,
            candidates.len()
        );

        let mut peaks = fold_peaks(candidates);
        fit_mixed_peaks(&mut peaks, &corrected, &self.config.fit);
        assign_areas(&mut peaks, &corrected);

        info!(
            "Found {} peaks ({} mixed) in {} samples",
            peaks.len(),
            peaks.iter().filter(|p| p.is_mixed()).count(),
            raw.len()
        );
        Ok(ProcessingOutput { peaks, baseline })
    }

    /// The baseline [`Self::process`] would return, without peak extraction.
    #[instrument(skip_all, fields(samples = raw.len()))]
    pub fn process_baseline_only(&self, raw: &Series) -> Result<Series> {
        require_samples(raw)?;
        let data = preprocess(raw);
        let (_, baseline) = correct_baseline(&data, &self.config.baseline)?;
        Ok(baseline)
    }

    /// Rebuilds a single peak from operator-drawn bounds.
    ///
    /// The apex is the maximum of `slice` within `[start, end]`. When both
    /// bounds carry a value the peak is integrated above the drawn chord,
    /// otherwise above the chord between the first and last samples.
    pub fn recompute_peak(&self, slice: &Series, start: PeakBound, end: PeakBound) -> Result<Peak> {
        if !start.time.is_finite() || !end.time.is_finite() || start.time >= end.time {
            return Err(PipelineError::InvalidBounds {
                start: start.time,
                end: end.time,
            });
        }
        let bounded = slice
            .slice(start.time, end.time)
            .ok_or(PipelineError::EmptySlice {
                start: start.time,
                end: end.time,
            })?;
        require_samples(&bounded)?;

        let apex = bounded.times()[bounded.argmax()];
        if apex <= start.time || apex >= end.time {
            return Err(PipelineError::ApexOnBound {
                apex,
                start: start.time,
                end: end.time,
            });
        }

        let mut peak = Peak::from_bounds(apex, start, end);
        assign_area(&mut peak, &bounded);
        debug!(
            "Recomputed peak at {:.4} min: area {:?} (manual: {})",
            apex,
            peak.area,
            peak.is_manual()
        );
        Ok(peak)
    }

    /// Replaces the automatic baseline of `data` with one drawn through
    /// `points`.
    pub fn apply_manual_baseline(&self, data: &Series, points: &[ControlPoint]) -> Result<Series> {
        manual_baseline(data, points)
    }

    /// [`Self::process`] with `state` flagged as processing for the whole
    /// run. The flag is released on every exit path.
    pub fn process_tracked<S: ProcessingState + ?Sized>(
        &self,
        state: &S,
        raw: &Series,
    ) -> Result<ProcessingOutput> {
        let _guard = ProcessingGuard::enter(state)?;
        self.process(raw)
    }

    pub fn process_baseline_only_tracked<S: ProcessingState + ?Sized>(
        &self,
        state: &S,
        raw: &Series,
    ) -> Result<Series> {
        let _guard = ProcessingGuard::enter(state)?;
        self.process_baseline_only(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing_state::ProcessingRegistry;

    fn pipeline() -> PeakPipeline {
        PeakPipeline::new(PipelineConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = PipelineConfig::default();
        config.baseline.iterations = 0;
        assert!(matches!(
            PeakPipeline::new(config),
            Err(PipelineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_too_short_series_is_rejected() {
        let series = Series::from_samples(&[1.0, 2.0], 1000.0).unwrap();
        assert_eq!(
            pipeline().process(&series),
            Err(PipelineError::Series(SeriesError::InsufficientData {
                real: 2,
                expected: 3
            }))
        );
    }

    #[test]
    fn test_recompute_rejects_bad_bounds() {
        let series = Series::from_samples(&[0.0, 1.0, 5.0, 1.0, 0.0], 60_000.0).unwrap();
        let p = pipeline();
        assert!(matches!(
            p.recompute_peak(&series, PeakBound::at(3.0), PeakBound::at(1.0)),
            Err(PipelineError::InvalidBounds { .. })
        ));
        assert!(matches!(
            p.recompute_peak(&series, PeakBound::at(10.0), PeakBound::at(11.0)),
            Err(PipelineError::EmptySlice { .. })
        ));
        assert!(matches!(
            p.recompute_peak(&series, PeakBound::at(0.0), PeakBound::at(1.0)),
            Err(PipelineError::Series(SeriesError::InsufficientData { .. }))
        ));
        // Monotone stretch: the maximum sits on the end bound.
        assert!(matches!(
            p.recompute_peak(&series, PeakBound::at(0.0), PeakBound::at(2.0)),
            Err(PipelineError::ApexOnBound { .. })
        ));
    }

    #[test]
    fn test_recompute_simple_peak() {
        let series = Series::from_samples(&[0.0, 1.0, 5.0, 1.0, 0.0], 60_000.0).unwrap();
        let peak = pipeline()
            .recompute_peak(&series, PeakBound::at(0.0), PeakBound::at(4.0))
            .unwrap();
        assert_eq!(peak.apex, 2.0);
        assert!(!peak.is_manual());
        assert!((peak.area.unwrap() - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_tracked_run_releases_flag_on_error() {
        let registry = ProcessingRegistry::new();
        let handle = registry.handle("short");
        let series = Series::from_samples(&[1.0, 2.0], 1000.0).unwrap();
        assert!(pipeline().process_tracked(&handle, &series).is_err());
        assert!(!registry.is_processing("short"));
    }

    #[test]
    fn test_tracked_run_refuses_busy_measurement() {
        let registry = ProcessingRegistry::new();
        let handle = registry.handle("busy");
        let _held = ProcessingGuard::enter(&handle).unwrap();
        let series = Series::from_samples(&[1.0, 2.0, 1.0, 2.0], 1000.0).unwrap();
        assert!(matches!(
            pipeline().process_baseline_only_tracked(&handle, &series),
            Err(PipelineError::AlreadyProcessing { .. })
        ));
        assert!(registry.is_processing("busy"));
    }
}
