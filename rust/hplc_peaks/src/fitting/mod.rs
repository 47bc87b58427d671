//! Joint fitting of mixed peaks.
//!
//! A mixed peak and its children are modelled together over the parent's
//! slice of the corrected trace as a shared flat baseline plus one
//! skew-normal component per member (parent first, then children in apex
//! order). Parameters are laid out as
//! `[baseline, amplitude_0, skew_0, location_0, scale_0, amplitude_1, ...]`.

pub mod levenberg_marquardt;
pub mod skew_normal;

use nalgebra::{
    DMatrix,
    DVector,
};
use tracing::{
    debug,
    warn,
};

use self::levenberg_marquardt::{
    levenberg_marquardt,
    FitOutcome,
    LeastSquaresProblem,
};
use crate::config::FitConfig;
use crate::errors::FitError;
use crate::models::{
    ComponentFit,
    FitStatus,
    Peak,
    Series,
    SkewNormalParams,
};

const PARAMS_PER_COMPONENT: usize = 4;

/// Least squares problem of a shared baseline plus skew-normal components.
pub struct MixedPeakModel<'a> {
    times: &'a [f64],
    values: &'a [f64],
    components: usize,
    min_scale: f64,
}

impl<'a> MixedPeakModel<'a> {
    pub fn new(slice: &'a Series, components: usize, min_scale: f64) -> Self {
        Self {
            times: slice.times(),
            values: slice.values(),
            components,
            min_scale,
        }
    }

    fn component(params: &DVector<f64>, k: usize) -> SkewNormalParams {
        let offset = 1 + k * PARAMS_PER_COMPONENT;
        SkewNormalParams::from_slice(&params.as_slice()[offset..offset + PARAMS_PER_COMPONENT])
    }

    /// Model value at `t`.
    pub fn evaluate(&self, params: &DVector<f64>, t: f64) -> f64 {
        params[0]
            + (0..self.components)
                .map(|k| skew_normal::evaluate(&Self::component(params, k), t))
                .sum::<f64>()
    }
}

impl LeastSquaresProblem for MixedPeakModel<'_> {
    fn parameter_count(&self) -> usize {
        1 + PARAMS_PER_COMPONENT * self.components
    }

    fn residuals(&self, params: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(
            self.times.len(),
            self.times
                .iter()
                .zip(self.values)
                .map(|(t, v)| self.evaluate(params, *t) - v),
        )
    }

    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64> {
        let mut jac = DMatrix::zeros(self.times.len(), self.parameter_count());
        let components: Vec<SkewNormalParams> = (0..self.components)
            .map(|k| Self::component(params, k))
            .collect();
        for (row, t) in self.times.iter().enumerate() {
            jac[(row, 0)] = 1.0;
            for (k, comp) in components.iter().enumerate() {
                let offset = 1 + k * PARAMS_PER_COMPONENT;
                for (j, d) in skew_normal::gradient(comp, *t).into_iter().enumerate() {
                    jac[(row, offset + j)] = d;
                }
            }
        }
        jac
    }

    fn project(&self, params: &mut DVector<f64>) {
        for k in 0..self.components {
            let scale = &mut params[1 + k * PARAMS_PER_COMPONENT + 3];
            if *scale < self.min_scale {
                *scale = self.min_scale;
            }
        }
    }
}

/// Starting point: the slice minimum as baseline and, per member, a fraction
/// of its apex height at its apex.
fn initial_guess(peak: &Peak, corrected: &Series, slice: &Series, config: &FitConfig) -> DVector<f64> {
    let mut guess = vec![slice.min_value()];
    for member in peak.iter_members() {
        guess.extend_from_slice(&[
            corrected.value_at(member.apex) / config.amplitude_divisor,
            config.initial_skew,
            member.apex,
            config.initial_scale,
        ]);
    }
    DVector::from_vec(guess)
}

/// Fits one mixed peak group against the corrected trace.
pub fn fit_group(
    peak: &Peak,
    corrected: &Series,
    config: &FitConfig,
) -> Result<FitOutcome, FitError> {
    let components = 1 + peak.children.len();
    let parameters = 1 + PARAMS_PER_COMPONENT * components;
    let slice = match peak.data_slice(corrected) {
        Some(slice) if slice.len() >= parameters => slice,
        other => {
            return Err(FitError::TooFewSamples {
                samples: other.map_or(0, |s| s.len()),
                parameters,
            })
        }
    };
    let model = MixedPeakModel::new(&slice, components, config.min_scale);
    let initial = initial_guess(peak, corrected, &slice, config);
    levenberg_marquardt(&model, initial, config)
}

fn apply_outcome(peak: &mut Peak, outcome: &FitOutcome) {
    let shared_baseline = outcome.params[0];
    let status = FitStatus::Converged {
        iterations: outcome.iterations,
    };
    let component_fit = |k: usize| ComponentFit {
        params: MixedPeakModel::component(&outcome.params, k),
        shared_baseline,
    };

    peak.fit = Some(component_fit(0));
    peak.fit_status = status.clone();
    for (k, child) in peak.children.iter_mut().enumerate() {
        child.fit = Some(component_fit(k + 1));
        child.fit_status = status.clone();
    }
}

fn mark_failed(peak: &mut Peak, error: &FitError) {
    let status = FitStatus::Failed {
        reason: error.to_string(),
    };
    peak.fit = None;
    peak.fit_status = status.clone();
    for child in peak.children.iter_mut() {
        child.fit = None;
        child.fit_status = status.clone();
    }
}

/// Fits every mixed peak in `peaks`, recording the outcome on the group.
///
/// A failed fit leaves the group without fit parameters and marks the
/// parent and every child as [`FitStatus::Failed`]; other groups are not
/// affected. Peaks without children are left untouched.
#[cfg_attr(
    feature = "instrumentation",
    tracing::instrument(skip_all, level = "trace")
)]
pub fn fit_mixed_peaks(peaks: &mut [Peak], corrected: &Series, config: &FitConfig) {
    for peak in peaks.iter_mut().filter(|p| p.is_mixed()) {
        match fit_group(peak, corrected, config) {
            Ok(outcome) => {
                debug!(
                    "Fitted group at {:.4} min with {} components: {:?} after {} iterations",
                    peak.apex,
                    1 + peak.children.len(),
                    outcome.termination,
                    outcome.iterations
                );
                apply_outcome(peak, &outcome);
            }
            Err(e) => {
                warn!("Fit of group at {:.4} min failed: {}", peak.apex, e);
                mark_failed(peak, &e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian(t: f64, center: f64, sigma: f64, height: f64) -> f64 {
        height * (-0.5 * ((t - center) / sigma).powi(2)).exp()
    }

    /// A wide bump with two narrow shoulders and a little detector noise.
    fn nested_trace() -> Series {
        let samples: Vec<f64> = (0..600)
            .map(|i| {
                let t = i as f64 / 60.0;
                let noise = if i % 2 == 0 { 0.05 } else { -0.05 };
                gaussian(t, 5.0, 0.4, 50.0)
                    + gaussian(t, 4.3, 0.05, 15.0)
                    + gaussian(t, 5.7, 0.05, 15.0)
                    + noise
            })
            .collect();
        Series::from_samples(&samples, 1000.0).unwrap()
    }

    fn nested_group() -> Peak {
        let mut parent = Peak::new(5.0, 3.8667, 6.1333);
        parent.children = vec![Peak::new(4.3, 4.25, 4.4), Peak::new(5.7, 5.6, 5.75)];
        parent
    }

    #[test]
    fn test_parameter_layout() {
        let trace = nested_trace();
        let model = MixedPeakModel::new(&trace, 2, 1e-6);
        assert_eq!(model.parameter_count(), 9);
        let params = DVector::from_vec(vec![1.0, 2.0, 0.0, 5.0, 0.5, 0.0, 0.0, 4.0, 0.5]);
        // Second component has zero amplitude, first is a gaussian of area 2.
        let expected = 1.0 + 2.0 / 0.5 * (1.0 / (2.0 * std::f64::consts::PI).sqrt());
        assert!((model.evaluate(&params, 5.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_scale_is_projected() {
        let trace = nested_trace();
        let model = MixedPeakModel::new(&trace, 1, 1e-3);
        let mut params = DVector::from_vec(vec![0.0, 1.0, 0.0, 5.0, -2.0]);
        model.project(&mut params);
        assert_eq!(params[4], 1e-3);
    }

    #[test]
    fn test_converged_group_gets_fit_everywhere() {
        let trace = nested_trace();
        let mut peaks = vec![nested_group(), Peak::new(8.0, 7.9, 8.1)];
        fit_mixed_peaks(&mut peaks, &trace, &FitConfig::default());

        let group = &peaks[0];
        assert!(matches!(group.fit_status, FitStatus::Converged { .. }));
        for member in group.iter_members() {
            let fit = member.fit.expect("fitted member");
            assert_eq!(fit.shared_baseline, group.shared_baseline().unwrap());
            assert!(fit.params.scale > 0.0);
        }
        // The wide component carries most of the signal.
        let parent_amp = group.fit_params().unwrap().amplitude;
        for child in &group.children {
            assert!(child.fit_params().unwrap().amplitude < parent_amp);
        }
        // Simple peaks are not fitted.
        assert_eq!(peaks[1].fit_status, FitStatus::NotFitted);
        assert!(peaks[1].fit.is_none());
    }

    #[test]
    fn test_failed_group_is_marked() {
        let trace = nested_trace();
        let mut peaks = vec![nested_group()];
        fit_mixed_peaks(&mut peaks, &trace, &FitConfig::default().max_iterations(1));
        for member in peaks[0].iter_members() {
            assert!(member.fit.is_none());
            assert!(matches!(member.fit_status, FitStatus::Failed { .. }));
        }
    }

    #[test]
    fn test_tiny_slice_is_refused() {
        let trace = nested_trace();
        let mut parent = Peak::new(5.0, 4.99, 5.04);
        parent.children = vec![Peak::new(5.01, 5.0, 5.03)];
        let err = fit_group(&parent, &trace, &FitConfig::default()).unwrap_err();
        assert!(matches!(err, FitError::TooFewSamples { parameters: 9, .. }));
    }
}
