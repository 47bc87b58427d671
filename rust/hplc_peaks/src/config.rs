use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::{
    PipelineError,
    Result,
};

/// Settings for every stage of the pipeline.
///
/// All fields have defaults, so a partial JSON document only needs the
/// values it changes:
///
/// ```
/// use hplc_peaks::PipelineConfig;
///
/// let config: PipelineConfig =
///     serde_json::from_str(r#"{ "baseline": { "iterations": 4 } }"#).unwrap();
/// assert_eq!(config.baseline.iterations, 4);
/// assert_eq!(config.baseline.lambda, 167.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub baseline: BaselineConfig,
    pub detection: DetectionConfig,
    pub fit: FitConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Smoothness penalty. Tuned for `target_samples_per_second`.
    pub lambda: f64,
    /// Weight given to samples above the current estimate; samples below get
    /// `1 - asymmetry`.
    pub asymmetry: f64,
    pub iterations: usize,
    /// When false the solver runs on every sample.
    pub downsample: bool,
    pub target_samples_per_second: f64,
}

impl BaselineConfig {
    pub const DEFAULT_LAMBDA: f64 = 167.0;
    pub const DEFAULT_ITERATIONS: usize = 10;
    pub const DEFAULT_TARGET_SPS: f64 = 0.5;
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            lambda: Self::DEFAULT_LAMBDA,
            asymmetry: 0.0,
            iterations: Self::DEFAULT_ITERATIONS,
            downsample: true,
            target_samples_per_second: Self::DEFAULT_TARGET_SPS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Smallest jump (mAU) between consecutive quantiles that marks the start
    /// of the peak mass.
    pub quantile_max_diff: f64,
    pub quantile_low: f64,
    pub quantile_count: usize,
    /// Minimum apex spacing and minimum peak width, in seconds.
    pub min_seconds_per_peak: f64,
    /// Fraction of the prominence below the apex where bounds are placed.
    pub rel_height: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            quantile_max_diff: 0.3,
            quantile_low: 0.5,
            quantile_count: 100,
            min_seconds_per_peak: 5.0,
            rel_height: 0.99,
        }
    }
}

/// Levenberg-Marquardt settings and initial guesses for mixed-peak fits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub max_iterations: usize,
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
    pub initial_skew: f64,
    pub initial_scale: f64,
    /// Initial amplitude is the apex height divided by this.
    pub amplitude_divisor: f64,
    pub min_scale: f64,
}

impl FitConfig {
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn tolerances(mut self, ftol: f64, xtol: f64, gtol: f64) -> Self {
        self.ftol = ftol;
        self.xtol = xtol;
        self.gtol = gtol;
        self
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 1e-12,
            initial_skew: 1.0,
            initial_scale: 0.1,
            amplitude_divisor: 10.0,
            min_scale: 1e-6,
        }
    }
}

fn check(ok: bool, field: &'static str, context: impl std::fmt::Display) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(PipelineError::invalid_config(field, context))
    }
}

impl PipelineConfig {
    /// Rejects settings the numerical stages cannot run with.
    pub fn validate(&self) -> Result<()> {
        let b = &self.baseline;
        check(b.iterations > 0, "baseline.iterations", "must be at least 1")?;
        check(
            b.lambda.is_finite() && b.lambda > 0.0,
            "baseline.lambda",
            format!("must be positive, got {}", b.lambda),
        )?;
        check(
            (0.0..=1.0).contains(&b.asymmetry),
            "baseline.asymmetry",
            format!("must be within [0, 1], got {}", b.asymmetry),
        )?;
        check(
            b.target_samples_per_second.is_finite() && b.target_samples_per_second > 0.0,
            "baseline.target_samples_per_second",
            format!("must be positive, got {}", b.target_samples_per_second),
        )?;

        let d = &self.detection;
        check(
            d.quantile_max_diff.is_finite() && d.quantile_max_diff >= 0.0,
            "detection.quantile_max_diff",
            format!("must be non-negative, got {}", d.quantile_max_diff),
        )?;
        check(
            (0.0..1.0).contains(&d.quantile_low),
            "detection.quantile_low",
            format!("must be within [0, 1), got {}", d.quantile_low),
        )?;
        check(
            d.quantile_count >= 2,
            "detection.quantile_count",
            "must be at least 2",
        )?;
        check(
            d.min_seconds_per_peak.is_finite() && d.min_seconds_per_peak >= 0.0,
            "detection.min_seconds_per_peak",
            format!("must be non-negative, got {}", d.min_seconds_per_peak),
        )?;
        check(
            d.rel_height > 0.0 && d.rel_height <= 1.0,
            "detection.rel_height",
            format!("must be within (0, 1], got {}", d.rel_height),
        )?;

        let f = &self.fit;
        check(f.max_iterations > 0, "fit.max_iterations", "must be at least 1")?;
        check(
            f.initial_scale > f.min_scale && f.min_scale > 0.0,
            "fit.initial_scale",
            "initial and minimum scale must be positive, initial above minimum",
        )?;
        check(
            f.amplitude_divisor != 0.0 && f.amplitude_divisor.is_finite(),
            "fit.amplitude_divisor",
            "must be finite and non-zero",
        )?;
        Ok(())
    }
}
