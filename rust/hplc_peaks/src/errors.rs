use std::fmt::Display;

/// Problems with the shape or content of a [`crate::Series`].
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesError {
    ExpectedNonEmptyData,
    ExpectedSameLength {
        times: usize,
        values: usize,
    },
    NonIncreasingTime {
        index: usize,
    },
    NonFiniteValue {
        index: usize,
    },
    InvalidPeriod(f64),
    InsufficientData {
        real: usize,
        expected: usize,
    },
}

impl Display for SeriesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExpectedNonEmptyData => write!(f, "Expected a non-empty series"),
            Self::ExpectedSameLength { times, values } => write!(
                f,
                "Expected times and values of the same length, got {} and {}",
                times, values
            ),
            Self::NonIncreasingTime { index } => {
                write!(f, "Times must be strictly increasing (index {})", index)
            }
            Self::NonFiniteValue { index } => write!(f, "Non-finite value at index {}", index),
            Self::InvalidPeriod(p) => write!(f, "Sampling period must be positive, got {}", p),
            Self::InsufficientData { real, expected } => write!(
                f,
                "Expected at least {} samples, got {}",
                expected, real
            ),
        }
    }
}

/// Reasons the Levenberg-Marquardt solver gave up.
///
/// These never abort the pipeline; they end up as
/// [`crate::FitStatus::Failed`] on the affected group.
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    MaxIterationsReached { iterations: usize },
    NonFiniteResiduals,
    DampingOverflow,
    ParameterCountMismatch { expected: usize, real: usize },
    TooFewSamples { samples: usize, parameters: usize },
}

impl Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MaxIterationsReached { iterations } => {
                write!(f, "did not converge in {} iterations", iterations)
            }
            Self::NonFiniteResiduals => write!(f, "model produced non-finite residuals"),
            Self::DampingOverflow => write!(f, "damping grew without finding a better step"),
            Self::ParameterCountMismatch { expected, real } => write!(
                f,
                "expected {} parameters, got {}",
                expected, real
            ),
            Self::TooFewSamples {
                samples,
                parameters,
            } => write!(
                f,
                "{} samples cannot determine {} parameters",
                samples, parameters
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Series(SeriesError),
    InvalidConfig {
        field: &'static str,
        context: String,
    },
    EmptySlice {
        start: f64,
        end: f64,
    },
    InvalidBounds {
        start: f64,
        end: f64,
    },
    ApexOnBound {
        apex: f64,
        start: f64,
        end: f64,
    },
    NoUsableControlPoints,
    AlreadyProcessing {
        context: String,
    },
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Series(e) => write!(f, "Invalid series: {}", e),
            Self::InvalidConfig { field, context } => {
                write!(f, "Invalid configuration for `{}`: {}", field, context)
            }
            Self::EmptySlice { start, end } => {
                write!(f, "No samples between {} and {} min", start, end)
            }
            Self::InvalidBounds { start, end } => {
                write!(f, "Peak start ({}) must be before its end ({})", start, end)
            }
            Self::ApexOnBound { apex, start, end } => write!(
                f,
                "Apex at {} min is not strictly inside [{}, {}]",
                apex, start, end
            ),
            Self::NoUsableControlPoints => {
                write!(f, "No baseline control point lands on the series axis")
            }
            Self::AlreadyProcessing { context } => {
                write!(f, "Measurement is already being processed: {}", context)
            }
        }
    }
}

impl std::error::Error for SeriesError {}
impl std::error::Error for FitError {}
impl std::error::Error for PipelineError {}

impl From<SeriesError> for PipelineError {
    fn from(x: SeriesError) -> Self {
        Self::Series(x)
    }
}

impl PipelineError {
    pub fn invalid_config(field: &'static str, context: impl Display) -> Self {
        Self::InvalidConfig {
            field,
            context: context.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
