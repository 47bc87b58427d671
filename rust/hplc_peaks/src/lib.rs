#![doc = include_str!("../README.md")]

// Re-export main structures
pub use crate::baseline::ControlPoint;
pub use crate::config::{
    BaselineConfig,
    DetectionConfig,
    FitConfig,
    PipelineConfig,
};
pub use crate::models::{
    ComponentFit,
    FitStatus,
    Peak,
    PeakBound,
    Series,
    SkewNormalParams,
};
pub use crate::pipeline::{
    PeakPipeline,
    ProcessingOutput,
};
pub use crate::processing_state::{
    MeasurementHandle,
    MeasurementId,
    ProcessingGuard,
    ProcessingRegistry,
    ProcessingState,
};

// Declare modules
pub mod area;
pub mod baseline;
pub mod config;
pub mod detection;
pub mod errors;
pub mod fitting;
pub mod grouping;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod processing_state;
pub mod threshold;
pub mod utils;

// Re-export errors
pub use crate::errors::{
    FitError,
    PipelineError,
    SeriesError,
};
