pub mod interpolation;
pub mod stats;
