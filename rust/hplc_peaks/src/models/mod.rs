pub mod peak;
pub mod series;

pub use peak::{
    ComponentFit,
    FitStatus,
    Peak,
    PeakBound,
    SkewNormalParams,
};
pub use series::Series;
