use serde::{
    Deserialize,
    Serialize,
};

use crate::models::Series;

/// Parameters of one skew-normal component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkewNormalParams {
    pub amplitude: f64,
    pub skew: f64,
    pub location: f64,
    pub scale: f64,
}

impl SkewNormalParams {
    pub fn from_slice(data: &[f64]) -> Self {
        Self {
            amplitude: data[0],
            skew: data[1],
            location: data[2],
            scale: data[3],
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.amplitude, self.skew, self.location, self.scale]
    }
}

/// The fitted shape of one member of a mixed-peak group.
///
/// The component parameters and the group's shared baseline only ever
/// exist together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentFit {
    pub params: SkewNormalParams,
    pub shared_baseline: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FitStatus {
    #[default]
    NotFitted,
    Converged {
        iterations: usize,
    },
    Failed {
        reason: String,
    },
}

/// An operator-drawn peak bound: a time and, optionally, the intensity the
/// operator anchored the bound at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakBound {
    pub time: f64,
    #[serde(default)]
    pub value: Option<f64>,
}

impl PeakBound {
    pub fn at(time: f64) -> Self {
        Self { time, value: None }
    }

    pub fn anchored(time: f64, value: f64) -> Self {
        Self {
            time,
            value: Some(value),
        }
    }
}

/// A chromatographic peak.
///
/// A peak with children is a *mixed* peak: its interval strictly contains
/// every child's interval and the whole group is resolved by a joint fit.
/// A peak with both `start_value` and `end_value` is a *manual* peak,
/// integrated against the chord between those two values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Time of the maximum, in minutes.
    pub apex: f64,
    pub start: f64,
    pub end: f64,
    pub start_value: Option<f64>,
    pub end_value: Option<f64>,
    /// Nested peaks, ordered by apex.
    pub children: Vec<Peak>,
    pub fit: Option<ComponentFit>,
    pub fit_status: FitStatus,
    pub area: Option<f64>,
}

impl Peak {
    pub fn new(apex: f64, start: f64, end: f64) -> Self {
        Self {
            apex,
            start,
            end,
            start_value: None,
            end_value: None,
            children: Vec::new(),
            fit: None,
            fit_status: FitStatus::NotFitted,
            area: None,
        }
    }

    pub fn from_bounds(apex: f64, start: PeakBound, end: PeakBound) -> Self {
        Self {
            start_value: start.value,
            end_value: end.value,
            ..Self::new(apex, start.time, end.time)
        }
    }

    pub fn is_mixed(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_manual(&self) -> bool {
        self.start_value.is_some() && self.end_value.is_some()
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    /// Strict containment of `other`'s interval in this one.
    pub fn contains(&self, other: &Peak) -> bool {
        other.start > self.start && other.end < self.end
    }

    pub fn fit_params(&self) -> Option<SkewNormalParams> {
        self.fit.map(|f| f.params)
    }

    pub fn shared_baseline(&self) -> Option<f64> {
        self.fit.map(|f| f.shared_baseline)
    }

    /// The samples of `data` covered by this peak, bounds included.
    pub fn data_slice(&self, data: &Series) -> Option<Series> {
        data.slice(self.start, self.end)
    }

    /// This peak and its children, parent first.
    pub fn iter_members(&self) -> impl Iterator<Item = &Peak> + '_ {
        std::iter::once(self).chain(self.children.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_needs_both_values() {
        let half = Peak::from_bounds(1.0, PeakBound::anchored(0.5, 3.0), PeakBound::at(1.5));
        assert!(!half.is_manual());
        let full = Peak::from_bounds(
            1.0,
            PeakBound::anchored(0.5, 3.0),
            PeakBound::anchored(1.5, 4.0),
        );
        assert!(full.is_manual());
        assert!(!full.is_mixed());
    }

    #[test]
    fn test_containment_is_strict() {
        let outer = Peak::new(2.0, 1.0, 4.0);
        assert!(outer.contains(&Peak::new(2.0, 1.5, 3.0)));
        assert!(!outer.contains(&Peak::new(2.0, 1.0, 3.0)));
        assert!(!outer.contains(&Peak::new(3.5, 2.0, 4.5)));
    }

    #[test]
    fn test_fit_accessors_move_together() {
        let mut peak = Peak::new(2.0, 1.0, 3.0);
        assert!(peak.fit_params().is_none() && peak.shared_baseline().is_none());
        peak.fit = Some(ComponentFit {
            params: SkewNormalParams::from_slice(&[4.0, 1.0, 2.0, 0.1]),
            shared_baseline: 0.5,
        });
        assert_eq!(peak.fit_params().unwrap().amplitude, 4.0);
        assert_eq!(peak.shared_baseline(), Some(0.5));
    }

    #[test]
    fn test_fit_status_serializes_tagged() {
        let json = serde_json::to_string(&FitStatus::Converged { iterations: 12 }).unwrap();
        assert_eq!(json, r#"{"status":"converged","iterations":12}"#);
    }
}
