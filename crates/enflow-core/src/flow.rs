//! Flow descriptors and investment options.
//!
//! A [`Flow`] is the attribute bundle carried by a directed edge between two
//! components. It has no identity of its own: the edge `(source, target)` is
//! its key, and the graph allows at most one flow per ordered pair.
//!
//! Bounds are fractional. With a nominal value `N`, the flow at `(p, t)` lies
//! in `[min[p,t] * N[p], max[p,t] * N[p]]`; without one the flow is
//! uncapacitated. A fixed flow is pinned to `actual_value[p,t] * N[p]`
//! (or the raw actual value when `N` is absent).

use crate::series::{PerPeriod, Series};
use serde::{Deserialize, Serialize};

/// Capacity expansion option attached to a single flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Investment {
    /// Upper bound on the invested capacity, per period
    pub maximum: PerPeriod,
    /// Cost per unit of invested capacity and period
    pub ep_costs: f64,
}

impl Default for Investment {
    fn default() -> Self {
        Self {
            maximum: PerPeriod::Uniform(f64::INFINITY),
            ep_costs: 0.0,
        }
    }
}

impl Investment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_maximum(mut self, maximum: impl Into<PerPeriod>) -> Self {
        self.maximum = maximum.into();
        self
    }

    pub fn with_ep_costs(mut self, ep_costs: f64) -> Self {
        self.ep_costs = ep_costs;
        self
    }

    /// Investment limit for a period; unbounded when the period is not listed.
    pub fn maximum_at(&self, period: usize) -> f64 {
        self.maximum.at(period).unwrap_or(f64::INFINITY)
    }
}

/// Attribute bundle of a directed edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flow {
    /// Lower bound as a fraction of the nominal value
    pub min: Series<f64>,
    /// Upper bound as a fraction of the nominal value
    pub max: Series<f64>,
    /// Pre-set value, relative to the nominal value when one is set
    pub actual_value: Series<Option<f64>>,
    pub nominal_value: Option<PerPeriod>,
    /// Cost per unit of flow and time increment
    pub variable_costs: Series<f64>,
    /// Cost per unit of capacity
    pub fixed_costs: Option<f64>,
    /// Limit on the time-integrated flow, in multiples of the capacity
    pub summed: Option<f64>,
    /// Pin the flow to its actual value instead of bounding it
    pub fixed: bool,
    pub investment: Option<Investment>,
}

impl Default for Flow {
    fn default() -> Self {
        Self {
            min: Series::Constant(0.0),
            max: Series::Constant(1.0),
            actual_value: Series::Constant(None),
            nominal_value: None,
            variable_costs: Series::Constant(0.0),
            fixed_costs: None,
            summed: None,
            fixed: false,
            investment: None,
        }
    }
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min(mut self, min: impl Into<Series<f64>>) -> Self {
        self.min = min.into();
        self
    }

    pub fn with_max(mut self, max: impl Into<Series<f64>>) -> Self {
        self.max = max.into();
        self
    }

    pub fn with_actual_value(mut self, actual: impl Into<Series<Option<f64>>>) -> Self {
        self.actual_value = actual.into();
        self
    }

    pub fn with_nominal_value(mut self, nominal: impl Into<PerPeriod>) -> Self {
        self.nominal_value = Some(nominal.into());
        self
    }

    pub fn with_variable_costs(mut self, costs: impl Into<Series<f64>>) -> Self {
        self.variable_costs = costs.into();
        self
    }

    pub fn with_fixed_costs(mut self, costs: f64) -> Self {
        self.fixed_costs = Some(costs);
        self
    }

    pub fn with_summed(mut self, summed: f64) -> Self {
        self.summed = Some(summed);
        self
    }

    /// Pin the flow to the given actual values.
    pub fn fixed(mut self, actual: impl Into<Series<Option<f64>>>) -> Self {
        self.actual_value = actual.into();
        self.fixed = true;
        self
    }

    pub fn with_investment(mut self, investment: Investment) -> Self {
        self.investment = Some(investment);
        self
    }

    /// Whether this flow takes part in capacity expansion.
    pub fn is_investment(&self) -> bool {
        self.investment.is_some()
    }

    pub fn nominal_value_at(&self, period: usize) -> Option<f64> {
        self.nominal_value.as_ref().and_then(|n| n.at(period))
    }

    /// Actual value at `(period, timestep)`, scaled by the nominal value when set.
    pub fn scaled_actual_value(&self, period: usize, timestep: usize) -> Option<f64> {
        let actual = self.actual_value.at(period, timestep).copied().flatten()?;
        Some(match self.nominal_value_at(period) {
            Some(nominal) => actual * nominal,
            None => actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_an_uncapacitated_free_flow() {
        let flow = Flow::new();
        assert_eq!(flow.min.at(0, 0), Some(&0.0));
        assert_eq!(flow.max.at(0, 0), Some(&1.0));
        assert!(flow.nominal_value.is_none());
        assert!(!flow.fixed);
        assert!(!flow.is_investment());
        assert_eq!(flow.scaled_actual_value(0, 0), None);
    }

    #[test]
    fn fixed_flow_scales_actual_value_by_nominal_value() {
        let flow = Flow::new()
            .with_nominal_value(10.0)
            .fixed(vec![1.0, 2.0, 3.0]);
        assert!(flow.fixed);
        assert_eq!(flow.scaled_actual_value(0, 1), Some(20.0));
    }

    #[test]
    fn actual_value_is_raw_without_nominal_value() {
        let flow = Flow::new().with_actual_value(vec![Some(4.0), None]);
        assert_eq!(flow.scaled_actual_value(0, 0), Some(4.0));
        assert_eq!(flow.scaled_actual_value(0, 1), None);
    }

    #[test]
    fn investment_maximum_defaults_to_unbounded() {
        let inv = Investment::new();
        assert!(inv.maximum_at(0).is_infinite());

        let inv = Investment::new().with_maximum(vec![50.0, 80.0]);
        assert_eq!(inv.maximum_at(1), 80.0);
    }

    #[test]
    fn flow_deserializes_with_defaults() {
        let flow: Flow =
            serde_json::from_str(r#"{"nominal_value": 10.0, "max": [0.5, 1.0]}"#).unwrap();
        assert_eq!(flow.nominal_value, Some(PerPeriod::Uniform(10.0)));
        assert_eq!(flow.max, Series::Timesteps(vec![0.5, 1.0]));
        assert_eq!(flow.min, Series::Constant(0.0));
    }
}
