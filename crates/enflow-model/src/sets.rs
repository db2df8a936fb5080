//! Index sets derived from an energy system.

use crate::config::Horizon;
use enflow_core::{Component, EnergySystem};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Join key of flow variables: `(source label, target label)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FlowKey {
    pub source: String,
    pub target: String,
}

impl FlowKey {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

/// Named index sets of a built model.
///
/// All sets follow the insertion order of the energy system, so two builds
/// of the same system produce identical sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelSets {
    pub components: IndexSet<String>,
    /// Upstream labels per component; sources have no entry
    pub inputs: IndexMap<String, Vec<String>>,
    /// Downstream labels per component; sinks have no entry
    pub outputs: IndexMap<String, Vec<String>>,
    pub flows: IndexSet<FlowKey>,
    pub non_investment_flows: IndexSet<FlowKey>,
    pub investment_flows: IndexSet<FlowKey>,
    pub timesteps: Range<usize>,
    pub periods: Range<usize>,
}

impl ModelSets {
    pub fn derive(es: &EnergySystem, horizon: &Horizon) -> Self {
        let mut sets = ModelSets {
            timesteps: horizon.timestep_range(),
            periods: horizon.period_range(),
            ..Default::default()
        };

        for (node, component) in es.nodes() {
            let label = component.label().to_string();
            if !matches!(component, Component::Source(_)) {
                let inputs = es
                    .inputs(node)
                    .into_iter()
                    .map(|(n, _)| es.label(n).to_string())
                    .collect();
                sets.inputs.insert(label.clone(), inputs);
            }
            if !matches!(component, Component::Sink(_)) {
                let outputs = es
                    .outputs(node)
                    .into_iter()
                    .map(|(n, _)| es.label(n).to_string())
                    .collect();
                sets.outputs.insert(label.clone(), outputs);
            }
            sets.components.insert(label);
        }

        // Per-flow capability check, never per component
        for (source, target, flow) in es.flows() {
            let key = FlowKey::new(es.label(source), es.label(target));
            if flow.is_investment() {
                sets.investment_flows.insert(key.clone());
            } else {
                sets.non_investment_flows.insert(key.clone());
            }
            sets.flows.insert(key);
        }

        sets
    }

    pub fn is_investment_flow(&self, key: &FlowKey) -> bool {
        self.investment_flows.contains(key)
    }

    /// `(period, timestep)` pairs, periods outermost.
    pub fn period_timesteps(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.periods
            .clone()
            .flat_map(move |p| self.timesteps.clone().map(move |t| (p, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enflow_core::{Bus, Flow, Investment, Sink, Source};

    fn system() -> EnergySystem {
        let mut es = EnergySystem::new(0..3);
        let gas = es.add_component(Source::new("gas")).unwrap();
        let el = es.add_component(Bus::new("el")).unwrap();
        let demand = es.add_component(Sink::new("demand")).unwrap();
        es.connect(gas, el, Flow::new().with_investment(Investment::new()))
            .unwrap();
        es.connect(el, demand, Flow::new()).unwrap();
        es
    }

    #[test]
    fn test_sources_have_no_inputs_and_sinks_no_outputs() {
        let sets = ModelSets::derive(&system(), &Horizon::new(3, 1));

        assert_eq!(sets.components.len(), 3);
        assert!(!sets.inputs.contains_key("gas"));
        assert!(!sets.outputs.contains_key("demand"));
        assert_eq!(sets.inputs["el"], vec!["gas".to_string()]);
        assert_eq!(sets.outputs["el"], vec!["demand".to_string()]);
    }

    #[test]
    fn test_flows_are_partitioned_by_investment() {
        let sets = ModelSets::derive(&system(), &Horizon::new(3, 2));

        assert_eq!(sets.flows.len(), 2);
        assert!(sets.is_investment_flow(&FlowKey::new("gas", "el")));
        assert!(sets
            .non_investment_flows
            .contains(&FlowKey::new("el", "demand")));
        assert_eq!(sets.period_timesteps().count(), 6);
    }
}
