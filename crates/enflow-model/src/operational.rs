//! Operational model: capacities are given, only flows are decided.
//!
//! One variable per `(flow, 0, timestep)`. Investment descriptors are not
//! considered; such flows are bounded by their nominal value like any other.

use crate::blocks::BlockRegistry;
use crate::builder::{
    add_flow_costs, add_summed_constraints, attach_blocks, collect_flows, flow_variable,
    validate_flows,
};
use crate::config::{Horizon, ModelConfig};
use crate::error::ModelResult;
use crate::model::{Model, ModelKind};
use crate::sets::ModelSets;
use enflow_core::EnergySystem;
use tracing::info;

/// Build an operational model with the default block registry.
pub fn build_operational_model(es: &EnergySystem, config: &ModelConfig) -> ModelResult<Model> {
    build(es, config, &BlockRegistry::with_defaults())
}

pub(crate) fn build(
    es: &EnergySystem,
    config: &ModelConfig,
    registry: &BlockRegistry,
) -> ModelResult<Model> {
    config.validate()?;
    let horizon = Horizon::for_system(es, 1)?;
    let records = collect_flows(es);
    validate_flows(&records, &horizon, false)?;

    let kind = ModelKind::Operational;
    let name = config.name.clone().unwrap_or_else(|| kind.default_name().to_string());
    let mut model = Model::new(name, kind, ModelSets::derive(es, &horizon), config.time_increment);

    for record in &records {
        for (p, t) in horizon.iter() {
            let def = flow_variable(record, p, t, false, config, &mut model)?;
            model.insert_flow_variable(record.key.clone(), p, t, def);
        }
    }

    add_summed_constraints(&mut model, &records)?;
    add_flow_costs(&mut model, &records);
    attach_blocks(&mut model, es, registry)?;

    info!("built {}", model.summary());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use enflow_core::{Bus, Flow, Groupings, Investment, Sink, Source};

    fn system(flow: Flow) -> EnergySystem {
        let mut es = EnergySystem::new(0..3).with_groupings(Groupings::standard());
        let grid = es.add_component(Source::new("grid")).unwrap();
        let el = es.add_component(Bus::new("el")).unwrap();
        let demand = es.add_component(Sink::new("demand")).unwrap();
        es.connect(grid, el, flow).unwrap();
        es.connect(el, demand, Flow::new().fixed(vec![1.0, 2.0, 3.0]))
            .unwrap();
        es
    }

    #[test]
    fn test_nominal_value_scales_bounds() {
        let es = system(
            Flow::new()
                .with_nominal_value(50.0)
                .with_min(vec![0.1, 0.2, 0.0])
                .with_max(vec![1.0, 0.5, 0.8]),
        );
        let model = build_operational_model(&es, &ModelConfig::default()).unwrap();

        let expected = [(5.0, 50.0), (10.0, 25.0), (0.0, 40.0)];
        for (t, (lower, upper)) in expected.iter().enumerate() {
            let var = model.flow_var("grid", "el", 0, t).unwrap();
            assert_eq!(var.lower, *lower, "lower bound at t={t}");
            assert_eq!(var.upper, *upper, "upper bound at t={t}");
            assert!(var.is_free());
        }
    }

    #[test]
    fn test_uncapacitated_flow_is_unbounded_above() {
        let model = build_operational_model(&system(Flow::new()), &ModelConfig::default()).unwrap();
        for t in 0..3 {
            let var = model.flow_var("grid", "el", 0, t).unwrap();
            assert_eq!(var.lower, 0.0);
            assert!(var.is_unbounded_above());
        }
    }

    #[test]
    fn test_candidate_values_are_scaled() {
        let es = system(
            Flow::new()
                .with_nominal_value(10.0)
                .with_actual_value(vec![Some(0.5), None, Some(1.0)]),
        );
        let model = build_operational_model(&es, &ModelConfig::default()).unwrap();
        assert_eq!(model.flow_var("grid", "el", 0, 0).unwrap().initial, Some(5.0));
        assert_eq!(model.flow_var("grid", "el", 0, 1).unwrap().initial, None);
        assert!(model.flow_var("grid", "el", 0, 2).unwrap().is_free());
    }

    #[test]
    fn test_inverted_bounds() {
        let flow = Flow::new().with_nominal_value(10.0).with_min(0.8).with_max(0.5);

        let config = ModelConfig::default();
        let err = build_operational_model(&system(flow.clone()), &config).unwrap_err();
        assert!(matches!(err, ModelError::InconsistentBounds { .. }));

        let config = config.with_fail_on_inverted_bounds(false);
        let model = build_operational_model(&system(flow), &config).unwrap();
        assert_eq!(model.diagnostics().warning_count(), 3);
    }

    #[test]
    fn test_investment_is_ignored() {
        let es = system(
            Flow::new()
                .with_nominal_value(10.0)
                .with_investment(Investment::new().with_ep_costs(100.0)),
        );
        let model = build_operational_model(&es, &ModelConfig::default()).unwrap();

        assert!(model.investment_variables().is_empty());
        assert_eq!(model.flow_var("grid", "el", 0, 0).unwrap().upper, 10.0);
        assert_eq!(model.sets().periods, 0..1);
    }

    #[test]
    fn test_variable_costs_weighted_by_time_increment() {
        let es = system(Flow::new().with_variable_costs(vec![10.0, 20.0, 30.0]));
        let config = ModelConfig::default().with_time_increment(0.5);
        let model = build_operational_model(&es, &config).unwrap();

        let var = model.flow_id("grid", "el", 0, 2).unwrap();
        assert_eq!(model.objective().coefficient(var), 15.0);
        let fixed = model.flow_id("el", "demand", 0, 0).unwrap();
        assert_eq!(model.objective().coefficient(fixed), 0.0);
    }

    #[test]
    fn test_summed_limits_integrated_flow() {
        let es = system(Flow::new().with_nominal_value(10.0).with_summed(2.0));
        let model = build_operational_model(&es, &ModelConfig::default()).unwrap();

        let summed = model.constraints("summed_flow");
        assert_eq!(summed.len(), 1);
        assert_eq!(summed[0].rhs, 20.0);
        assert_eq!(summed[0].expr.terms().len(), 3);
    }

    #[test]
    fn test_configured_name_is_used() {
        let config = ModelConfig::default().with_name("dispatch");
        let model = build_operational_model(&system(Flow::new()), &config).unwrap();
        assert_eq!(model.name(), "dispatch");
        assert_eq!(model.kind(), ModelKind::Operational);
    }
}
