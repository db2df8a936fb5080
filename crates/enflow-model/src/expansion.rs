//! Expansion model: decides flow capacities alongside the flows.
//!
//! Flow variables are indexed by `(flow, period, timestep)` for every
//! configured period. Each investment flow additionally gets one capacity
//! variable per period, `invest[f, p] ∈ [0, maximum[p]]`, and its upper
//! bound becomes the linking constraint
//!
//! ```text
//! flow[f, p, t] ≤ max[p, t] · (nominal_value[p] + invest[f, p])
//! ```
//!
//! with a missing nominal value counting as zero existing capacity.

use crate::blocks::BlockRegistry;
use crate::builder::{
    add_flow_costs, add_summed_constraints, attach_blocks, collect_flows, flow_variable,
    validate_flows, FlowRecord,
};
use crate::config::{Horizon, ModelConfig};
use crate::error::ModelResult;
use crate::expr::{LinearConstraint, LinearExpr};
use crate::model::{Model, ModelKind, VariableDef};
use crate::sets::ModelSets;
use enflow_core::EnergySystem;
use tracing::{debug, info};

/// Build an expansion model with the default block registry.
pub fn build_expansion_model(es: &EnergySystem, config: &ModelConfig) -> ModelResult<Model> {
    build(es, config, &BlockRegistry::with_defaults())
}

pub(crate) fn build(
    es: &EnergySystem,
    config: &ModelConfig,
    registry: &BlockRegistry,
) -> ModelResult<Model> {
    config.validate()?;
    let horizon = Horizon::for_system(es, config.periods)?;
    let records = collect_flows(es);
    validate_flows(&records, &horizon, true)?;

    let kind = ModelKind::Expansion;
    let name = config.name.clone().unwrap_or_else(|| kind.default_name().to_string());
    let sets = ModelSets::derive(es, &horizon);
    debug!(
        investment_flows = sets.investment_flows.len(),
        non_investment_flows = sets.non_investment_flows.len(),
        periods = horizon.periods,
        "partitioned flows"
    );
    let mut model = Model::new(name, kind, sets, config.time_increment);

    for record in &records {
        let linked = record.flow.is_investment();
        for (p, t) in horizon.iter() {
            let def = flow_variable(record, p, t, linked, config, &mut model)?;
            model.insert_flow_variable(record.key.clone(), p, t, def);
        }
    }

    for record in records.iter().filter(|r| r.flow.is_investment()) {
        add_investment(&mut model, record, &horizon)?;
    }

    add_summed_constraints(&mut model, &records)?;
    add_flow_costs(&mut model, &records);
    attach_blocks(&mut model, es, registry)?;

    info!("built {}", model.summary());
    Ok(model)
}

/// Capacity variables, linking constraints and costs of one investment flow.
fn add_investment(
    model: &mut Model,
    record: &FlowRecord<'_>,
    horizon: &Horizon,
) -> ModelResult<()> {
    let Some(investment) = record.flow.investment.as_ref() else {
        return Ok(());
    };
    let key = &record.key;

    for p in horizon.period_range() {
        let def = VariableDef::bounded(
            format!("invest({},{},{})", key.source, key.target, p),
            0.0,
            investment.maximum_at(p),
        );
        let invest = model.insert_investment_variable(key.clone(), p, def);

        if !record.flow.fixed {
            let existing = record.flow.nominal_value_at(p).unwrap_or(0.0);
            for t in horizon.timestep_range() {
                let max = record.flow.max.at(p, t).copied().unwrap_or(1.0);
                let flow = model.require_flow("investment_flow", &key.source, &key.target, p, t)?;
                let expr = LinearExpr::new().with_term(flow, 1.0).with_term(invest, -max);
                model.add_constraint(
                    "investment_flow",
                    LinearConstraint::le(
                        format!("{}_{}_{}_{}", key.source, key.target, p, t),
                        expr,
                        max * existing,
                    ),
                );
            }
        }

        let unit_cost = investment.ep_costs + record.flow.fixed_costs.unwrap_or(0.0);
        model.objective_mut().add_term(invest, unit_cost);
    }
    Ok(())
}
