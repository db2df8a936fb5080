//! Build steps shared by the operational and expansion models.
//!
//! A build is a one-shot, sequential transformation of
//! `(energy system, configuration)` into a [`Model`]:
//!
//! 1. validate every flow against the horizon (shapes, fixed values)
//! 2. derive the index sets
//! 3. create flow variables (and investment variables for expansion)
//! 4. add flow-level constraints and the objective
//! 5. attach a constraint block to every registered group
//!
//! All flows are validated before any variable exists, so a malformed flow
//! never leaves variables behind.

use crate::blocks::BlockRegistry;
use crate::config::{Horizon, ModelConfig};
use crate::error::{ModelError, ModelResult};
use crate::expr::{LinearConstraint, LinearExpr};
use crate::model::{Model, VariableDef};
use crate::sets::FlowKey;
use crate::{expansion, operational};
use enflow_core::diagnostics::{CATEGORY_BOUNDS, CATEGORY_GROUPING};
use enflow_core::{EnergySystem, Flow, ShapeMismatch};
use tracing::{debug, warn};

/// A flow of the energy system together with its join key.
pub(crate) struct FlowRecord<'a> {
    pub key: FlowKey,
    pub flow: &'a Flow,
}

pub(crate) fn collect_flows(es: &EnergySystem) -> Vec<FlowRecord<'_>> {
    es.flows()
        .map(|(source, target, flow)| FlowRecord {
            key: FlowKey::new(es.label(source), es.label(target)),
            flow,
        })
        .collect()
}

fn check_shape(
    key: &FlowKey,
    attribute: &'static str,
    result: Result<(), ShapeMismatch>,
) -> ModelResult<()> {
    result.map_err(|m| ModelError::DimensionMismatch {
        flow: key.clone(),
        attribute,
        expected: m.expected,
        found: m.found,
    })
}

/// Check a flow against the horizon before any variable is created.
///
/// `with_investment` enables the checks that only matter when investment
/// decisions are modelled.
pub(crate) fn validate_flow(
    record: &FlowRecord<'_>,
    horizon: &Horizon,
    with_investment: bool,
) -> ModelResult<()> {
    let FlowRecord { key, flow } = record;
    let (periods, timesteps) = (horizon.periods, horizon.timesteps);

    check_shape(key, "min", flow.min.check(periods, timesteps))?;
    check_shape(key, "max", flow.max.check(periods, timesteps))?;
    check_shape(key, "actual_value", flow.actual_value.check(periods, timesteps))?;
    check_shape(key, "variable_costs", flow.variable_costs.check(periods, timesteps))?;
    if let Some(nominal) = &flow.nominal_value {
        check_shape(key, "nominal_value", nominal.check(periods))?;
    }
    let investment = flow.investment.as_ref().filter(|_| with_investment);
    if let Some(investment) = investment {
        check_shape(key, "investment.maximum", investment.maximum.check(periods))?;
    }

    if flow.fixed {
        for (p, t) in horizon.iter() {
            if flow.scaled_actual_value(p, t).is_none() {
                return Err(ModelError::MissingActualValue {
                    flow: key.clone(),
                    period: p,
                    timestep: t,
                });
            }
        }
    }

    if flow.summed.is_some() && flow.nominal_value.is_none() && investment.is_none() {
        return Err(ModelError::SummedWithoutCapacity(key.clone()));
    }
    Ok(())
}

pub(crate) fn validate_flows(
    records: &[FlowRecord<'_>],
    horizon: &Horizon,
    with_investment: bool,
) -> ModelResult<()> {
    records
        .iter()
        .try_for_each(|r| validate_flow(r, horizon, with_investment))
}

/// Variable of a flow at `(period, timestep)`.
///
/// Fixed flows are pinned to their scaled actual value. Otherwise the scaled
/// actual value becomes the candidate value and the bounds are
/// `[min · N, max · N]`, or `[0, ∞)` without a nominal value `N`. With
/// `investment_linked` the upper bound is left open; it is enforced by a
/// linking constraint instead.
pub(crate) fn flow_variable(
    record: &FlowRecord<'_>,
    period: usize,
    timestep: usize,
    investment_linked: bool,
    config: &ModelConfig,
    model: &mut Model,
) -> ModelResult<VariableDef> {
    let FlowRecord { key, flow } = record;
    let name = format!("flow({},{},{},{})", key.source, key.target, period, timestep);

    if flow.fixed {
        let value = flow
            .scaled_actual_value(period, timestep)
            .ok_or_else(|| ModelError::MissingActualValue {
                flow: key.clone(),
                period,
                timestep,
            })?;
        return Ok(VariableDef::fixed(name, value));
    }

    let initial = flow.scaled_actual_value(period, timestep);
    let nominal = match flow.nominal_value_at(period) {
        Some(n) => n,
        None if investment_linked => 0.0,
        None => {
            return Ok(VariableDef::bounded(name, 0.0, f64::INFINITY).with_initial(initial));
        }
    };

    let min = flow.min.at(period, timestep).copied().unwrap_or(0.0);
    let max = flow.max.at(period, timestep).copied().unwrap_or(1.0);
    let lower = min * nominal;
    let upper = if investment_linked {
        f64::INFINITY
    } else {
        max * nominal
    };

    if lower > upper {
        if config.fail_on_inverted_bounds {
            return Err(ModelError::InconsistentBounds {
                flow: key.clone(),
                period,
                timestep,
                lower,
                upper,
            });
        }
        let message = format!(
            "lower bound {} above upper bound {} at period {}, timestep {}",
            lower, upper, period, timestep
        );
        warn!(flow = %key, "{}", message);
        model
            .diagnostics_mut()
            .add_warning_with_entity(CATEGORY_BOUNDS, &message, &key.to_string());
    }

    Ok(VariableDef::bounded(name, lower, upper).with_initial(initial))
}

/// `Σ_t Δt · flow[p, t] ≤ summed · (N[p] + invest[p])` per flow and period.
pub(crate) fn add_summed_constraints(
    model: &mut Model,
    records: &[FlowRecord<'_>],
) -> ModelResult<()> {
    let dt = model.time_increment();
    let periods = model.sets().periods.clone();
    let timesteps = model.sets().timesteps.clone();

    for record in records {
        let Some(summed) = record.flow.summed else {
            continue;
        };
        let FlowKey { source, target } = &record.key;
        for p in periods.clone() {
            let mut expr = LinearExpr::new();
            for t in timesteps.clone() {
                expr.add_term(model.require_flow("summed_flow", source, target, p, t)?, dt);
            }
            if let Some(invest) = model.investment_id(source, target, p) {
                expr.add_term(invest, -summed);
            }
            let capacity = record.flow.nominal_value_at(p).unwrap_or(0.0);
            let name = format!("{}_{}_{}", source, target, p);
            model.add_constraint(
                "summed_flow",
                LinearConstraint::le(name, expr, summed * capacity),
            );
        }
    }
    Ok(())
}

/// Variable costs of every flow plus fixed costs of existing capacity.
pub(crate) fn add_flow_costs(model: &mut Model, records: &[FlowRecord<'_>]) {
    let dt = model.time_increment();
    let periods = model.sets().periods.clone();
    let timesteps = model.sets().timesteps.clone();

    for record in records {
        let FlowKey { source, target } = &record.key;
        for p in periods.clone() {
            for t in timesteps.clone() {
                let cost = record.flow.variable_costs.at(p, t).copied().unwrap_or(0.0);
                if let Some(var) = model.flow_id(source, target, p, t) {
                    model.objective_mut().add_term(var, cost * dt);
                }
            }
            let nominal = record.flow.nominal_value_at(p);
            if let (Some(fixed), Some(nominal)) = (record.flow.fixed_costs, nominal) {
                model.objective_mut().add_constant(fixed * nominal);
            }
        }
    }
}

/// Instantiate the registered block for every group and let it add its
/// constraints. Groups without a registered block are skipped.
pub(crate) fn attach_blocks(
    model: &mut Model,
    es: &EnergySystem,
    registry: &BlockRegistry,
) -> ModelResult<()> {
    for (key, members) in es.groups().iter() {
        match registry.create(key) {
            Some(mut block) => {
                debug!(group = %key, members = members.len(), "creating constraint block");
                block.create(model, es, members)?;
                model.record_block(block.name());
            }
            None => {
                let message = format!(
                    "no constraint block registered for group '{}', {} member(s) skipped",
                    key,
                    members.len()
                );
                warn!(group = %key, "{}", message);
                model
                    .diagnostics_mut()
                    .add_warning_with_entity(CATEGORY_GROUPING, &message, key.name());
            }
        }
    }
    Ok(())
}

/// Builds models with a fixed configuration and block registry.
///
/// # Example
///
/// ```
/// use enflow_core::*;
/// use enflow_model::{ModelBuilder, ModelConfig};
///
/// let mut es = EnergySystem::new(0..2).with_groupings(Groupings::standard());
/// let el = es.add_component(Bus::new("el")).unwrap();
/// let grid = es.add_component(Source::new("grid")).unwrap();
/// let demand = es.add_component(Sink::new("demand")).unwrap();
/// es.connect(grid, el, Flow::new().with_variable_costs(30.0)).unwrap();
/// es.connect(el, demand, Flow::new().fixed(vec![5.0, 7.0])).unwrap();
///
/// let model = ModelBuilder::new(ModelConfig::default())
///     .build_operational(&es)
///     .unwrap();
/// assert_eq!(model.constraints("bus_balance").len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    config: ModelConfig,
    registry: BlockRegistry,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

impl ModelBuilder {
    /// Builder with the default block registry.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            registry: BlockRegistry::with_defaults(),
        }
    }

    pub fn with_registry(mut self, registry: BlockRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BlockRegistry {
        &mut self.registry
    }

    pub fn build_operational(&self, es: &EnergySystem) -> ModelResult<Model> {
        operational::build(es, &self.config, &self.registry)
    }

    pub fn build_expansion(&self, es: &EnergySystem) -> ModelResult<Model> {
        expansion::build(es, &self.config, &self.registry)
    }
}
