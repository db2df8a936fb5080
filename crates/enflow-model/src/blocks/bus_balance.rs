use super::{labels, ConstraintBlock};
use crate::error::ModelResult;
use crate::expr::{LinearConstraint, LinearExpr};
use crate::model::Model;
use enflow_core::{EnergySystem, NodeIndex};
use tracing::debug;

/// Σ inflow = Σ outflow for each member bus, period and timestep.
#[derive(Debug, Clone)]
pub struct BusBalance {
    name: String,
}

impl BusBalance {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for BusBalance {
    fn default() -> Self {
        Self::named("bus_balance")
    }
}

impl ConstraintBlock for BusBalance {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(
        &mut self,
        model: &mut Model,
        es: &EnergySystem,
        nodes: &[NodeIndex],
    ) -> ModelResult<()> {
        let periods = model.sets().periods.clone();
        let timesteps = model.sets().timesteps.clone();

        for &node in nodes {
            let bus = es.label(node);
            let inputs = labels(es, es.inputs(node));
            let outputs = labels(es, es.outputs(node));
            if inputs.is_empty() && outputs.is_empty() {
                debug!(bus, "bus without flows, no balance added");
                continue;
            }

            for p in periods.clone() {
                for t in timesteps.clone() {
                    let mut expr = LinearExpr::new();
                    for &i in &inputs {
                        expr.add_term(model.require_flow(&self.name, i, bus, p, t)?, 1.0);
                    }
                    for &o in &outputs {
                        expr.add_term(model.require_flow(&self.name, bus, o, p, t)?, -1.0);
                    }
                    model.add_constraint(
                        &self.name,
                        LinearConstraint::eq(format!("{}_{}_{}", bus, p, t), expr, 0.0),
                    );
                }
            }
        }
        Ok(())
    }
}
