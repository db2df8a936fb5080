use super::{labels, ConstraintBlock};
use crate::error::{ModelError, ModelResult};
use crate::expr::{LinearConstraint, LinearExpr};
use crate::model::Model;
use enflow_core::{EnergySystem, NodeIndex};

/// Filling level bookkeeping for storages.
///
/// Adds `capacity[s, p, t] ∈ [0, nominal_capacity]` and
///
/// ```text
/// capacity[t] = capacity[t-1] · (1 - loss)
///             + Δt · (η_in · Σ inflow[t] - Σ outflow[t] / η_out)
/// ```
///
/// Every period starts from the storage's initial capacity.
#[derive(Debug, Clone)]
pub struct StorageBalance {
    name: String,
}

impl StorageBalance {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for StorageBalance {
    fn default() -> Self {
        Self::named("storage_balance")
    }
}

impl ConstraintBlock for StorageBalance {
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
        let dt = model.time_increment();

        for &node in nodes {
            let label = es.label(node);
            let storage = es
                .component(node)
                .and_then(|c| c.as_storage())
                .ok_or_else(|| {
                    ModelError::block(&self.name, format!("'{}' is not a storage", label))
                })?;
            if storage.outflow_conversion_factor <= 0.0 {
                return Err(ModelError::block(
                    &self.name,
                    format!("storage '{}' has a non-positive outflow conversion factor", label),
                ));
            }

            let retention = 1.0 - storage.capacity_loss;
            let inputs = labels(es, es.inputs(node));
            let outputs = labels(es, es.outputs(node));

            for p in periods.clone() {
                let mut previous = None;
                for t in timesteps.clone() {
                    let capacity = storage.nominal_capacity;
                    let level = model.add_block_variable(&self.name, label, p, t, 0.0, capacity);

                    let mut expr = LinearExpr::new().with_term(level, 1.0);
                    let rhs = match previous {
                        Some(prev) => {
                            expr.add_term(prev, -retention);
                            0.0
                        }
                        None => retention * storage.initial_capacity,
                    };
                    for &i in &inputs {
                        let inflow = model.require_flow(&self.name, i, label, p, t)?;
                        expr.add_term(inflow, -dt * storage.inflow_conversion_factor);
                    }
                    for &o in &outputs {
                        let outflow = model.require_flow(&self.name, label, o, p, t)?;
                        expr.add_term(outflow, dt / storage.outflow_conversion_factor);
                    }

                    model.add_constraint(
                        &self.name,
                        LinearConstraint::eq(format!("{}_{}_{}", label, p, t), expr, rhs),
                    );
                    previous = Some(level);
                }
            }
        }
        Ok(())
    }
}
