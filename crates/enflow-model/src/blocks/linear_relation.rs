use super::{labels, ConstraintBlock};
use crate::error::{ModelError, ModelResult};
use crate::expr::{LinearConstraint, LinearExpr};
use crate::model::Model;
use enflow_core::{EnergySystem, NodeIndex};

/// Each transformer output equals its conversion factor times the sum of
/// the transformer's inputs.
#[derive(Debug, Clone)]
pub struct LinearRelation {
    name: String,
}

impl LinearRelation {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LinearRelation {
    fn default() -> Self {
        Self::named("linear_relation")
    }
}

impl ConstraintBlock for LinearRelation {
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
            let label = es.label(node);
            let transformer = es
                .component(node)
                .and_then(|c| c.as_transformer())
                .ok_or_else(|| {
                    ModelError::block(&self.name, format!("'{}' is not a transformer", label))
                })?;

            let inputs = labels(es, es.inputs(node));
            for (out_node, _) in es.outputs(node) {
                let output = es.label(out_node);
                let factor = transformer.conversion_factor(output).ok_or_else(|| {
                    ModelError::MissingConversionFactor {
                        transformer: label.to_string(),
                        output: output.to_string(),
                    }
                })?;

                for p in periods.clone() {
                    for t in timesteps.clone() {
                        let mut expr = LinearExpr::new();
                        expr.add_term(model.require_flow(&self.name, label, output, p, t)?, 1.0);
                        for &i in &inputs {
                            expr.add_term(model.require_flow(&self.name, i, label, p, t)?, -factor);
                        }
                        let name = format!("{}_{}_{}_{}", label, output, p, t);
                        model.add_constraint(&self.name, LinearConstraint::eq(name, expr, 0.0));
                    }
                }
            }
        }
        Ok(())
    }
}
