//! Solve adapter over `good_lp` with the Clarabel backend.
//!
//! Variables are registered with `good_lp` in model order; fixed variables
//! are declared free and pinned by an equality row, the remaining bounds
//! are passed as variable bounds.

use crate::error::{ModelError, ModelResult};
use crate::expr::{LinearConstraint, LinearExpr, Sense};
use crate::model::{BlockVarKey, Model};
use crate::sets::FlowKey;
use anyhow::{Context, Result};
use good_lp::solvers::clarabel::clarabel;
use good_lp::{
    constraint, variable, variables, Constraint, Expression, Solution, SolverModel, Variable,
};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Variable values of a solved model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSolution {
    pub objective: f64,
    #[serde(serialize_with = "serialize_keyed")]
    pub flow: IndexMap<(FlowKey, usize, usize), f64>,
    #[serde(serialize_with = "serialize_keyed")]
    pub investment: IndexMap<(FlowKey, usize), f64>,
    #[serde(serialize_with = "serialize_block_values")]
    pub block_variables: IndexMap<String, IndexMap<BlockVarKey, f64>>,
    pub solve_time: Duration,
}

impl ModelSolution {
    pub fn flow_value(
        &self,
        source: &str,
        target: &str,
        period: usize,
        timestep: usize,
    ) -> Option<f64> {
        self.flow
            .get(&(FlowKey::new(source, target), period, timestep))
            .copied()
    }

    /// Values of one flow over the timesteps of a period.
    pub fn flow_series(&self, source: &str, target: &str, period: usize) -> Vec<f64> {
        self.flow
            .iter()
            .filter(|((k, p, _), _)| k.source == source && k.target == target && *p == period)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn investment_value(&self, source: &str, target: &str, period: usize) -> Option<f64> {
        self.investment
            .get(&(FlowKey::new(source, target), period))
            .copied()
    }

    pub fn block_value(
        &self,
        set: &str,
        component: &str,
        period: usize,
        timestep: usize,
    ) -> Option<f64> {
        self.block_variables
            .get(set)
            .and_then(|vals| vals.get(&(component.to_string(), period, timestep)))
            .copied()
    }

    /// Export to JSON.
    pub fn to_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing ModelSolution to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing JSON to {}", path.display()))?;
        Ok(())
    }
}

// Tuple keys are not valid JSON object keys; write them as lists of pairs.
fn serialize_keyed<K: Serialize, S: serde::Serializer>(
    map: &IndexMap<K, f64>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(map.iter())
}

fn serialize_block_values<S: serde::Serializer>(
    map: &IndexMap<String, IndexMap<BlockVarKey, f64>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(
        map.iter()
            .map(|(set, vals)| (set, vals.iter().collect::<Vec<_>>())),
    )
}

fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    let mut out = Expression::from(expr.constant());
    for (var, coef) in expr.terms() {
        out += *coef * handles[var.index()];
    }
    out
}

fn to_constraint(c: &LinearConstraint, handles: &[Variable]) -> Constraint {
    let lhs = to_expression(&c.expr, handles);
    let rhs = c.rhs;
    match c.sense {
        Sense::Le => constraint!(lhs <= rhs),
        Sense::Ge => constraint!(lhs >= rhs),
        Sense::Eq => constraint!(lhs == rhs),
    }
}

impl Model {
    /// Hand the model to Clarabel and collect the variable values.
    pub fn solve(&self) -> ModelResult<ModelSolution> {
        let start = Instant::now();

        let mut vars = variables!();
        let mut pinned = Vec::new();
        let handles: Vec<Variable> = self
            .variables()
            .iter()
            .map(|def| {
                let mut definition = variable().name(def.name.clone());
                if let Some(initial) = def.initial {
                    definition = definition.initial(initial);
                }
                if def.fixed {
                    let handle = vars.add(definition);
                    pinned.push((handle, def.lower));
                    return handle;
                }
                if def.lower.is_finite() {
                    definition = definition.min(def.lower);
                }
                if def.upper.is_finite() {
                    definition = definition.max(def.upper);
                }
                vars.add(definition)
            })
            .collect();

        let mut problem = vars
            .minimise(to_expression(self.objective(), &handles))
            .using(clarabel);
        for (handle, value) in pinned {
            problem = problem.with(constraint!(handle == value));
        }
        for (_, constraints) in self.constraint_sets() {
            for c in constraints {
                problem = problem.with(to_constraint(c, &handles));
            }
        }

        debug!(model = %self.name(), "handing model to clarabel");
        let solution = problem
            .solve()
            .map_err(|e| ModelError::Solver(e.to_string()))?;

        let values: Vec<f64> = handles.iter().map(|h| solution.value(*h)).collect();
        let value_of = |id: crate::expr::VarId| values[id.index()];

        let flow = self
            .flow_variables()
            .iter()
            .map(|(k, id)| (k.clone(), value_of(*id)))
            .collect();
        let investment = self
            .investment_variables()
            .iter()
            .map(|(k, id)| (k.clone(), value_of(*id)))
            .collect();
        let block_variables = self
            .block_variables()
            .iter()
            .map(|(set, vars)| {
                let vals = vars
                    .iter()
                    .map(|(k, id)| (k.clone(), value_of(*id)))
                    .collect();
                (set.clone(), vals)
            })
            .collect();

        let solution = ModelSolution {
            objective: self.objective().eval(value_of),
            flow,
            investment,
            block_variables,
            solve_time: start.elapsed(),
        };
        info!(
            model = %self.name(),
            objective = solution.objective,
            elapsed_ms = solution.solve_time.as_millis() as u64,
            "model solved"
        );
        Ok(solution)
    }
}
