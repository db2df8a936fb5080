//! The built optimization model.
//!
//! A [`Model`] owns its decision variables (with recorded bounds and
//! candidate values), the named index sets they are indexed by, named
//! constraint sets contributed by the builders and constraint blocks, and
//! a minimised objective. Variables are referenced by [`VarId`].

use crate::error::{ModelError, ModelResult};
use crate::expr::{LinearConstraint, LinearExpr, VarId};
use crate::sets::{FlowKey, ModelSets};
use enflow_core::Diagnostics;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Which builder produced a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelKind {
    Operational,
    Expansion,
}

impl ModelKind {
    pub fn default_name(&self) -> &'static str {
        match self {
            ModelKind::Operational => "OperationalModel",
            ModelKind::Expansion => "ExpansionModel",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Operational => f.write_str("operational"),
            ModelKind::Expansion => f.write_str("expansion"),
        }
    }
}

/// A continuous decision variable with its bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDef {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    /// Candidate value handed to the solver as a warm start
    pub initial: Option<f64>,
    /// Pinned to `initial`; not a free decision
    pub fixed: bool,
}

impl VariableDef {
    pub fn bounded(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            initial: None,
            fixed: false,
        }
    }

    /// A variable pinned to `value`.
    pub fn fixed(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            lower: value,
            upper: value,
            initial: Some(value),
            fixed: true,
        }
    }

    pub fn with_initial(mut self, initial: Option<f64>) -> Self {
        self.initial = initial;
        self
    }

    pub fn is_free(&self) -> bool {
        !self.fixed
    }

    pub fn is_unbounded_above(&self) -> bool {
        self.upper == f64::INFINITY
    }
}

/// Key of a block-owned variable: `(component label, period, timestep)`.
pub type BlockVarKey = (String, usize, usize);

#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    kind: ModelKind,
    sets: ModelSets,
    time_increment: f64,
    variables: Vec<VariableDef>,
    flow: IndexMap<(FlowKey, usize, usize), VarId>,
    investment: IndexMap<(FlowKey, usize), VarId>,
    block_variables: IndexMap<String, IndexMap<BlockVarKey, VarId>>,
    constraints: IndexMap<String, Vec<LinearConstraint>>,
    blocks: Vec<String>,
    objective: LinearExpr,
    diagnostics: Diagnostics,
}

impl Model {
    pub(crate) fn new(
        name: impl Into<String>,
        kind: ModelKind,
        sets: ModelSets,
        time_increment: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            sets,
            time_increment,
            variables: Vec::new(),
            flow: IndexMap::new(),
            investment: IndexMap::new(),
            block_variables: IndexMap::new(),
            constraints: IndexMap::new(),
            blocks: Vec::new(),
            objective: LinearExpr::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn sets(&self) -> &ModelSets {
        &self.sets
    }

    pub fn time_increment(&self) -> f64 {
        self.time_increment
    }

    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> Option<&VariableDef> {
        self.variables.get(id.0)
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub(crate) fn add_variable(&mut self, def: VariableDef) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(def);
        id
    }

    pub(crate) fn insert_flow_variable(
        &mut self,
        key: FlowKey,
        period: usize,
        timestep: usize,
        def: VariableDef,
    ) -> VarId {
        let id = self.add_variable(def);
        self.flow.insert((key, period, timestep), id);
        id
    }

    pub(crate) fn insert_investment_variable(
        &mut self,
        key: FlowKey,
        period: usize,
        def: VariableDef,
    ) -> VarId {
        let id = self.add_variable(def);
        self.investment.insert((key, period), id);
        id
    }

    /// Flow variables keyed by `(flow, period, timestep)`.
    pub fn flow_variables(&self) -> &IndexMap<(FlowKey, usize, usize), VarId> {
        &self.flow
    }

    /// Investment variables keyed by `(flow, period)`.
    pub fn investment_variables(&self) -> &IndexMap<(FlowKey, usize), VarId> {
        &self.investment
    }

    pub fn flow_id(
        &self,
        source: &str,
        target: &str,
        period: usize,
        timestep: usize,
    ) -> Option<VarId> {
        self.flow
            .get(&(FlowKey::new(source, target), period, timestep))
            .copied()
    }

    pub fn flow_var(
        &self,
        source: &str,
        target: &str,
        period: usize,
        timestep: usize,
    ) -> Option<&VariableDef> {
        self.flow_id(source, target, period, timestep)
            .and_then(|id| self.variable(id))
    }

    pub fn investment_id(&self, source: &str, target: &str, period: usize) -> Option<VarId> {
        self.investment
            .get(&(FlowKey::new(source, target), period))
            .copied()
    }

    pub fn investment_var(
        &self,
        source: &str,
        target: &str,
        period: usize,
    ) -> Option<&VariableDef> {
        self.investment_id(source, target, period)
            .and_then(|id| self.variable(id))
    }

    /// Flow variable lookup for constraint blocks; a missing variable is a block error.
    pub fn require_flow(
        &self,
        block: &str,
        source: &str,
        target: &str,
        period: usize,
        timestep: usize,
    ) -> ModelResult<VarId> {
        self.flow_id(source, target, period, timestep).ok_or_else(|| {
            ModelError::block(
                block,
                format!(
                    "no flow variable for {} at period {}, timestep {}",
                    FlowKey::new(source, target),
                    period,
                    timestep
                ),
            )
        })
    }

    /// Add a variable owned by a constraint block, e.g. a storage level.
    pub fn add_block_variable(
        &mut self,
        set: &str,
        component: &str,
        period: usize,
        timestep: usize,
        lower: f64,
        upper: f64,
    ) -> VarId {
        let def = VariableDef::bounded(
            format!("{}({},{},{})", set, component, period, timestep),
            lower,
            upper,
        );
        let id = self.add_variable(def);
        self.block_variables
            .entry(set.to_string())
            .or_default()
            .insert((component.to_string(), period, timestep), id);
        id
    }

    pub fn block_variable(
        &self,
        set: &str,
        component: &str,
        period: usize,
        timestep: usize,
    ) -> Option<VarId> {
        self.block_variables
            .get(set)
            .and_then(|vars| vars.get(&(component.to_string(), period, timestep)))
            .copied()
    }

    pub fn block_variables(&self) -> &IndexMap<String, IndexMap<BlockVarKey, VarId>> {
        &self.block_variables
    }

    pub fn add_constraint(&mut self, set: &str, constraint: LinearConstraint) {
        self.constraints
            .entry(set.to_string())
            .or_default()
            .push(constraint);
    }

    /// Constraints of a named set, empty when the set does not exist.
    pub fn constraints(&self, set: &str) -> &[LinearConstraint] {
        self.constraints.get(set).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn constraint_sets(&self) -> impl Iterator<Item = (&str, &[LinearConstraint])> {
        self.constraints
            .iter()
            .map(|(name, cs)| (name.as_str(), cs.as_slice()))
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.values().map(Vec::len).sum()
    }

    pub(crate) fn record_block(&mut self, name: &str) {
        self.blocks.push(name.to_string());
    }

    /// Names of the constraint blocks attached to this model, in order.
    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn objective_mut(&mut self) -> &mut LinearExpr {
        &mut self.objective
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// One-line summary for logging.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}): {} flows, {} variables, {} constraints in {} sets, {} blocks",
            self.name,
            self.kind,
            self.sets.flows.len(),
            self.variables.len(),
            self.num_constraints(),
            self.constraints.len(),
            self.blocks.len()
        )
    }
}
