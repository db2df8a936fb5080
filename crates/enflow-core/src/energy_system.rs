//! The energy system container.
//!
//! Components are nodes and flows are edges of a `petgraph` directed graph.
//! The edge `(a, b)` owns the [`Flow`] from `a` to `b`; at most one such
//! edge exists per ordered pair. Node and edge insertion order is preserved
//! and drives the order of every index set derived from the system.

use crate::component::{Component, FlowDirection};
use crate::diagnostics::{Diagnostics, CATEGORY_STORAGE};
use crate::error::{EnflowError, EnflowResult};
use crate::flow::Flow;
use crate::grouping::{Groupings, Groups};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Graph of components and flows plus the optimization horizon.
#[derive(Debug, Clone, Default)]
pub struct EnergySystem {
    graph: DiGraph<Component, Flow>,
    /// Ordered time labels defining the horizon
    pub time_idx: Vec<String>,
    groupings: Groupings,
    groups: Groups,
    labels: HashMap<String, NodeIndex>,
    diagnostics: Diagnostics,
}

impl EnergySystem {
    /// Create an empty system over the given time labels.
    pub fn new<I, T>(time_idx: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self {
            time_idx: time_idx.into_iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_groupings(mut self, groupings: Groupings) -> Self {
        self.set_groupings(groupings);
        self
    }

    /// Replace the grouping predicates and reclassify every component.
    pub fn set_groupings(&mut self, groupings: Groupings) {
        self.groupings = groupings;
        self.groups.clear();
        for node in self.graph.node_indices() {
            self.groups.insert(&self.groupings, node, &self.graph[node]);
        }
    }

    /// Read-only view of the component graph.
    ///
    /// Components and flows only enter through [`add_component`] and
    /// [`connect`], which keep labels, groups and storage-derived nominal
    /// values consistent with the graph.
    ///
    /// [`add_component`]: Self::add_component
    /// [`connect`]: Self::connect
    pub fn graph(&self) -> &DiGraph<Component, Flow> {
        &self.graph
    }

    pub fn groupings(&self) -> &Groupings {
        &self.groupings
    }

    pub fn groups(&self) -> &Groups {
        &self.groups
    }

    /// Events recorded during construction (e.g. storage overwrites).
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Number of timesteps in the horizon.
    pub fn timesteps(&self) -> usize {
        self.time_idx.len()
    }

    pub fn add_component(&mut self, component: impl Into<Component>) -> EnflowResult<NodeIndex> {
        let component = component.into();
        let label = component.label().to_string();
        if self.labels.contains_key(&label) {
            return Err(EnflowError::DuplicateLabel(label));
        }

        let node = self.graph.add_node(component);
        self.labels.insert(label, node);
        if let Some(key) = self.groups.insert(&self.groupings, node, &self.graph[node]) {
            debug!(component = %self.graph[node], group = %key, "classified component");
        }
        Ok(node)
    }

    /// Add the flow `from -> to`.
    ///
    /// Flows into or out of a storage receive the storage-derived nominal
    /// value; a pre-set nominal value is overwritten and reported.
    pub fn connect(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        mut flow: Flow,
    ) -> EnflowResult<EdgeIndex> {
        let (source, target) = match (self.graph.node_weight(from), self.graph.node_weight(to)) {
            (Some(s), Some(t)) => (s, t),
            _ => {
                return Err(EnflowError::Network(format!(
                    "unknown node in connection {:?} -> {:?}",
                    from, to
                )))
            }
        };

        if !source.accepts_outputs() {
            return Err(EnflowError::InvalidConnection {
                from: source.label().to_string(),
                to: target.label().to_string(),
                reason: format!("a {} has no outputs", source.kind()),
            });
        }
        if !target.accepts_inputs() {
            return Err(EnflowError::InvalidConnection {
                from: source.label().to_string(),
                to: target.label().to_string(),
                reason: format!("a {} has no inputs", target.kind()),
            });
        }
        if self.graph.find_edge(from, to).is_some() {
            return Err(EnflowError::ParallelFlow {
                from: source.label().to_string(),
                to: target.label().to_string(),
            });
        }

        let overwrites: Vec<_> = [
            source
                .as_storage()
                .and_then(|s| s.apply_nominal_value(FlowDirection::Output, &mut flow)),
            target
                .as_storage()
                .and_then(|s| s.apply_nominal_value(FlowDirection::Input, &mut flow)),
        ]
        .into_iter()
        .flatten()
        .collect();

        for event in overwrites {
            warn!(storage = %event.storage, direction = %event.direction, "{}", event);
            self.diagnostics.add_warning_with_entity(
                CATEGORY_STORAGE,
                &event.to_string(),
                &event.storage,
            );
        }

        Ok(self.graph.add_edge(from, to, flow))
    }

    pub fn node(&self, label: &str) -> Option<NodeIndex> {
        self.labels.get(label).copied()
    }

    pub fn component(&self, node: NodeIndex) -> Option<&Component> {
        self.graph.node_weight(node)
    }

    pub fn label(&self, node: NodeIndex) -> &str {
        self.graph
            .node_weight(node)
            .map(Component::label)
            .unwrap_or_default()
    }

    /// Components in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Component)> {
        self.graph
            .node_indices()
            .map(move |n| (n, &self.graph[n]))
    }

    /// Every flow as `(source, target, flow)`, in insertion order.
    pub fn flows(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &Flow)> {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight()))
    }

    pub fn flow(&self, from: NodeIndex, to: NodeIndex) -> Option<&Flow> {
        self.graph
            .find_edge(from, to)
            .and_then(|e| self.graph.edge_weight(e))
    }

    /// Upstream neighbours of `node` with the flows they send.
    pub fn inputs(&self, node: NodeIndex) -> Vec<(NodeIndex, &Flow)> {
        self.neighbour_flows(node, Direction::Incoming)
    }

    /// Downstream neighbours of `node` with the flows they receive.
    pub fn outputs(&self, node: NodeIndex) -> Vec<(NodeIndex, &Flow)> {
        self.neighbour_flows(node, Direction::Outgoing)
    }

    fn neighbour_flows(&self, node: NodeIndex, direction: Direction) -> Vec<(NodeIndex, &Flow)> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(node, direction)
            .map(|e| {
                let other = match direction {
                    Direction::Incoming => e.source(),
                    Direction::Outgoing => e.target(),
                };
                (e.id(), other, e.weight())
            })
            .collect();
        // petgraph walks adjacency lists newest-first
        edges.sort_by_key(|(id, _, _)| *id);
        edges.into_iter().map(|(_, n, f)| (n, f)).collect()
    }
}
