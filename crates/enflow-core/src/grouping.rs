//! Predicate-based classification of components into groups.
//!
//! A [`Groupings`] value is an ordered list of named predicates. Classifying
//! a component runs the predicates in list order and the first one that
//! returns a key decides the group; later predicates are never consulted for
//! that component. Two predicates may structurally overlap (e.g. "every bus"
//! and "buses labelled `el`"), so the order in which they are pushed is part
//! of the configuration.
//!
//! Keys are plain tags. Model builders look the key up in a block registry
//! to find the constraint block that should be attached to the members.

use crate::component::Component;
use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use std::fmt;
use std::sync::Arc;

/// Tag naming a group of components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    /// Inflow equals outflow per timestep
    BusBalance,
    /// Transformer outputs tied to inputs by conversion factors
    LinearRelation,
    /// Storage state-of-charge bookkeeping
    StorageBalance,
    /// Any user-defined group
    Custom(String),
}

impl GroupKey {
    pub fn custom(name: impl Into<String>) -> Self {
        GroupKey::Custom(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            GroupKey::BusBalance => "bus_balance",
            GroupKey::LinearRelation => "linear_relation",
            GroupKey::StorageBalance => "storage_balance",
            GroupKey::Custom(name) => name,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type Predicate = dyn Fn(&Component) -> Option<GroupKey> + Send + Sync;

/// A named classification predicate.
#[derive(Clone)]
pub struct Grouping {
    name: String,
    predicate: Arc<Predicate>,
}

impl Grouping {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Component) -> Option<GroupKey> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, component: &Component) -> Option<GroupKey> {
        (self.predicate)(component)
    }
}

impl fmt::Debug for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grouping").field("name", &self.name).finish()
    }
}

/// Buses whose label contains `marker` balance their flows.
pub fn bus_label_grouping(marker: impl Into<String>) -> Grouping {
    let marker = marker.into();
    Grouping::new(format!("bus_label[{}]", marker), move |c| match c {
        Component::Bus(bus) if bus.label.contains(marker.as_str()) => Some(GroupKey::BusBalance),
        _ => None,
    })
}

/// Structural grouping: buses balance, transformers relate inputs to
/// outputs, storages track their filling level.
pub fn constraint_grouping() -> Grouping {
    Grouping::new("constraint", |c| match c {
        Component::Bus(_) => Some(GroupKey::BusBalance),
        Component::Transformer(_) => Some(GroupKey::LinearRelation),
        Component::Storage(_) => Some(GroupKey::StorageBalance),
        Component::Source(_) | Component::Sink(_) => None,
    })
}

/// Ordered list of predicates; first match wins.
#[derive(Debug, Clone, Default)]
pub struct Groupings {
    predicates: Vec<Grouping>,
}

impl Groupings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The structural [`constraint_grouping`] alone.
    pub fn standard() -> Self {
        Self::new().with(constraint_grouping())
    }

    /// Append a predicate; it is consulted after all earlier ones.
    pub fn with(mut self, grouping: Grouping) -> Self {
        self.predicates.push(grouping);
        self
    }

    pub fn push(&mut self, grouping: Grouping) {
        self.predicates.push(grouping);
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Grouping> {
        self.predicates.iter()
    }

    /// Key of the first predicate matching `component`.
    pub fn classify(&self, component: &Component) -> Option<GroupKey> {
        self.predicates.iter().find_map(|g| g.apply(component))
    }
}

/// Members of each group, in classification order.
///
/// Only non-null keys are ever stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Groups {
    members: IndexMap<GroupKey, Vec<NodeIndex>>,
}

impl Groups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `node` and record it; returns the key it was filed under.
    pub fn insert(
        &mut self,
        groupings: &Groupings,
        node: NodeIndex,
        component: &Component,
    ) -> Option<GroupKey> {
        let key = groupings.classify(component)?;
        self.members.entry(key.clone()).or_default().push(node);
        Some(key)
    }

    pub fn get(&self, key: &GroupKey) -> Option<&[NodeIndex]> {
        self.members.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.members.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &[NodeIndex])> {
        self.members.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}
