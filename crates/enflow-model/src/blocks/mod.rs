//! Constraint blocks and their registry.
//!
//! A constraint block adds constraints (and possibly its own variables) for
//! the members of one group. Builders look up each group key in a
//! [`BlockRegistry`], instantiate the block, and call
//! [`ConstraintBlock::create`] with the member nodes. New block types only
//! need registering; the builders never change.
//!
//! # Example
//!
//! ```
//! use enflow_core::GroupKey;
//! use enflow_model::blocks::{BlockRegistry, BusBalance};
//!
//! let mut registry = BlockRegistry::with_defaults();
//! registry.register(GroupKey::custom("heat_balance"), |key| {
//!     Box::new(BusBalance::named(key.name()))
//! });
//! assert!(registry.contains(&GroupKey::custom("heat_balance")));
//! ```

mod bus_balance;
mod linear_relation;
mod storage_balance;

pub use bus_balance::BusBalance;
pub use linear_relation::LinearRelation;
pub use storage_balance::StorageBalance;

use crate::error::ModelResult;
use crate::model::Model;
use enflow_core::{EnergySystem, Flow, GroupKey, NodeIndex};
use indexmap::IndexMap;
use std::sync::Arc;

/// A pluggable set of constraints over a group of components.
pub trait ConstraintBlock: Send + Sync {
    /// Name of the constraint set this block writes into.
    fn name(&self) -> &str;

    /// Add this block's constraints for `nodes` to `model`.
    fn create(
        &mut self,
        model: &mut Model,
        es: &EnergySystem,
        nodes: &[NodeIndex],
    ) -> ModelResult<()>;
}

/// Labels of the components at the far end of `neighbours`.
fn labels<'a>(es: &'a EnergySystem, neighbours: Vec<(NodeIndex, &'a Flow)>) -> Vec<&'a str> {
    neighbours.into_iter().map(|(n, _)| es.label(n)).collect()
}

type BlockFactory = Arc<dyn Fn(&GroupKey) -> Box<dyn ConstraintBlock> + Send + Sync>;

/// Group key → block factory.
#[derive(Clone, Default)]
pub struct BlockRegistry {
    factories: IndexMap<GroupKey, BlockFactory>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in bus, transformer and storage blocks.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(GroupKey::BusBalance, |key| Box::new(BusBalance::named(key.name())));
        registry.register(GroupKey::LinearRelation, |key| {
            Box::new(LinearRelation::named(key.name()))
        });
        registry.register(GroupKey::StorageBalance, |key| {
            Box::new(StorageBalance::named(key.name()))
        });
        registry
    }

    /// Register (or replace) the factory for `key`.
    pub fn register<F>(&mut self, key: GroupKey, factory: F)
    where
        F: Fn(&GroupKey) -> Box<dyn ConstraintBlock> + Send + Sync + 'static,
    {
        self.factories.insert(key, Arc::new(factory));
    }

    pub fn contains(&self, key: &GroupKey) -> bool {
        self.factories.contains_key(key)
    }

    /// Instantiate the block registered for `key`.
    pub fn create(&self, key: &GroupKey) -> Option<Box<dyn ConstraintBlock>> {
        self.factories.get(key).map(|factory| factory(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.factories.keys()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for BlockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockRegistry")
            .field("keys", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
