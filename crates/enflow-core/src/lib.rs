//! # enflow-core: Energy System Data Model
//!
//! Data structures describing an energy system as a directed flow network,
//! ready to be translated into an optimization model by `enflow-model`.
//!
//! ## Design
//!
//! The system is a **directed graph** where:
//! - **Nodes** are [`Component`]s: buses, sources, sinks, transformers, storages
//! - **Edges** carry [`Flow`] descriptors (bounds, capacity, costs, investment)
//!
//! Each ordered pair of components is connected by at most one flow, so the
//! pair of labels `(source, target)` identifies a flow everywhere downstream.
//!
//! ## Quick Start
//!
//! ```
//! use enflow_core::*;
//!
//! let mut es = EnergySystem::new(["h1", "h2", "h3"]).with_groupings(Groupings::standard());
//!
//! let coal = es.add_component(Bus::new("coal")).unwrap();
//! let el = es.add_component(Bus::new("el")).unwrap();
//! let mine = es.add_component(Source::new("mine")).unwrap();
//! let pp = es
//!     .add_component(Transformer::new("pp").with_conversion_factor("el", 0.4))
//!     .unwrap();
//! let demand = es.add_component(Sink::new("demand")).unwrap();
//!
//! es.connect(mine, coal, Flow::new()).unwrap();
//! es.connect(coal, pp, Flow::new()).unwrap();
//! es.connect(pp, el, Flow::new().with_nominal_value(10.0)).unwrap();
//! es.connect(el, demand, Flow::new().with_nominal_value(10.0).fixed(vec![0.1, 0.2, 0.3]))
//!     .unwrap();
//!
//! assert_eq!(es.flows().count(), 4);
//! assert_eq!(es.groups().get(&GroupKey::BusBalance).map(<[_]>::len), Some(2));
//! ```
//!
//! ## Modules
//!
//! - [`series`] - constant, per-timestep and per-period attribute values
//! - [`flow`] - flow descriptors and investment options
//! - [`component`] - the component taxonomy
//! - [`grouping`] - ordered predicate classification into groups
//! - [`diagnostics`] - non-fatal events recorded during construction

pub mod component;
pub mod diagnostics;
pub mod energy_system;
pub mod error;
pub mod flow;
pub mod grouping;
pub mod series;

pub use component::{
    Bus, Component, ComponentKind, FlowDirection, NominalValueOverwrite, Sink, Source, Storage,
    Transformer,
};
pub use diagnostics::{DiagnosticIssue, Diagnostics};
pub use energy_system::EnergySystem;
pub use error::{EnflowError, EnflowResult};
pub use flow::{Flow, Investment};
pub use grouping::{bus_label_grouping, constraint_grouping, GroupKey, Grouping, Groupings, Groups};
pub use petgraph::graph::{EdgeIndex, NodeIndex};
pub use series::{PerPeriod, Series, ShapeMismatch};
