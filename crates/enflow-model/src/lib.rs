//! # enflow-model: Optimization Models from Energy Systems
//!
//! Translates an [`enflow_core::EnergySystem`] into a linear program:
//! index sets, decision variables with bounds, constraint sets contributed
//! by pluggable constraint blocks, and a cost-minimising objective.
//!
//! Two variants are built from the same system:
//!
//! - **Operational** ([`build_operational_model`]): capacities are given,
//!   one flow variable per `(flow, timestep)`.
//! - **Expansion** ([`build_expansion_model`]): flows with an
//!   [`Investment`](enflow_core::Investment) additionally get a capacity
//!   decision per period.
//!
//! Both index flow variables as `(flow, period, timestep)`; the operational
//! model has the single period `0`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use enflow_core::*;
//! use enflow_model::{build_operational_model, ModelConfig};
//!
//! let mut es = EnergySystem::new(0..3).with_groupings(Groupings::standard());
//! let el = es.add_component(Bus::new("el")).unwrap();
//! let grid = es.add_component(Source::new("grid")).unwrap();
//! let demand = es.add_component(Sink::new("demand")).unwrap();
//! es.connect(grid, el, Flow::new().with_variable_costs(25.0)).unwrap();
//! es.connect(el, demand, Flow::new().with_nominal_value(10.0).fixed(vec![0.4, 0.7, 1.0]))
//!     .unwrap();
//!
//! let model = build_operational_model(&es, &ModelConfig::default())?;
//! let solution = model.solve()?;
//! println!("cost: {}", solution.objective);
//! # Ok::<(), enflow_model::ModelError>(())
//! ```
//!
//! ## Modules
//!
//! - [`config`] - build configuration and horizon
//! - [`sets`] - index sets derived from the system
//! - [`expr`] - linear expressions and constraints
//! - [`model`] - the built model
//! - [`blocks`] - constraint block contract, registry and built-in blocks
//! - [`operational`] / [`expansion`] - the two builders

pub mod blocks;
pub mod builder;
pub mod config;
pub mod error;
pub mod expansion;
pub mod expr;
pub mod lp_file;
pub mod model;
pub mod operational;
pub mod sets;
#[cfg(feature = "solver-clarabel")]
pub mod solve;

pub use blocks::{BlockRegistry, ConstraintBlock};
pub use builder::ModelBuilder;
pub use config::{Horizon, ModelConfig};
pub use error::{ModelError, ModelResult};
pub use expansion::build_expansion_model;
pub use expr::{LinearConstraint, LinearExpr, Sense, VarId};
pub use model::{Model, ModelKind, VariableDef};
pub use operational::build_operational_model;
pub use sets::{FlowKey, ModelSets};
#[cfg(feature = "solver-clarabel")]
pub use solve::ModelSolution;
