//! Error types for energy system construction
//!
//! [`EnflowError`] covers everything that can go wrong while assembling an
//! [`EnergySystem`](crate::EnergySystem): duplicate labels, connections the
//! component taxonomy forbids, parallel flows and references to nodes that
//! are not part of the graph. Model builders wrap it in their own error type.
//!
//! # Example
//!
//! ```
//! use enflow_core::{Bus, EnergySystem, EnflowError, EnflowResult};
//!
//! fn two_buses() -> EnflowResult<EnergySystem> {
//!     let mut es = EnergySystem::new(0..3);
//!     es.add_component(Bus::new("el"))?;
//!     es.add_component(Bus::new("el"))?;
//!     Ok(es)
//! }
//!
//! assert!(matches!(two_buses(), Err(EnflowError::DuplicateLabel(_))));
//! ```

use thiserror::Error;

/// Error type for energy system operations.
#[derive(Error, Debug)]
pub enum EnflowError {
    /// Graph structure errors
    #[error("Network error: {0}")]
    Network(String),

    /// A component with the same label already exists
    #[error("Component label '{0}' is already in use")]
    DuplicateLabel(String),

    /// The component taxonomy does not allow this edge
    #[error("Cannot connect {from} -> {to}: {reason}")]
    InvalidConnection {
        from: String,
        to: String,
        reason: String,
    },

    /// There is already a flow between the two components in this direction
    #[error("A flow {from} -> {to} already exists")]
    ParallelFlow { from: String, to: String },
}

/// Convenience type alias for Results using EnflowError.
pub type EnflowResult<T> = Result<T, EnflowError>;
