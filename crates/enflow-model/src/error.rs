//! Model build errors.
//!
//! Every failure is reported synchronously to the caller of the builder.
//! There is no rollback: a failed build is abandoned as a whole.

use crate::sets::FlowKey;
use enflow_core::EnflowError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    /// A fixed flow lacks the value it should be pinned to
    #[error("Flow {flow} is fixed but has no actual value at period {period}, timestep {timestep}")]
    MissingActualValue {
        flow: FlowKey,
        period: usize,
        timestep: usize,
    },

    /// A time/period-indexed attribute does not match the horizon
    #[error("Attribute '{attribute}' of flow {flow} has {found} entries, expected {expected}")]
    DimensionMismatch {
        flow: FlowKey,
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    #[error(
        "Flow {flow} has lower bound {lower} above upper bound {upper} \
         at period {period}, timestep {timestep}"
    )]
    InconsistentBounds {
        flow: FlowKey,
        period: usize,
        timestep: usize,
        lower: f64,
        upper: f64,
    },

    #[error("Energy system has an empty time index")]
    EmptyHorizon,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Transformer '{transformer}' has no conversion factor for output '{output}'")]
    MissingConversionFactor { transformer: String, output: String },

    #[error("Flow {0} sets 'summed' but has neither a nominal value nor an investment")]
    SummedWithoutCapacity(FlowKey),

    /// A constraint block could not be created for its members
    #[error("Constraint block '{block}' failed: {message}")]
    Block { block: String, message: String },

    #[error("Solver error: {0}")]
    Solver(String),

    #[error(transparent)]
    Core(#[from] EnflowError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    pub(crate) fn block(block: &str, message: impl Into<String>) -> Self {
        ModelError::Block {
            block: block.to_string(),
            message: message.into(),
        }
    }
}
