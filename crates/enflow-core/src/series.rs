//! Time-dependent attribute values.
//!
//! Flow bounds, candidate values and costs are either constant over the
//! horizon, given per timestep (shared by every period), or given per period
//! and timestep. Model builders look values up with [`Series::at`] after
//! checking the declared shape against the horizon with [`Series::check`].

use serde::{Deserialize, Serialize};

/// Expected and actual length of a mis-sized attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub expected: usize,
    pub found: usize,
}

/// A value indexed by `(period, timestep)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Series<T> {
    /// Same value for every period and timestep
    Constant(T),
    /// One value per timestep, repeated in every period
    Timesteps(Vec<T>),
    /// Outer index is the period, inner index the timestep
    Periods(Vec<Vec<T>>),
}

impl<T> Series<T> {
    /// Value at `(period, timestep)`, or `None` when out of range.
    pub fn at(&self, period: usize, timestep: usize) -> Option<&T> {
        match self {
            Series::Constant(v) => Some(v),
            Series::Timesteps(values) => values.get(timestep),
            Series::Periods(values) => values.get(period).and_then(|row| row.get(timestep)),
        }
    }

    /// Verify the series covers exactly `periods` x `timesteps`.
    pub fn check(&self, periods: usize, timesteps: usize) -> Result<(), ShapeMismatch> {
        match self {
            Series::Constant(_) => Ok(()),
            Series::Timesteps(values) if values.len() == timesteps => Ok(()),
            Series::Timesteps(values) => Err(ShapeMismatch {
                expected: timesteps,
                found: values.len(),
            }),
            Series::Periods(rows) => {
                if rows.len() != periods {
                    return Err(ShapeMismatch {
                        expected: periods,
                        found: rows.len(),
                    });
                }
                match rows.iter().find(|row| row.len() != timesteps) {
                    Some(row) => Err(ShapeMismatch {
                        expected: timesteps,
                        found: row.len(),
                    }),
                    None => Ok(()),
                }
            }
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Series::Constant(_))
    }
}

impl<T: Default> Default for Series<T> {
    fn default() -> Self {
        Series::Constant(T::default())
    }
}

impl From<f64> for Series<f64> {
    fn from(value: f64) -> Self {
        Series::Constant(value)
    }
}

impl From<Vec<f64>> for Series<f64> {
    fn from(values: Vec<f64>) -> Self {
        Series::Timesteps(values)
    }
}

impl From<Vec<Vec<f64>>> for Series<f64> {
    fn from(values: Vec<Vec<f64>>) -> Self {
        Series::Periods(values)
    }
}

impl From<Vec<Option<f64>>> for Series<Option<f64>> {
    fn from(values: Vec<Option<f64>>) -> Self {
        Series::Timesteps(values)
    }
}

/// Actual values given without gaps are lifted to `Some`.
impl From<Vec<f64>> for Series<Option<f64>> {
    fn from(values: Vec<f64>) -> Self {
        Series::Timesteps(values.into_iter().map(Some).collect())
    }
}

impl From<Vec<Vec<f64>>> for Series<Option<f64>> {
    fn from(values: Vec<Vec<f64>>) -> Self {
        Series::Periods(
            values
                .into_iter()
                .map(|row| row.into_iter().map(Some).collect())
                .collect(),
        )
    }
}

/// A scalar that may differ per period (capacities, investment limits).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerPeriod {
    Uniform(f64),
    Periods(Vec<f64>),
}

impl PerPeriod {
    pub fn at(&self, period: usize) -> Option<f64> {
        match self {
            PerPeriod::Uniform(v) => Some(*v),
            PerPeriod::Periods(values) => values.get(period).copied(),
        }
    }

    pub fn check(&self, periods: usize) -> Result<(), ShapeMismatch> {
        match self {
            PerPeriod::Periods(values) if values.len() != periods => Err(ShapeMismatch {
                expected: periods,
                found: values.len(),
            }),
            _ => Ok(()),
        }
    }
}

impl From<f64> for PerPeriod {
    fn from(value: f64) -> Self {
        PerPeriod::Uniform(value)
    }
}

impl From<Vec<f64>> for PerPeriod {
    fn from(values: Vec<f64>) -> Self {
        PerPeriod::Periods(values)
    }
}
