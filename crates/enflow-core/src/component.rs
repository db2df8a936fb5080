//! Component taxonomy.
//!
//! Every node of the energy system graph is one of five closed variants.
//! Each variant carries only the data meaningful to it; the connection rules
//! (a [`Source`] has no inputs, a [`Sink`] no outputs) are enforced by
//! [`EnergySystem::connect`](crate::EnergySystem::connect).

use crate::flow::Flow;
use crate::series::PerPeriod;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Variant tag of a [`Component`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Bus,
    Source,
    Sink,
    Transformer,
    Storage,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Bus => "bus",
            ComponentKind::Source => "source",
            ComponentKind::Sink => "sink",
            ComponentKind::Transformer => "transformer",
            ComponentKind::Storage => "storage",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Balancing node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub label: String,
}

impl Bus {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub label: String,
}

impl Source {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sink {
    pub label: String,
}

impl Sink {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// Converts its inputs into outputs with fixed efficiencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformer {
    pub label: String,
    /// Efficiency per output, keyed by the label of the output's target
    pub conversion_factors: HashMap<String, f64>,
}

impl Transformer {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            conversion_factors: HashMap::new(),
        }
    }

    /// Set the efficiency relating the output towards `target` to the inputs.
    pub fn with_conversion_factor(mut self, target: impl Into<String>, factor: f64) -> Self {
        self.conversion_factors.insert(target.into(), factor);
        self
    }

    pub fn conversion_factor(&self, target: &str) -> Option<f64> {
        self.conversion_factors.get(target).copied()
    }
}

/// Direction of a storage flow relative to the storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    Input,
    Output,
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowDirection::Input => f.write_str("input"),
            FlowDirection::Output => f.write_str("output"),
        }
    }
}

/// A user-provided nominal value that a storage replaced with its derived one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NominalValueOverwrite {
    pub storage: String,
    pub direction: FlowDirection,
    pub previous: PerPeriod,
    pub derived: f64,
}

impl fmt::Display for NominalValueOverwrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nominal value of {} flow of storage '{}' overwritten with {} (was {:?})",
            self.direction, self.storage, self.derived, self.previous
        )
    }
}

/// Stateful component with a capacity, charge/discharge efficiencies and
/// self-discharge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub label: String,
    pub nominal_capacity: f64,
    pub initial_capacity: f64,
    /// Self-discharge fraction per timestep
    pub capacity_loss: f64,
    pub inflow_conversion_factor: f64,
    pub outflow_conversion_factor: f64,
    pub nominal_input_capacity_ratio: f64,
    pub nominal_output_capacity_ratio: f64,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            label: String::new(),
            nominal_capacity: 0.0,
            initial_capacity: 0.0,
            capacity_loss: 0.0,
            inflow_conversion_factor: 1.0,
            outflow_conversion_factor: 1.0,
            nominal_input_capacity_ratio: 0.2,
            nominal_output_capacity_ratio: 0.2,
        }
    }
}

impl Storage {
    pub fn new(label: impl Into<String>, nominal_capacity: f64) -> Self {
        Self {
            label: label.into(),
            nominal_capacity,
            ..Self::default()
        }
    }

    pub fn with_initial_capacity(mut self, initial: f64) -> Self {
        self.initial_capacity = initial;
        self
    }

    pub fn with_capacity_loss(mut self, loss: f64) -> Self {
        self.capacity_loss = loss;
        self
    }

    pub fn with_conversion_factors(mut self, inflow: f64, outflow: f64) -> Self {
        self.inflow_conversion_factor = inflow;
        self.outflow_conversion_factor = outflow;
        self
    }

    pub fn with_capacity_ratios(mut self, input: f64, output: f64) -> Self {
        self.nominal_input_capacity_ratio = input;
        self.nominal_output_capacity_ratio = output;
        self
    }

    /// Nominal value of flows in the given direction: `nominal_capacity * ratio`.
    pub fn derived_nominal_value(&self, direction: FlowDirection) -> f64 {
        let ratio = match direction {
            FlowDirection::Input => self.nominal_input_capacity_ratio,
            FlowDirection::Output => self.nominal_output_capacity_ratio,
        };
        self.nominal_capacity * ratio
    }

    /// Overwrite the flow's nominal value with the storage-derived one.
    ///
    /// Returns the overwrite event when the flow already carried a nominal
    /// value, so the caller can surface it.
    pub fn apply_nominal_value(
        &self,
        direction: FlowDirection,
        flow: &mut Flow,
    ) -> Option<NominalValueOverwrite> {
        let derived = self.derived_nominal_value(direction);
        flow.nominal_value
            .replace(PerPeriod::Uniform(derived))
            .map(|previous| NominalValueOverwrite {
                storage: self.label.clone(),
                direction,
                previous,
                derived,
            })
    }
}

/// A node of the energy system graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Component {
    Bus(Bus),
    Source(Source),
    Sink(Sink),
    Transformer(Transformer),
    Storage(Storage),
}

impl Component {
    pub fn label(&self) -> &str {
        match self {
            Component::Bus(b) => &b.label,
            Component::Source(s) => &s.label,
            Component::Sink(s) => &s.label,
            Component::Transformer(t) => &t.label,
            Component::Storage(s) => &s.label,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Bus(_) => ComponentKind::Bus,
            Component::Source(_) => ComponentKind::Source,
            Component::Sink(_) => ComponentKind::Sink,
            Component::Transformer(_) => ComponentKind::Transformer,
            Component::Storage(_) => ComponentKind::Storage,
        }
    }

    pub fn accepts_inputs(&self) -> bool {
        !matches!(self, Component::Source(_))
    }

    pub fn accepts_outputs(&self) -> bool {
        !matches!(self, Component::Sink(_))
    }

    pub fn as_transformer(&self) -> Option<&Transformer> {
        match self {
            Component::Transformer(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_storage(&self) -> Option<&Storage> {
        match self {
            Component::Storage(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Bus> for Component {
    fn from(b: Bus) -> Self {
        Component::Bus(b)
    }
}

impl From<Source> for Component {
    fn from(s: Source) -> Self {
        Component::Source(s)
    }
}

impl From<Sink> for Component {
    fn from(s: Sink) -> Self {
        Component::Sink(s)
    }
}

impl From<Transformer> for Component {
    fn from(t: Transformer) -> Self {
        Component::Transformer(t)
    }
}

impl From<Storage> for Component {
    fn from(s: Storage) -> Self {
        Component::Storage(s)
    }
}
