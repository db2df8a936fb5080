//! Model build configuration.
//!
//! [`ModelConfig`] is passed explicitly into every builder call together
//! with the energy system, so a built model is a pure function of
//! `(system snapshot, configuration)`. It can be written by hand or loaded
//! from a TOML file; unspecified keys take their defaults:
//!
//! ```toml
//! name = "district-heating"
//! periods = 2
//! time_increment = 0.25
//! fail_on_inverted_bounds = true
//! ```

use crate::error::{ModelError, ModelResult};
use enflow_core::EnergySystem;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

/// Settings shared by the operational and expansion builders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model name; defaults to the variant name
    pub name: Option<String>,
    /// Number of investment periods (the operational model always uses 1)
    pub periods: usize,
    /// Width of one timestep, used for costs and energy integration
    pub time_increment: f64,
    /// Treat `min * nominal > max * nominal` as an error instead of a warning
    pub fail_on_inverted_bounds: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: None,
            periods: 1,
            time_increment: 1.0,
            fail_on_inverted_bounds: true,
        }
    }
}

impl ModelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_periods(mut self, periods: usize) -> Self {
        self.periods = periods;
        self
    }

    pub fn with_time_increment(mut self, time_increment: f64) -> Self {
        self.time_increment = time_increment;
        self
    }

    pub fn with_fail_on_inverted_bounds(mut self, fail: bool) -> Self {
        self.fail_on_inverted_bounds = fail;
        self
    }

    /// Load configuration from a TOML file.
    pub fn load_from(path: &Path) -> ModelResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> ModelResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ModelError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.periods == 0 {
            return Err(ModelError::InvalidConfig(
                "periods must be at least 1".to_string(),
            ));
        }
        if !(self.time_increment.is_finite() && self.time_increment > 0.0) {
            return Err(ModelError::InvalidConfig(format!(
                "time_increment must be positive and finite, got {}",
                self.time_increment
            )));
        }
        Ok(())
    }
}

/// Extent of the `(period, timestep)` index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    pub timesteps: usize,
    pub periods: usize,
}

impl Horizon {
    pub fn new(timesteps: usize, periods: usize) -> Self {
        Self { timesteps, periods }
    }

    /// Horizon of `es` with the given number of periods.
    pub fn for_system(es: &EnergySystem, periods: usize) -> ModelResult<Self> {
        if es.time_idx.is_empty() {
            return Err(ModelError::EmptyHorizon);
        }
        if periods == 0 {
            return Err(ModelError::InvalidConfig(
                "periods must be at least 1".to_string(),
            ));
        }
        Ok(Self::new(es.time_idx.len(), periods))
    }

    pub fn timestep_range(&self) -> Range<usize> {
        0..self.timesteps
    }

    pub fn period_range(&self) -> Range<usize> {
        0..self.periods
    }

    /// All `(period, timestep)` pairs, periods outermost.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> {
        let timesteps = self.timesteps;
        (0..self.periods).flat_map(move |p| (0..timesteps).map(move |t| (p, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ModelConfig::default();
        assert_eq!(config.periods, 1);
        assert_eq!(config.time_increment, 1.0);
        assert!(config.fail_on_inverted_bounds);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ModelConfig::from_toml_str("periods = 3").unwrap();
        assert_eq!(config.periods, 3);
        assert_eq!(config.time_increment, 1.0);
        assert!(config.name.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            ModelConfig::from_toml_str("periods = 0"),
            Err(ModelError::InvalidConfig(_))
        ));
        assert!(ModelConfig::new().with_time_increment(-1.0).validate().is_err());
        assert!(matches!(
            ModelConfig::from_toml_str("periods = \"two\""),
            Err(ModelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"test\"\ntime_increment = 0.5").unwrap();

        let config = ModelConfig::load_from(file.path()).unwrap();
        assert_eq!(config.name.as_deref(), Some("test"));
        assert_eq!(config.time_increment, 0.5);
    }

    #[test]
    fn test_horizon_requires_time_index() {
        let es = EnergySystem::new(Vec::<String>::new());
        assert!(matches!(
            Horizon::for_system(&es, 1),
            Err(ModelError::EmptyHorizon)
        ));

        let es = EnergySystem::new(0..4);
        let horizon = Horizon::for_system(&es, 2).unwrap();
        assert_eq!(horizon.iter().count(), 8);
        assert_eq!(horizon.iter().nth(4), Some((1, 0)));
    }
}
