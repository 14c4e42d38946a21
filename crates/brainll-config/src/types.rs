// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `brainll_configuration.toml`. Every section
//! is `#[serde(default)]`, so a file only needs the keys it changes.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BrainllConfig {
    pub simulation: SimulationConfig,
    pub network: NetworkSection,
    pub stdp: StdpConfig,
    pub homeostasis: HomeostasisSection,
    pub logging: LoggingConfig,
    pub persistence: PersistenceConfig,
}

/// Which simulator drives the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationMode {
    /// Fixed-timestep `NetworkSimulator`
    Fixed,
    /// Priority-queue `EventDrivenSimulator`
    Event,
}

impl SimulationMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fixed" | "fixed_step" | "timestep" => Some(Self::Fixed),
            "event" | "event_driven" => Some(Self::Event),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Simulator settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Step size in ms
    pub timestep: f64,
    pub random_seed: u64,
    pub plasticity_enabled: bool,
    pub homeostasis_enabled: bool,
    /// `fixed` or `event`
    pub mode: String,
    /// Upper bound for `run_until`
    pub max_steps: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timestep: 0.1,
            random_seed: 42,
            plasticity_enabled: true,
            homeostasis_enabled: false,
            mode: "fixed".to_string(),
            max_steps: 10_000,
        }
    }
}

impl SimulationConfig {
    /// Parsed `mode`; `None` if unrecognised
    pub fn simulation_mode(&self) -> Option<SimulationMode> {
        SimulationMode::parse(&self.mode)
    }
}

/// Defaults for neurons and connections created by the network builder
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkSection {
    /// Model name for neurons created without an explicit model
    pub default_model: String,
    pub default_weight: f64,
    /// Connection delay in ms
    pub default_delay: f64,
    pub weight_min: f64,
    pub weight_max: f64,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            default_model: "LIF".to_string(),
            default_weight: 1.0,
            default_delay: 1.0,
            weight_min: 0.0,
            weight_max: 10.0,
        }
    }
}

/// Pair-based STDP constants shared by every new connection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StdpConfig {
    pub tau_pre: f64,
    pub tau_post: f64,
    pub a_plus: f64,
    pub a_minus: f64,
    /// Pairs further apart than this (ms) do not change the weight
    pub window: f64,
    pub learning_rate: f64,
    /// Learn from decaying spike traces instead of spike-time pairs
    pub traces: bool,
}

impl Default for StdpConfig {
    fn default() -> Self {
        Self {
            tau_pre: 20.0,
            tau_post: 20.0,
            a_plus: 0.01,
            a_minus: 0.012,
            window: 100.0,
            learning_rate: 0.01,
            traces: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HomeostasisSection {
    /// Hz
    pub target_rate: f64,
    pub adaptation_rate: f64,
    /// Rate estimation window (ms)
    pub time_window: f64,
    pub scaling_factor: f64,
    pub max_threshold_shift: f64,
    /// `synaptic_scaling` or `intrinsic_plasticity`
    pub mode: String,
}

impl Default for HomeostasisSection {
    fn default() -> Self {
        Self {
            target_rate: 10.0,
            adaptation_rate: 0.01,
            time_window: 1000.0,
            scaling_factor: 0.1,
            max_threshold_shift: 10.0,
            mode: "synaptic_scaling".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Crates logged at debug level regardless of `level`
    pub debug_crates: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            debug_crates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// `json` or `binary`
    pub format: String,
    pub data_dir: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            data_dir: PathBuf::from("data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BrainllConfig::default();
        assert_eq!(config.simulation.timestep, 0.1);
        assert_eq!(config.simulation.max_steps, 10_000);
        assert_eq!(config.simulation.simulation_mode(), Some(SimulationMode::Fixed));
        assert_eq!(config.stdp.a_minus, 0.012);
        assert_eq!(config.homeostasis.target_rate, 10.0);
        assert_eq!(config.persistence.format, "json");
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: BrainllConfig = toml::from_str(
            r#"
            [simulation]
            mode = "event"

            [stdp]
            a_plus = 0.02
            "#,
        )
        .unwrap();
        assert_eq!(config.simulation.simulation_mode(), Some(SimulationMode::Event));
        assert_eq!(config.simulation.timestep, 0.1);
        assert_eq!(config.stdp.a_plus, 0.02);
        assert_eq!(config.stdp.tau_pre, 20.0);
        assert!(!config.stdp.traces);
        assert_eq!(config.network, NetworkSection::default());
    }

    #[test]
    fn test_mode_aliases() {
        assert_eq!(SimulationMode::parse("Event_Driven"), Some(SimulationMode::Event));
        assert_eq!(SimulationMode::parse(" fixed "), Some(SimulationMode::Fixed));
        assert_eq!(SimulationMode::parse("hybrid"), None);
    }
}
