// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Neuron-level homeostasis
//!
//! Applied by the simulators once per step to every neuron, independently of each
//! connection's own rule:
//! - **Synaptic scaling** multiplies every incoming weight of a neuron by
//!   `clamp(1 − adaptation_rate · (rate − target) · scaling_factor, 0.5, 1.5)`
//! - **Intrinsic plasticity** shifts the neuron's threshold by
//!   `adaptation_rate · (rate − target)`, at most `max_threshold_shift` away from
//!   the model default

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::rules::homeostatic::{MAX_SCALE, MIN_SCALE};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeostasisMode {
    #[default]
    SynapticScaling,
    IntrinsicPlasticity,
}

impl HomeostasisMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "synaptic_scaling" | "scaling" => Some(Self::SynapticScaling),
            "intrinsic_plasticity" | "intrinsic" => Some(Self::IntrinsicPlasticity),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SynapticScaling => "synaptic_scaling",
            Self::IntrinsicPlasticity => "intrinsic_plasticity",
        }
    }
}

impl fmt::Display for HomeostasisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeostasisConfig {
    pub mode: HomeostasisMode,
    /// Hz
    pub target_rate: f64,
    pub adaptation_rate: f64,
    /// Rate estimation window (ms)
    pub time_window: f64,
    pub scaling_factor: f64,
    pub max_threshold_shift: f64,
}

impl Default for HomeostasisConfig {
    fn default() -> Self {
        Self {
            mode: HomeostasisMode::SynapticScaling,
            target_rate: 10.0,
            adaptation_rate: 0.01,
            time_window: 1000.0,
            scaling_factor: 0.1,
            max_threshold_shift: 10.0,
        }
    }
}

impl HomeostasisConfig {
    /// Factor applied to every incoming weight of a neuron firing at `rate`
    pub fn synaptic_scale(&self, rate: f64) -> f64 {
        let scale =
            1.0 - self.adaptation_rate * (rate - self.target_rate) * self.scaling_factor;
        scale.clamp(MIN_SCALE, MAX_SCALE)
    }

    /// Threshold change for a neuron firing at `rate`
    pub fn threshold_shift(&self, rate: f64) -> f64 {
        self.adaptation_rate * (rate - self.target_rate)
    }

    /// `[min, max]` a threshold may move within, around the model default `base`
    pub fn threshold_bounds(&self, base: f64) -> (f64, f64) {
        let span = self.max_threshold_shift.abs();
        (base - span, base + span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overactive_neuron_is_scaled_down() {
        let config = HomeostasisConfig::default();
        assert!(config.synaptic_scale(30.0) < 1.0);
        assert!(config.synaptic_scale(0.0) > 1.0);
        assert_eq!(config.synaptic_scale(config.target_rate), 1.0);
    }

    #[test]
    fn test_scale_clamped() {
        let config = HomeostasisConfig::default();
        assert_eq!(config.synaptic_scale(1e6), 0.5);
    }

    #[test]
    fn test_threshold_shift_sign() {
        let config = HomeostasisConfig::default();
        assert!(config.threshold_shift(20.0) > 0.0);
        assert!(config.threshold_shift(0.0) < 0.0);
        assert_eq!(config.threshold_bounds(-50.0), (-60.0, -40.0));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(
            HomeostasisMode::parse("Intrinsic_Plasticity"),
            Some(HomeostasisMode::IntrinsicPlasticity)
        );
        assert_eq!(HomeostasisMode::parse("metaplasticity"), None);
    }
}
