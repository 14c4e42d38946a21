// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-connection plasticity parameters

use serde::{Deserialize, Serialize};

use crate::error::{PlasticityError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlasticityParameters {
    /// η for the rate-based rules
    pub learning_rate: f64,

    /// Pre-synaptic trace time constant (τ+)
    pub tau_pre: f64,
    /// Post-synaptic trace time constant (τ-)
    pub tau_post: f64,
    /// Potentiation amplitude (A+)
    pub a_plus: f64,
    /// Depression amplitude (A-)
    pub a_minus: f64,
    /// Pairs further apart than this (ms) do not interact
    pub stdp_window: f64,
    /// Learn from decaying pre/post traces instead of the latest spike-time pair
    pub stdp_traces: bool,

    /// Third-spike amplitude of triplet STDP
    pub triplet_a3: f64,
    /// Time constant of the slow triplet traces
    pub tau_slow: f64,

    pub weight_min: f64,
    pub weight_max: f64,
    /// Transmission delay (ms)
    pub delay: f64,

    /// Firing rate (Hz) the homeostatic rule steers toward
    pub target_rate: f64,
    pub scaling_factor: f64,
    /// Low-pass filter time constant for the homeostatic rate estimate
    pub rate_tau: f64,

    /// Per-update eligibility decay of the reinforcement rule (γ)
    pub trace_decay: f64,

    /// Initial BCM sliding threshold (θ₀)
    pub bcm_threshold: f64,
    /// BCM threshold time constant (τθ)
    pub bcm_tau: f64,

    /// Linear weight decay for the Hebbian rules
    pub weight_decay: f64,
}

impl Default for PlasticityParameters {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            tau_pre: 20.0,
            tau_post: 20.0,
            a_plus: 0.01,
            a_minus: 0.012,
            stdp_window: 100.0,
            stdp_traces: false,
            triplet_a3: 0.005,
            tau_slow: 100.0,
            weight_min: 0.0,
            weight_max: 10.0,
            delay: 1.0,
            target_rate: 5.0,
            scaling_factor: 0.001,
            rate_tau: 100.0,
            trace_decay: 0.95,
            bcm_threshold: 1.0,
            bcm_tau: 1000.0,
            weight_decay: 0.0,
        }
    }
}

impl PlasticityParameters {
    pub fn validate(&self) -> Result<()> {
        if self.weight_min > self.weight_max {
            return Err(PlasticityError::InvalidBounds {
                min: self.weight_min,
                max: self.weight_max,
            });
        }
        let positive = [
            ("tau_pre", self.tau_pre),
            ("tau_post", self.tau_post),
            ("tau_slow", self.tau_slow),
            ("rate_tau", self.rate_tau),
            ("bcm_tau", self.bcm_tau),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(invalid(name, "must be positive"));
            }
        }
        let non_negative = [
            ("delay", self.delay),
            ("learning_rate", self.learning_rate),
            ("a_plus", self.a_plus),
            ("a_minus", self.a_minus),
            ("stdp_window", self.stdp_window),
            ("weight_decay", self.weight_decay),
        ];
        for (name, value) in non_negative {
            if value.is_nan() || value < 0.0 {
                return Err(invalid(name, "must be non-negative"));
            }
        }
        if !(0.0..=1.0).contains(&self.trace_decay) {
            return Err(invalid("trace_decay", "must be in [0, 1]"));
        }
        Ok(())
    }

    /// Clamp `weight` into the configured bounds
    #[inline]
    pub fn clip(&self, weight: f64) -> f64 {
        weight.clamp(self.weight_min, self.weight_max)
    }
}

fn invalid(name: &str, reason: &str) -> PlasticityError {
    PlasticityError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
