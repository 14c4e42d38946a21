// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Neuron parameters and string-keyed overrides
//!
//! Every model reads from the same [`NeuronParameters`] block; fields a model does
//! not use are simply ignored by it. Per-model defaults come from
//! [`NeuronParameters::for_model`] and callers override individual values through a
//! [`ParameterMap`].

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use super::kind::NeuronModelKind;
use super::traits::ModelParameters;

/// String-keyed parameter overrides (`"threshold" -> -55.0`, ...)
pub type ParameterMap = AHashMap<String, f64>;

/// Parameter names accepted by [`NeuronParameters::set`]
pub const PARAMETER_NAMES: &[&str] = &[
    "threshold",
    "reset_potential",
    "resting_potential",
    "membrane_capacitance",
    "membrane_resistance",
    "refractory_period",
    "a",
    "b",
    "c",
    "d",
    "adaptation_strength",
    "adaptation_time_constant",
    "noise_variance",
    "hidden_size",
    "forget_bias",
    "dropout",
    "attention_heads",
    "key_dim",
    "input_weight",
    "recurrent_weight",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronParameters {
    pub threshold: f64,
    pub reset_potential: f64,
    pub resting_potential: f64,
    pub membrane_capacitance: f64,
    pub membrane_resistance: f64,
    /// Milliseconds after a spike during which input is ignored
    pub refractory_period: f64,

    // Izhikevich
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,

    pub adaptation_strength: f64,
    pub adaptation_time_constant: f64,
    /// Variance of the per-step Gaussian membrane noise (0 disables noise)
    pub noise_variance: f64,

    // Recurrent cells
    pub hidden_size: usize,
    pub forget_bias: f64,
    pub dropout: f64,
    pub attention_heads: usize,
    pub key_dim: f64,
    /// Gain on the summed input before the gate nonlinearities
    pub input_weight: f64,
    /// Gain on the previous hidden value inside the gates
    pub recurrent_weight: f64,
}

impl Default for NeuronParameters {
    fn default() -> Self {
        Self {
            threshold: -50.0,
            reset_potential: -70.0,
            resting_potential: -70.0,
            membrane_capacitance: 1.0,
            membrane_resistance: 10.0,
            refractory_period: 2.0,
            a: 0.02,
            b: 0.2,
            c: -65.0,
            d: 8.0,
            adaptation_strength: 0.0,
            adaptation_time_constant: 100.0,
            noise_variance: 0.0,
            hidden_size: 128,
            forget_bias: 1.0,
            dropout: 0.0,
            attention_heads: 8,
            key_dim: 64.0,
            input_weight: 1.0,
            recurrent_weight: 1.0,
        }
    }
}

impl NeuronParameters {
    /// Model-specific defaults
    pub fn for_model(kind: NeuronModelKind) -> Self {
        let mut params = Self::default();
        match kind {
            NeuronModelKind::Lif => {}
            NeuronModelKind::AdaptiveLif => {
                params.adaptation_strength = 1.0;
                params.adaptation_time_constant = 100.0;
            }
            NeuronModelKind::HighResolutionLif => {
                params.threshold = -45.0;
                params.reset_potential = -70.0;
                params.resting_potential = -65.0;
                params.membrane_capacitance = 1.2;
                params.adaptation_strength = 0.03;
                params.adaptation_time_constant = 80.0;
            }
            NeuronModelKind::Izhikevich | NeuronModelKind::RegularSpiking => {
                params.threshold = 30.0;
                params.reset_potential = -65.0;
                params.resting_potential = -65.0;
            }
            NeuronModelKind::FastSpiking => {
                params.threshold = 25.0;
                params.reset_potential = -65.0;
                params.resting_potential = -65.0;
                params.a = 0.1;
                params.d = 2.0;
            }
            NeuronModelKind::Lstm => {
                params.threshold = 0.5;
                params.forget_bias = 1.0;
                params.hidden_size = 128;
            }
            NeuronModelKind::Gru => {
                params.threshold = 0.5;
                params.hidden_size = 128;
            }
            NeuronModelKind::Transformer => {
                params.threshold = 0.5;
                params.attention_heads = 8;
                params.key_dim = 64.0;
            }
            NeuronModelKind::MemoryCell => {
                params.threshold = 0.5;
                params.forget_bias = 1.0;
                params.hidden_size = 256;
                params.dropout = 0.1;
            }
            NeuronModelKind::AttentionUnit => {
                params.threshold = 0.5;
                params.attention_heads = 12;
                params.key_dim = 64.0;
                params.dropout = 0.1;
            }
            NeuronModelKind::ExecutiveController => {
                params.threshold = 0.3;
                params.hidden_size = 128;
                params.dropout = 0.05;
            }
        }
        params
    }

    /// Set one parameter by name. Returns `false` for unknown names.
    ///
    /// `izhikevich_a` .. `izhikevich_d` are accepted as aliases of `a` .. `d`.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match name {
            "threshold" => self.threshold = value,
            "reset_potential" => self.reset_potential = value,
            "resting_potential" => self.resting_potential = value,
            "membrane_capacitance" => self.membrane_capacitance = value,
            "membrane_resistance" => self.membrane_resistance = value,
            "refractory_period" => self.refractory_period = value,
            "a" | "izhikevich_a" => self.a = value,
            "b" | "izhikevich_b" => self.b = value,
            "c" | "izhikevich_c" => self.c = value,
            "d" | "izhikevich_d" => self.d = value,
            "adaptation_strength" => self.adaptation_strength = value,
            "adaptation_time_constant" => self.adaptation_time_constant = value,
            "noise_variance" => self.noise_variance = value,
            "hidden_size" => self.hidden_size = value.max(0.0) as usize,
            "forget_bias" => self.forget_bias = value,
            "dropout" => self.dropout = value,
            "attention_heads" => self.attention_heads = value.max(0.0) as usize,
            "key_dim" => self.key_dim = value,
            "input_weight" => self.input_weight = value,
            "recurrent_weight" => self.recurrent_weight = value,
            _ => return false,
        }
        true
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "threshold" => self.threshold,
            "reset_potential" => self.reset_potential,
            "resting_potential" => self.resting_potential,
            "membrane_capacitance" => self.membrane_capacitance,
            "membrane_resistance" => self.membrane_resistance,
            "refractory_period" => self.refractory_period,
            "a" | "izhikevich_a" => self.a,
            "b" | "izhikevich_b" => self.b,
            "c" | "izhikevich_c" => self.c,
            "d" | "izhikevich_d" => self.d,
            "adaptation_strength" => self.adaptation_strength,
            "adaptation_time_constant" => self.adaptation_time_constant,
            "noise_variance" => self.noise_variance,
            "hidden_size" => self.hidden_size as f64,
            "forget_bias" => self.forget_bias,
            "dropout" => self.dropout,
            "attention_heads" => self.attention_heads as f64,
            "key_dim" => self.key_dim,
            "input_weight" => self.input_weight,
            "recurrent_weight" => self.recurrent_weight,
            _ => return None,
        };
        Some(value)
    }

    /// Apply every override in `overrides`, returning the names that were not recognised
    pub fn apply_overrides(&mut self, overrides: &ParameterMap) -> Vec<String> {
        let mut unknown = Vec::new();
        // Sorted so the result does not depend on hash order
        let mut keys: Vec<&String> = overrides.keys().collect();
        keys.sort();
        for key in keys {
            if !self.set(key, overrides[key]) {
                unknown.push(key.clone());
            }
        }
        unknown
    }

    /// All parameters as a name/value map
    pub fn to_map(&self) -> ParameterMap {
        PARAMETER_NAMES
            .iter()
            .filter_map(|name| self.get(name).map(|v| (name.to_string(), v)))
            .collect()
    }
}

impl ModelParameters for NeuronParameters {
    fn validate(&self) -> Result<(), &'static str> {
        let scalars = [
            self.threshold,
            self.reset_potential,
            self.resting_potential,
            self.membrane_capacitance,
            self.membrane_resistance,
            self.refractory_period,
            self.a,
            self.b,
            self.c,
            self.d,
            self.adaptation_strength,
            self.adaptation_time_constant,
            self.noise_variance,
            self.forget_bias,
            self.dropout,
            self.key_dim,
            self.input_weight,
            self.recurrent_weight,
        ];
        if scalars.iter().any(|v| !v.is_finite()) {
            return Err("Neuron parameters must be finite");
        }
        if self.membrane_capacitance <= 0.0 {
            return Err("Membrane capacitance must be positive");
        }
        if self.membrane_resistance <= 0.0 {
            return Err("Membrane resistance must be positive");
        }
        if self.refractory_period < 0.0 {
            return Err("Refractory period must be non-negative");
        }
        if self.adaptation_time_constant <= 0.0 {
            return Err("Adaptation time constant must be positive");
        }
        if self.noise_variance < 0.0 {
            return Err("Noise variance must be non-negative");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err("Dropout must be in [0, 1)");
        }
        if self.hidden_size == 0 {
            return Err("Hidden size must be at least 1");
        }
        if self.attention_heads == 0 {
            return Err("Attention heads must be at least 1");
        }
        if self.key_dim <= 0.0 {
            return Err("Key dimension must be positive");
        }
        Ok(())
    }

    fn parameter_count() -> usize {
        PARAMETER_NAMES.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_model_default_is_valid() {
        for kind in NeuronModelKind::ALL {
            assert!(NeuronParameters::for_model(kind).validate().is_ok(), "{}", kind);
        }
    }

    #[test]
    fn test_high_resolution_defaults() {
        let params = NeuronParameters::for_model(NeuronModelKind::HighResolutionLif);
        assert_eq!(params.threshold, -45.0);
        assert_eq!(params.resting_potential, -65.0);
        assert_eq!(params.membrane_capacitance, 1.2);
        assert_eq!(params.adaptation_time_constant, 80.0);
    }

    #[test]
    fn test_fast_spiking_defaults() {
        let params = NeuronParameters::for_model(NeuronModelKind::FastSpiking);
        assert_eq!(params.a, 0.1);
        assert_eq!(params.d, 2.0);
    }

    #[test]
    fn test_overrides_report_unknown_keys() {
        let mut params = NeuronParameters::default();
        let mut overrides = ParameterMap::new();
        overrides.insert("threshold".to_string(), -40.0);
        overrides.insert("izhikevich_d".to_string(), 4.0);
        overrides.insert("spine_density".to_string(), 3.0);

        let unknown = params.apply_overrides(&overrides);

        assert_eq!(params.threshold, -40.0);
        assert_eq!(params.d, 4.0);
        assert_eq!(unknown, vec!["spine_density".to_string()]);
    }

    #[test]
    fn test_validation_rejects_non_physical_values() {
        let mut params = NeuronParameters::default();
        params.membrane_capacitance = 0.0;
        assert!(params.validate().is_err());

        let mut params = NeuronParameters::default();
        params.refractory_period = -1.0;
        assert!(params.validate().is_err());

        let mut params = NeuronParameters::default();
        params.dropout = 1.0;
        assert!(params.validate().is_err());

        let mut params = NeuronParameters::default();
        params.threshold = f64::NAN;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_to_map_covers_all_names() {
        let map = NeuronParameters::default().to_map();
        assert_eq!(map.len(), NeuronParameters::parameter_count());
        assert_eq!(map["membrane_resistance"], 10.0);
    }
}
