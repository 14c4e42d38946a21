// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Izhikevich Neuron Model
//!
//! ```text
//! dv/dt = 0.04v² + 5v + 140 - u + I
//! du/dt = a(bv - u)
//!
//! if v ≥ peak: v = c, u = u + d
//! ```
//!
//! Both derivatives are evaluated on the pre-step state and applied with forward
//! Euler. The spike peak is the neuron's `threshold` parameter (30 mV by default,
//! 25 mV for the fast-spiking variant).
//!
//! The `Izhikevich`, `RegularSpiking` and `FastSpiking` kinds share this
//! implementation and differ only in their default parameters. Named firing
//! patterns are available through [`IzhikevichPreset`].

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::kind::NeuronModelKind;
use super::params::NeuronParameters;
use super::traits::{ModelState, NeuronModel};

/// Largest step used when relaxing between events
const RELAX_SUBSTEP: f64 = 0.5;

/// Canonical Izhikevich firing patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IzhikevichPreset {
    RegularSpiking,
    FastSpiking,
    Chattering,
    IntrinsicallyBursting,
    LowThresholdSpiking,
    Resonator,
}

impl IzhikevichPreset {
    /// Look a preset up by name, falling back to regular spiking
    pub fn from_name(name: &str) -> Self {
        match name {
            "regular_spiking" | "RS" => Self::RegularSpiking,
            "fast_spiking" | "FS" => Self::FastSpiking,
            "chattering" | "CH" => Self::Chattering,
            "intrinsically_bursting" | "bursting" | "IB" => Self::IntrinsicallyBursting,
            "low_threshold_spiking" | "LTS" => Self::LowThresholdSpiking,
            "resonator" | "RZ" => Self::Resonator,
            other => {
                tracing::debug!(
                    "[NEURON] Unknown Izhikevich preset '{}', using regular_spiking",
                    other
                );
                Self::RegularSpiking
            }
        }
    }

    /// `(a, b, c, d)`
    pub fn coefficients(self) -> (f64, f64, f64, f64) {
        match self {
            Self::RegularSpiking => (0.02, 0.2, -65.0, 8.0),
            Self::FastSpiking => (0.1, 0.2, -65.0, 2.0),
            Self::Chattering => (0.02, 0.2, -50.0, 2.0),
            Self::IntrinsicallyBursting => (0.02, 0.2, -55.0, 4.0),
            Self::LowThresholdSpiking => (0.02, 0.25, -65.0, 2.0),
            Self::Resonator => (0.1, 0.26, -65.0, 2.0),
        }
    }

    /// Write the preset's coefficients into `params`
    pub fn apply(self, params: &mut NeuronParameters) {
        let (a, b, c, d) = self.coefficients();
        params.a = a;
        params.b = b;
        params.c = c;
        params.d = d;
    }
}

#[derive(Debug, Clone)]
pub struct IzhikevichModel {
    kind: NeuronModelKind,
    /// Recovery variable `u`
    recovery: f64,
}

impl IzhikevichModel {
    pub fn new(kind: NeuronModelKind, params: &NeuronParameters) -> Self {
        Self {
            kind,
            recovery: params.b * params.c,
        }
    }

    pub fn recovery(&self) -> f64 {
        self.recovery
    }

    #[inline]
    fn euler(&mut self, v: f64, current: f64, params: &NeuronParameters, dt: f64) -> f64 {
        let u = self.recovery;
        let dv = 0.04 * v * v + 5.0 * v + 140.0 - u + current;
        let du = params.a * (params.b * v - u);
        self.recovery = u + du * dt;
        v + dv * dt
    }
}

impl NeuronModel for IzhikevichModel {
    fn kind(&self) -> NeuronModelKind {
        self.kind
    }

    fn integrate(
        &mut self,
        potential: f64,
        inputs: &[f64],
        params: &NeuronParameters,
        dt: f64,
        _rng: &mut StdRng,
    ) -> Option<f64> {
        let current: f64 = inputs.iter().sum();
        Some(self.euler(potential, current, params, dt))
    }

    fn relax(&mut self, potential: f64, elapsed: f64, params: &NeuronParameters) -> f64 {
        let mut v = potential;
        let mut remaining = elapsed;
        while remaining > 0.0 {
            let step = remaining.min(RELAX_SUBSTEP);
            v = self.euler(v, 0.0, params, step);
            // A free-running trajectory that reaches the peak is left there for the
            // caller's threshold test
            if v >= params.threshold {
                break;
            }
            remaining -= step;
        }
        v
    }

    #[inline]
    fn should_fire(&self, potential: f64, params: &NeuronParameters) -> bool {
        potential >= params.threshold
    }

    fn reset_after_fire(&mut self, _potential: f64, params: &NeuronParameters) -> f64 {
        self.recovery += params.d;
        params.c
    }

    fn initial_potential(&self, params: &NeuronParameters) -> f64 {
        params.c
    }

    fn reset_state(&mut self, params: &NeuronParameters) {
        self.recovery = params.b * params.c;
    }

    fn export_state(&self) -> ModelState {
        ModelState {
            recovery_variable: self.recovery,
            ..ModelState::default()
        }
    }

    fn import_state(&mut self, state: &ModelState) {
        self.recovery = state.recovery_variable;
    }

    fn box_clone(&self) -> Box<dyn NeuronModel> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn regular() -> (IzhikevichModel, NeuronParameters) {
        let params = NeuronParameters::for_model(NeuronModelKind::Izhikevich);
        (IzhikevichModel::new(NeuronModelKind::Izhikevich, &params), params)
    }

    #[test]
    fn test_initial_state() {
        let (model, params) = regular();
        assert_eq!(model.initial_potential(&params), -65.0);
        assert!((model.recovery() - (-13.0)).abs() < 1e-12);
    }

    #[test]
    fn test_euler_uses_pre_step_values() {
        let (mut model, params) = regular();
        let mut rng = StdRng::seed_from_u64(1);
        let v0 = -65.0;
        let u0 = model.recovery();
        let v = model.integrate(v0, &[10.0], &params, 0.5, &mut rng).unwrap();

        let dv = 0.04 * v0 * v0 + 5.0 * v0 + 140.0 - u0 + 10.0;
        let du = 0.02 * (0.2 * v0 - u0);
        assert!((v - (v0 + dv * 0.5)).abs() < 1e-12);
        assert!((model.recovery() - (u0 + du * 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_reset_law_is_exact() {
        let (mut model, params) = regular();
        let u_prev = model.recovery();
        let v = model.reset_after_fire(31.2, &params);
        assert_eq!(v, params.c);
        assert_eq!(model.recovery(), u_prev + params.d);
    }

    #[test]
    fn test_tonic_drive_produces_spikes() {
        let (mut model, params) = regular();
        let mut rng = StdRng::seed_from_u64(1);
        let mut v = model.initial_potential(&params);
        let mut spikes = 0;
        for _ in 0..400 {
            v = model.integrate(v, &[10.0], &params, 0.5, &mut rng).unwrap();
            if model.should_fire(v, &params) {
                spikes += 1;
                v = model.reset_after_fire(v, &params);
            }
        }
        assert!(spikes > 0);
    }

    #[test]
    fn test_fast_spiking_peak() {
        let params = NeuronParameters::for_model(NeuronModelKind::FastSpiking);
        let model = IzhikevichModel::new(NeuronModelKind::FastSpiking, &params);
        assert!(model.should_fire(25.0, &params));
        assert!(!model.should_fire(24.9, &params));
    }

    #[test]
    fn test_presets() {
        let mut params = NeuronParameters::default();
        IzhikevichPreset::from_name("chattering").apply(&mut params);
        assert_eq!((params.c, params.d), (-50.0, 2.0));

        IzhikevichPreset::from_name("resonator").apply(&mut params);
        assert_eq!((params.a, params.b, params.d), (0.1, 0.26, 2.0));

        assert_eq!(
            IzhikevichPreset::from_name("thalamo_cortical"),
            IzhikevichPreset::RegularSpiking
        );
    }

    #[test]
    fn test_state_round_trip() {
        let (mut model, params) = regular();
        model.reset_after_fire(30.0, &params);
        let state = model.export_state();

        let (mut other, _) = regular();
        other.import_state(&state);
        assert_eq!(other.recovery(), model.recovery());
    }
}
