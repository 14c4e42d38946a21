// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Leaky Integrate-and-Fire Family
//!
//! ## Model Dynamics
//!
//! ```text
//! LIF:
//!     dV/dt = (-(V - V_rest) / R + I) / C
//!     V(t+dt) = V(t) + dV/dt × dt                 (forward Euler)
//!     fire when V ≥ threshold, then V = V_reset
//!
//! Adaptive LIF:
//!     a(t+dt) = a(t) × exp(-dt / τ_a)
//!     dV/dt = (-(V - V_rest) / R + I - a) / C
//!     on spike: a += adaptation_strength
//!
//! High-resolution LIF:
//!     as Adaptive LIF, with
//!     C_eff = C × (1 + 0.1 × a)
//!     threshold_eff = threshold + 0.5 × a
//! ```
//!
//! The adaptation current grows with every spike and decays between them, so a
//! constant drive produces progressively longer inter-spike intervals.

use rand::rngs::StdRng;

use super::kind::NeuronModelKind;
use super::params::NeuronParameters;
use super::traits::{ModelState, NeuronModel};

#[inline]
fn total_input(inputs: &[f64]) -> f64 {
    inputs.iter().sum()
}

#[inline]
fn membrane_step(
    potential: f64,
    current: f64,
    capacitance: f64,
    params: &NeuronParameters,
    dt: f64,
) -> f64 {
    let leak = -(potential - params.resting_potential) / params.membrane_resistance;
    let dv_dt = (leak + current) / capacitance;
    potential + dv_dt * dt
}

/// Exact passive decay toward rest over `elapsed`
#[inline]
fn passive_decay(potential: f64, elapsed: f64, tau: f64, rest: f64) -> f64 {
    if elapsed <= 0.0 || tau <= 0.0 {
        return potential;
    }
    rest + (potential - rest) * (-elapsed / tau).exp()
}

/// Plain LIF neuron (no auxiliary state)
#[derive(Debug, Clone, Copy, Default)]
pub struct LifModel;

impl LifModel {
    pub fn new() -> Self {
        Self
    }
}

impl NeuronModel for LifModel {
    fn kind(&self) -> NeuronModelKind {
        NeuronModelKind::Lif
    }

    #[inline]
    fn integrate(
        &mut self,
        potential: f64,
        inputs: &[f64],
        params: &NeuronParameters,
        dt: f64,
        _rng: &mut StdRng,
    ) -> Option<f64> {
        Some(membrane_step(
            potential,
            total_input(inputs),
            params.membrane_capacitance,
            params,
            dt,
        ))
    }

    fn relax(&mut self, potential: f64, elapsed: f64, params: &NeuronParameters) -> f64 {
        let tau = params.membrane_resistance * params.membrane_capacitance;
        passive_decay(potential, elapsed, tau, params.resting_potential)
    }

    #[inline]
    fn should_fire(&self, potential: f64, params: &NeuronParameters) -> bool {
        potential >= params.threshold
    }

    fn reset_after_fire(&mut self, _potential: f64, params: &NeuronParameters) -> f64 {
        params.reset_potential
    }

    fn initial_potential(&self, params: &NeuronParameters) -> f64 {
        params.resting_potential
    }

    fn reset_state(&mut self, _params: &NeuronParameters) {}

    fn export_state(&self) -> ModelState {
        ModelState::default()
    }

    fn import_state(&mut self, _state: &ModelState) {}

    fn box_clone(&self) -> Box<dyn NeuronModel> {
        Box::new(*self)
    }
}

/// LIF with a spike-triggered adaptation current
#[derive(Debug, Clone, Default)]
pub struct AdaptiveLifModel {
    adaptation_current: f64,
}

impl AdaptiveLifModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adaptation_current(&self) -> f64 {
        self.adaptation_current
    }
}

impl NeuronModel for AdaptiveLifModel {
    fn kind(&self) -> NeuronModelKind {
        NeuronModelKind::AdaptiveLif
    }

    fn integrate(
        &mut self,
        potential: f64,
        inputs: &[f64],
        params: &NeuronParameters,
        dt: f64,
        _rng: &mut StdRng,
    ) -> Option<f64> {
        self.adaptation_current *= (-dt / params.adaptation_time_constant).exp();
        let drive = total_input(inputs) - self.adaptation_current;
        Some(membrane_step(
            potential,
            drive,
            params.membrane_capacitance,
            params,
            dt,
        ))
    }

    fn relax(&mut self, potential: f64, elapsed: f64, params: &NeuronParameters) -> f64 {
        if elapsed > 0.0 {
            self.adaptation_current *= (-elapsed / params.adaptation_time_constant).exp();
        }
        let tau = params.membrane_resistance * params.membrane_capacitance;
        passive_decay(potential, elapsed, tau, params.resting_potential)
    }

    fn should_fire(&self, potential: f64, params: &NeuronParameters) -> bool {
        potential >= params.threshold
    }

    fn reset_after_fire(&mut self, _potential: f64, params: &NeuronParameters) -> f64 {
        self.adaptation_current += params.adaptation_strength;
        params.reset_potential
    }

    fn initial_potential(&self, params: &NeuronParameters) -> f64 {
        params.resting_potential
    }

    fn reset_state(&mut self, _params: &NeuronParameters) {
        self.adaptation_current = 0.0;
    }

    fn export_state(&self) -> ModelState {
        ModelState {
            adaptation_current: self.adaptation_current,
            ..ModelState::default()
        }
    }

    fn import_state(&mut self, state: &ModelState) {
        self.adaptation_current = state.adaptation_current;
    }

    fn box_clone(&self) -> Box<dyn NeuronModel> {
        Box::new(self.clone())
    }
}

/// Adaptive LIF whose capacitance and threshold both track the adaptation current
#[derive(Debug, Clone, Default)]
pub struct HighResolutionLifModel {
    adaptation_current: f64,
}

impl HighResolutionLifModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn dynamic_threshold(&self, params: &NeuronParameters) -> f64 {
        params.threshold + self.adaptation_current * 0.5
    }
}

impl NeuronModel for HighResolutionLifModel {
    fn kind(&self) -> NeuronModelKind {
        NeuronModelKind::HighResolutionLif
    }

    fn integrate(
        &mut self,
        potential: f64,
        inputs: &[f64],
        params: &NeuronParameters,
        dt: f64,
        _rng: &mut StdRng,
    ) -> Option<f64> {
        self.adaptation_current *= (-dt / params.adaptation_time_constant).exp();
        let effective_capacitance =
            params.membrane_capacitance * (1.0 + self.adaptation_current * 0.1);
        let drive = total_input(inputs) - self.adaptation_current;
        Some(membrane_step(
            potential,
            drive,
            effective_capacitance,
            params,
            dt,
        ))
    }

    fn relax(&mut self, potential: f64, elapsed: f64, params: &NeuronParameters) -> f64 {
        if elapsed > 0.0 {
            self.adaptation_current *= (-elapsed / params.adaptation_time_constant).exp();
        }
        let tau = params.membrane_resistance
            * params.membrane_capacitance
            * (1.0 + self.adaptation_current * 0.1);
        passive_decay(potential, elapsed, tau, params.resting_potential)
    }

    fn should_fire(&self, potential: f64, params: &NeuronParameters) -> bool {
        potential >= self.dynamic_threshold(params)
    }

    fn reset_after_fire(&mut self, _potential: f64, params: &NeuronParameters) -> f64 {
        self.adaptation_current += params.adaptation_strength;
        params.reset_potential
    }

    fn initial_potential(&self, params: &NeuronParameters) -> f64 {
        params.resting_potential
    }

    fn reset_state(&mut self, _params: &NeuronParameters) {
        self.adaptation_current = 0.0;
    }

    fn export_state(&self) -> ModelState {
        ModelState {
            adaptation_current: self.adaptation_current,
            ..ModelState::default()
        }
    }

    fn import_state(&mut self, state: &ModelState) {
        self.adaptation_current = state.adaptation_current;
    }

    fn box_clone(&self) -> Box<dyn NeuronModel> {
        Box::new(self.clone())
    }
}
