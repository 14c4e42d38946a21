// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared capability set implemented by every neuron model

use core::fmt;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::kind::NeuronModelKind;
use super::params::NeuronParameters;

/// Parameter sets that can be checked before use
pub trait ModelParameters {
    /// Reject non-physical values (non-positive capacitance, negative refractory period, ...)
    fn validate(&self) -> Result<(), &'static str>;

    /// Number of tunable scalar parameters
    fn parameter_count() -> usize;
}

/// Model-specific state exported for persistence and inspection
///
/// Fields a model does not use stay at their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    pub adaptation_current: f64,
    pub recovery_variable: f64,
    pub cell_state: Vec<f64>,
    pub hidden_state: Vec<f64>,
}

/// Update equations for one neuron model
///
/// The membrane potential itself lives in [`crate::Neuron`]; implementations own only
/// their auxiliary state (adaptation current, recovery variable, gate memories).
pub trait NeuronModel: Send + fmt::Debug {
    fn kind(&self) -> NeuronModelKind;

    fn model_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Advance the model by `dt` with the inputs buffered since the previous update.
    ///
    /// Returns the new potential, or `None` when the model leaves its state untouched
    /// for this step (recurrent cells without input).
    fn integrate(
        &mut self,
        potential: f64,
        inputs: &[f64],
        params: &NeuronParameters,
        dt: f64,
        rng: &mut StdRng,
    ) -> Option<f64>;

    /// Instantaneous effect of one delivered spike (event-driven simulation)
    fn apply_impulse(
        &mut self,
        potential: f64,
        weight: f64,
        _params: &NeuronParameters,
        _rng: &mut StdRng,
    ) -> f64 {
        potential + weight
    }

    /// Passive evolution over `elapsed` time with no input (event-driven simulation)
    fn relax(&mut self, potential: f64, _elapsed: f64, _params: &NeuronParameters) -> f64 {
        potential
    }

    fn should_fire(&self, potential: f64, params: &NeuronParameters) -> bool;

    /// Apply the model's post-spike reset and return the new potential
    fn reset_after_fire(&mut self, potential: f64, params: &NeuronParameters) -> f64;

    fn initial_potential(&self, params: &NeuronParameters) -> f64;

    /// Return auxiliary state to its freshly-constructed value
    fn reset_state(&mut self, params: &NeuronParameters);

    fn export_state(&self) -> ModelState;

    fn import_state(&mut self, state: &ModelState);

    fn box_clone(&self) -> Box<dyn NeuronModel>;
}

impl Clone for Box<dyn NeuronModel> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}
