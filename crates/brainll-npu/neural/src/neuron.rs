// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The neuron container
//!
//! A [`Neuron`] owns its membrane potential, spike bookkeeping, input buffer and
//! the IDs of the connections attached to it. The connections themselves live in
//! the network arena; the neuron only keeps their IDs.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use tracing::{trace, warn};

use crate::models::{
    create_model, ModelParameters, ModelState, NeuronModel, NeuronModelKind, NeuronParameters,
    ParameterMap,
};
use crate::types::{ConnectionId, NeuralError, NeuronId, Result};

/// Last-spike time of a neuron that has never fired
pub const NO_SPIKE: f64 = -1000.0;

/// Spikes older than this (ms) are dropped from the history
pub const SPIKE_HISTORY_WINDOW: f64 = 1000.0;

#[derive(Debug, Clone)]
pub struct Neuron {
    id: NeuronId,
    alias: Option<String>,
    kind: NeuronModelKind,
    params: NeuronParameters,
    model: Box<dyn NeuronModel>,
    potential: f64,
    last_spike_time: f64,
    /// Time the state was last advanced (event-driven relaxation)
    last_update_time: f64,
    fired: bool,
    inputs: Vec<f64>,
    spike_history: VecDeque<f64>,
    incoming: Vec<ConnectionId>,
    outgoing: Vec<ConnectionId>,
    /// Self-scheduling interval of pattern-generator neurons
    input_interval: Option<f64>,
}

impl Neuron {
    /// Create a neuron with the model defaults overridden by `overrides`.
    ///
    /// Never fails: unknown keys are ignored and an override set that produces
    /// non-physical parameters is discarded in favour of the defaults. Both cases are
    /// logged.
    pub fn new(id: NeuronId, kind: NeuronModelKind, overrides: &ParameterMap) -> Self {
        let defaults = NeuronParameters::for_model(kind);
        let mut params = defaults.clone();
        let unknown = params.apply_overrides(overrides);
        if !unknown.is_empty() {
            warn!(
                "[NEURON] {} ignoring unknown parameters: {}",
                id,
                unknown.join(", ")
            );
        }
        if let Err(reason) = params.validate() {
            warn!(
                "[NEURON] {} rejected parameter overrides ({}), using {} defaults",
                id, reason, kind
            );
            params = defaults;
        }
        Self::build(id, kind, params)
    }

    /// Create a neuron from a complete parameter block
    pub fn with_parameters(
        id: NeuronId,
        kind: NeuronModelKind,
        params: NeuronParameters,
    ) -> Result<Self> {
        params
            .validate()
            .map_err(|reason| NeuralError::InvalidParameter {
                name: kind.name().to_string(),
                reason: reason.to_string(),
            })?;
        Ok(Self::build(id, kind, params))
    }

    fn build(id: NeuronId, kind: NeuronModelKind, params: NeuronParameters) -> Self {
        let model = create_model(kind, &params);
        let potential = model.initial_potential(&params);
        Self {
            id,
            alias: None,
            kind,
            params,
            model,
            potential,
            last_spike_time: NO_SPIKE,
            last_update_time: 0.0,
            fired: false,
            inputs: Vec::new(),
            spike_history: VecDeque::new(),
            incoming: Vec::new(),
            outgoing: Vec::new(),
            input_interval: None,
        }
    }

    pub fn id(&self) -> NeuronId {
        self.id
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn set_alias(&mut self, alias: Option<String>) {
        self.alias = alias;
    }

    pub fn kind(&self) -> NeuronModelKind {
        self.kind
    }

    pub fn params(&self) -> &NeuronParameters {
        &self.params
    }

    /// Change one parameter. The previous value is kept if the result is invalid.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        let mut candidate = self.params.clone();
        if !candidate.set(name, value) {
            return Err(NeuralError::UnknownParameter(name.to_string()));
        }
        candidate
            .validate()
            .map_err(|reason| NeuralError::InvalidParameter {
                name: name.to_string(),
                reason: reason.to_string(),
            })?;
        self.params = candidate;
        Ok(())
    }

    pub fn threshold(&self) -> f64 {
        self.params.threshold
    }

    /// Shift the threshold by `delta`, keeping it inside `[min, max]`
    pub fn adjust_threshold(&mut self, delta: f64, min: f64, max: f64) {
        self.params.threshold = (self.params.threshold + delta).clamp(min, max);
    }

    pub fn potential(&self) -> f64 {
        self.potential
    }

    pub fn set_potential(&mut self, potential: f64) {
        self.potential = potential;
    }

    pub fn last_spike_time(&self) -> f64 {
        self.last_spike_time
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn clear_fired(&mut self) {
        self.fired = false;
    }

    pub fn spike_history(&self) -> &VecDeque<f64> {
        &self.spike_history
    }

    pub fn incoming(&self) -> &[ConnectionId] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[ConnectionId] {
        &self.outgoing
    }

    pub fn attach_incoming(&mut self, connection: ConnectionId) {
        self.incoming.push(connection);
    }

    pub fn attach_outgoing(&mut self, connection: ConnectionId) {
        self.outgoing.push(connection);
    }

    /// Drop `connection` from both lists
    pub fn detach(&mut self, connection: ConnectionId) {
        self.incoming.retain(|c| *c != connection);
        self.outgoing.retain(|c| *c != connection);
    }

    pub fn input_interval(&self) -> Option<f64> {
        self.input_interval
    }

    pub fn set_input_interval(&mut self, interval: Option<f64>) {
        self.input_interval = interval.filter(|i| *i > 0.0);
    }

    /// Buffer input current for the next update
    pub fn add_input(&mut self, current: f64) {
        self.inputs.push(current);
    }

    /// Sum of the currently buffered input
    pub fn pending_input(&self) -> f64 {
        self.inputs.iter().sum()
    }

    pub fn is_refractory(&self, now: f64) -> bool {
        self.last_spike_time != NO_SPIKE
            && now - self.last_spike_time < self.params.refractory_period
    }

    /// Advance the neuron by one fixed step and report whether it fired.
    ///
    /// The input buffer is always drained. A refractory neuron discards it without
    /// integrating.
    pub fn update(&mut self, now: f64, dt: f64, rng: &mut StdRng) -> bool {
        self.fired = false;
        let inputs = std::mem::take(&mut self.inputs);
        self.last_update_time = now;

        if self.is_refractory(now) {
            return false;
        }

        let Some(mut potential) =
            self.model
                .integrate(self.potential, &inputs, &self.params, dt, rng)
        else {
            return false;
        };

        if self.params.noise_variance > 0.0 {
            potential += self.sample_noise(dt, rng);
        }
        self.potential = potential;

        if self.model.should_fire(self.potential, &self.params) {
            self.fire(now);
        }
        self.fired
    }

    /// Apply one delivered spike at `now` (event-driven) and report whether it fired.
    ///
    /// The potential first relaxes passively over the time since the last event.
    pub fn receive_spike(&mut self, now: f64, weight: f64, rng: &mut StdRng) -> bool {
        self.fired = false;
        let elapsed = now - self.last_update_time;
        self.potential = self.model.relax(self.potential, elapsed, &self.params);
        self.last_update_time = now;

        if self.is_refractory(now) {
            trace!("[NEURON] {} refractory at {:.3}, impulse dropped", self.id, now);
            return false;
        }

        self.potential = self
            .model
            .apply_impulse(self.potential, weight, &self.params, rng);
        if self.model.should_fire(self.potential, &self.params) {
            self.fire(now);
        }
        self.fired
    }

    /// Record a spike at `now` and apply the model's reset
    pub fn fire(&mut self, now: f64) {
        self.potential = self.model.reset_after_fire(self.potential, &self.params);
        self.last_spike_time = now;
        self.last_update_time = now;
        self.fired = true;
        self.spike_history.push_back(now);
        while let Some(&oldest) = self.spike_history.front() {
            if now - oldest > SPIKE_HISTORY_WINDOW {
                self.spike_history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Spikes per second over the `window` ms ending at `now`
    pub fn firing_rate(&self, now: f64, window: f64) -> f64 {
        if window <= 0.0 {
            return 0.0;
        }
        let count = self
            .spike_history
            .iter()
            .filter(|t| **t > now - window && **t <= now)
            .count();
        count as f64 * 1000.0 / window
    }

    /// Whether the neuron spiked within the `window` ms ending at `now`
    pub fn spiked_within(&self, now: f64, window: f64) -> bool {
        self.last_spike_time != NO_SPIKE && now - self.last_spike_time <= window
    }

    /// Back to the freshly-constructed state (connections and parameters are kept)
    pub fn reset(&mut self) {
        self.model.reset_state(&self.params);
        self.potential = self.model.initial_potential(&self.params);
        self.last_spike_time = NO_SPIKE;
        self.last_update_time = 0.0;
        self.fired = false;
        self.inputs.clear();
        self.spike_history.clear();
    }

    pub fn model_state(&self) -> ModelState {
        self.model.export_state()
    }

    /// Restore dynamic state saved with [`Neuron::model_state`]
    pub fn restore_state(&mut self, potential: f64, last_spike_time: f64, state: &ModelState) {
        self.potential = potential;
        self.last_spike_time = last_spike_time;
        self.model.import_state(state);
    }

    fn sample_noise(&self, dt: f64, rng: &mut StdRng) -> f64 {
        match Normal::new(0.0, (self.params.noise_variance * dt).sqrt()) {
            Ok(normal) => normal.sample(rng),
            Err(_) => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    fn lif(refractory: f64) -> Neuron {
        let mut overrides = ParameterMap::new();
        overrides.insert("refractory_period".to_string(), refractory);
        Neuron::new(NeuronId(1), NeuronModelKind::Lif, &overrides)
    }

    #[test]
    fn test_lif_threshold_crossing_matches_rc_curve() {
        let mut neuron = lif(0.0);
        let mut rng = rng();
        let mut fired_at = None;
        for step in 1..=20 {
            neuron.add_input(5.0);
            if neuron.update(step as f64, 1.0, &mut rng) {
                fired_at = Some(step);
                break;
            }
        }
        // V(t) = -70 + 50(1 - e^(-t/10)) reaches -50 at t = 10 ln(5/3) ≈ 5.1
        let expected = (10.0 * (5.0f64 / 3.0).ln()).ceil() as i32;
        let step = fired_at.unwrap();
        assert!((step - expected).abs() <= 1, "fired at step {}", step);
        assert_eq!(neuron.potential(), -70.0);
    }

    #[test]
    fn test_adaptive_lif_slows_under_constant_drive() {
        let mut neuron = Neuron::new(NeuronId(1), NeuronModelKind::AdaptiveLif, &ParameterMap::new());
        let mut rng = rng();
        let dt = 0.1;
        let mut spikes = Vec::new();
        for step in 0..5_000 {
            let now = step as f64 * dt;
            neuron.add_input(5.0);
            if neuron.update(now, dt, &mut rng) {
                spikes.push(now);
            }
        }

        let intervals: Vec<f64> = spikes.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(intervals.len() >= 3, "only {} spikes", spikes.len());
        let first = intervals[0];
        let last = intervals[intervals.len() - 1];
        assert!(last > 2.0 * first, "intervals {:?}", intervals);

        let early = spikes.iter().filter(|t| **t < 250.0).count();
        let late = spikes.len() - early;
        assert!(late < early);

        // Same drive without adaptation keeps a regular rhythm
        let mut plain = lif(2.0);
        let mut plain_spikes = Vec::new();
        for step in 0..5_000 {
            let now = step as f64 * dt;
            plain.add_input(5.0);
            if plain.update(now, dt, &mut rng) {
                plain_spikes.push(now);
            }
        }
        assert!(plain_spikes.len() > spikes.len());
    }

    #[test]
    fn test_input_buffer_is_drained_every_update() {
        let mut neuron = lif(0.0);
        let mut rng = rng();
        neuron.add_input(1.0);
        neuron.add_input(2.0);
        assert_eq!(neuron.pending_input(), 3.0);
        neuron.update(0.0, 1.0, &mut rng);
        assert_eq!(neuron.pending_input(), 0.0);
    }

    #[test]
    fn test_refractory_neuron_ignores_input() {
        let mut neuron = lif(5.0);
        let mut rng = rng();
        neuron.fire(10.0);

        for t in [11.0, 12.0, 14.0] {
            neuron.add_input(1000.0);
            assert!(!neuron.update(t, 1.0, &mut rng));
            assert_eq!(neuron.potential(), -70.0);
        }

        neuron.add_input(1000.0);
        assert!(neuron.update(15.0, 1.0, &mut rng));
    }

    #[test]
    fn test_fired_flag_lasts_one_step() {
        let mut neuron = lif(0.0);
        let mut rng = rng();
        neuron.add_input(100.0);
        assert!(neuron.update(0.0, 1.0, &mut rng));
        assert!(neuron.has_fired());
        neuron.update(1.0, 1.0, &mut rng);
        assert!(!neuron.has_fired());
    }

    #[test]
    fn test_invalid_overrides_fall_back_to_defaults() {
        let mut overrides = ParameterMap::new();
        overrides.insert("membrane_capacitance".to_string(), -1.0);
        let neuron = Neuron::new(NeuronId(1), NeuronModelKind::Lif, &overrides);
        assert_eq!(neuron.params(), &NeuronParameters::for_model(NeuronModelKind::Lif));
    }

    #[test]
    fn test_izhikevich_reset_law_with_noise() {
        use crate::models::IzhikevichModel;

        let mut overrides = ParameterMap::new();
        overrides.insert("noise_variance".to_string(), 4.0);
        overrides.insert("refractory_period".to_string(), 0.0);
        let mut neuron = Neuron::new(NeuronId(1), NeuronModelKind::Izhikevich, &overrides);
        let params = neuron.params().clone();
        let mut rng = rng();

        let mut t = 0.0;
        loop {
            // Replay the deterministic part of the step on a detached model
            let mut probe = IzhikevichModel::new(NeuronModelKind::Izhikevich, &params);
            probe.import_state(&neuron.model_state());
            let mut probe_rng = rng.clone();
            probe.integrate(neuron.potential(), &[15.0], &params, 0.5, &mut probe_rng);
            let u_prev = probe.recovery();

            neuron.add_input(15.0);
            if neuron.update(t, 0.5, &mut rng) {
                assert_eq!(neuron.potential(), params.c);
                assert_eq!(neuron.model_state().recovery_variable, u_prev + params.d);
                break;
            }
            t += 0.5;
            assert!(t < 500.0, "neuron never fired");
        }
    }

    #[test]
    fn test_firing_rate_and_history_window() {
        let mut neuron = lif(0.0);
        for t in [100.0, 400.0, 500.0, 1250.0] {
            neuron.fire(t);
        }
        // 100 ms is older than the history window at t = 1250
        assert_eq!(neuron.spike_history().len(), 3);
        assert_eq!(neuron.firing_rate(1250.0, 1000.0), 3.0);
        assert_eq!(neuron.firing_rate(1250.0, 100.0), 10.0);
    }

    #[test]
    fn test_receive_spike_relaxes_then_fires() {
        let mut neuron = lif(0.0);
        let mut rng = rng();
        assert!(!neuron.receive_spike(1.0, 15.0, &mut rng));
        let v = neuron.potential();
        assert_eq!(v, -55.0);

        // One membrane time constant later the excess has decayed by 1/e
        assert!(!neuron.receive_spike(11.0, 0.0, &mut rng));
        let expected = -70.0 + 15.0 * (-1.0f64).exp();
        assert!((neuron.potential() - expected).abs() < 1e-9);

        assert!(neuron.receive_spike(11.0, 20.0, &mut rng));
        assert_eq!(neuron.potential(), -70.0);
        assert_eq!(neuron.last_spike_time(), 11.0);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut neuron = Neuron::new(NeuronId(4), NeuronModelKind::AdaptiveLif, &ParameterMap::new());
        neuron.fire(5.0);
        neuron.add_input(2.0);
        neuron.reset();
        assert_eq!(neuron.last_spike_time(), NO_SPIKE);
        assert_eq!(neuron.pending_input(), 0.0);
        assert_eq!(neuron.model_state().adaptation_current, 0.0);
        assert!(neuron.spike_history().is_empty());
    }

    #[test]
    fn test_threshold_adjustment_is_bounded() {
        let mut neuron = lif(0.0);
        neuron.adjust_threshold(100.0, -60.0, -40.0);
        assert_eq!(neuron.threshold(), -40.0);
        neuron.adjust_threshold(-100.0, -60.0, -40.0);
        assert_eq!(neuron.threshold(), -60.0);
    }

    #[test]
    fn test_set_parameter_rejects_invalid_values() {
        let mut neuron = lif(0.0);
        assert!(neuron.set_parameter("membrane_resistance", 0.0).is_err());
        assert_eq!(neuron.params().membrane_resistance, 10.0);
        assert!(matches!(
            neuron.set_parameter("axon_length", 1.0),
            Err(NeuralError::UnknownParameter(_))
        ));
        assert!(neuron.set_parameter("threshold", -55.0).is_ok());
        assert_eq!(neuron.threshold(), -55.0);
    }
}
