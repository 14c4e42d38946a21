// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! A directed, delayed, plastic connection between two neurons
//!
//! The connection owns its weight, its learning state and the queue of spikes in
//! flight toward the target. Every weight mutation goes through one clipping path,
//! so `weight_min <= weight <= weight_max` holds after any call.

use std::collections::{BTreeMap, VecDeque};

use brainll_npu_neural::{ConnectionId, NeuronId, NO_SPIKE};
use tracing::{trace, warn};

use crate::error::{PlasticityError, Result};
use crate::kind::PlasticityRuleKind;
use crate::params::PlasticityParameters;
use crate::rules;
use crate::state::PlasticityState;

/// Everything a connection may learn from during one update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynapticSignals {
    pub now: f64,
    /// Source neuron spiked during this step
    pub pre_spiked: bool,
    /// Target neuron spiked during this step
    pub post_spiked: bool,
    /// Last spike of the source ([`NO_SPIKE`] if none)
    pub pre_spike_time: f64,
    /// Last spike of the target ([`NO_SPIKE`] if none)
    pub post_spike_time: f64,
    /// Target firing rate in Hz
    pub post_rate: f64,
    /// Network-wide reward
    pub reward: f64,
}

impl SynapticSignals {
    /// Signals with no activity at `now`
    pub fn quiet(now: f64) -> Self {
        Self {
            now,
            pre_spiked: false,
            post_spiked: false,
            pre_spike_time: NO_SPIKE,
            post_spike_time: NO_SPIKE,
            post_rate: 0.0,
            reward: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    source: NeuronId,
    target: NeuronId,
    weight: f64,
    rule: PlasticityRuleKind,
    params: PlasticityParameters,
    state: PlasticityState,
    /// Delivery times of spikes in transit, in ascending order
    in_flight: VecDeque<f64>,
    last_active_time: f64,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        source: NeuronId,
        target: NeuronId,
        weight: f64,
        rule: PlasticityRuleKind,
    ) -> Self {
        Self::with_parameters(id, source, target, weight, rule, PlasticityParameters::default())
    }

    /// Create a connection with explicit parameters.
    ///
    /// Invalid parameters are replaced by the defaults (logged).
    pub fn with_parameters(
        id: ConnectionId,
        source: NeuronId,
        target: NeuronId,
        weight: f64,
        rule: PlasticityRuleKind,
        params: PlasticityParameters,
    ) -> Self {
        let params = match params.validate() {
            Ok(()) => params,
            Err(e) => {
                warn!("[PLASTICITY] {} invalid parameters ({}), using defaults", id, e);
                PlasticityParameters::default()
            }
        };
        let state = PlasticityState::new(&params);
        let weight = if weight.is_nan() {
            params.weight_min
        } else {
            params.clip(weight)
        };
        Self {
            id,
            source,
            target,
            weight,
            rule,
            params,
            state,
            in_flight: VecDeque::new(),
            last_active_time: NO_SPIKE,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn source(&self) -> NeuronId {
        self.source
    }

    pub fn target(&self) -> NeuronId {
        self.target
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Set the weight (clipped to the bounds)
    pub fn set_weight(&mut self, weight: f64) {
        if !weight.is_nan() {
            self.weight = self.params.clip(weight);
        }
    }

    pub fn delay(&self) -> f64 {
        self.params.delay
    }

    /// Set the transmission delay (negative values become 0)
    pub fn set_delay(&mut self, delay: f64) {
        self.params.delay = if delay.is_nan() { 0.0 } else { delay.max(0.0) };
    }

    pub fn rule(&self) -> PlasticityRuleKind {
        self.rule
    }

    pub fn set_rule(&mut self, rule: PlasticityRuleKind) {
        self.rule = rule;
    }

    pub fn params(&self) -> &PlasticityParameters {
        &self.params
    }

    /// Replace the parameters and re-clip the weight to the new bounds
    pub fn set_params(&mut self, params: PlasticityParameters) -> Result<()> {
        params.validate()?;
        self.params = params;
        self.weight = self.params.clip(self.weight);
        Ok(())
    }

    pub fn last_active_time(&self) -> f64 {
        self.last_active_time
    }

    pub fn plasticity_state(&self) -> &PlasticityState {
        &self.state
    }

    pub fn restore_plasticity_state(&mut self, state: PlasticityState) {
        self.state = state;
    }

    // ---- Spike transport ----

    /// Put a spike emitted at `time` in flight; returns its delivery time
    pub fn transmit_spike(&mut self, time: f64) -> f64 {
        let delivery = time + self.params.delay;
        // Delay is constant between changes, so pushes keep the queue ordered;
        // after a delay change fall back to an ordered insert.
        match self.in_flight.back() {
            Some(&last) if last > delivery => {
                let index = self.in_flight.partition_point(|t| *t <= delivery);
                self.in_flight.insert(index, delivery);
            }
            _ => self.in_flight.push_back(delivery),
        }
        self.last_active_time = time;
        delivery
    }

    /// Remove every spike due at or before `until`; returns how many were due
    pub fn take_due(&mut self, until: f64) -> usize {
        let mut due = 0;
        while let Some(&t) = self.in_flight.front() {
            if t > until {
                break;
            }
            self.in_flight.pop_front();
            due += 1;
        }
        due
    }

    pub fn next_delivery(&self) -> Option<f64> {
        self.in_flight.front().copied()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn clear_in_flight(&mut self) {
        self.in_flight.clear();
    }

    // ---- Learning ----

    /// Run this connection's rule for one step of length `dt`; returns the applied change
    pub fn update(&mut self, signals: &SynapticSignals, dt: f64) -> f64 {
        self.state.decay_traces(dt, &self.params);
        let before_spikes = self.state.triplet_traces();
        self.state.register_spikes(signals.pre_spiked, signals.post_spiked);

        let pre = self.state.pre_trace;
        let post = self.state.post_trace;
        self.state.average_activity =
            rules::relax(self.state.average_activity, post, dt, self.params.bcm_tau);

        let applied = match self.rule {
            PlasticityRuleKind::None | PlasticityRuleKind::Custom => self.apply_delta(0.0),
            PlasticityRuleKind::Stdp | PlasticityRuleKind::VoltageDependent
                if self.params.stdp_traces =>
            {
                let delta = rules::trace_stdp(
                    before_spikes.pre_fast,
                    before_spikes.post_fast,
                    signals.pre_spiked,
                    signals.post_spiked,
                    &self.params,
                );
                self.apply_delta(delta)
            }
            PlasticityRuleKind::Stdp | PlasticityRuleKind::VoltageDependent => {
                let new_spike = signals.pre_spiked || signals.post_spiked;
                let paired = signals.pre_spike_time != NO_SPIKE
                    && signals.post_spike_time != NO_SPIKE;
                if new_spike && paired {
                    self.update_stdp_weight(signals.pre_spike_time, signals.post_spike_time)
                } else {
                    self.apply_delta(0.0)
                }
            }
            PlasticityRuleKind::TripletStdp => {
                let delta = rules::triplet_stdp(
                    &before_spikes,
                    signals.pre_spiked,
                    signals.post_spiked,
                    &self.params,
                );
                self.apply_delta(delta)
            }
            PlasticityRuleKind::Bcm => self.update_bcm_weight(pre, post, dt),
            PlasticityRuleKind::Hebbian => self.update_hebbian_weight(pre, post, dt),
            PlasticityRuleKind::AntiHebbian => self.update_anti_hebbian_weight(pre, post, dt),
            PlasticityRuleKind::Homeostatic => {
                self.update_homeostatic_weight(signals.post_rate, dt)
            }
            PlasticityRuleKind::Reinforcement => {
                self.update_reinforcement_weight(pre, post, signals.reward, dt)
            }
        };

        self.state.last_update_time = signals.now;
        if applied != 0.0 {
            trace!(
                "[PLASTICITY] {} {} Δw={:.6} -> {:.6}",
                self.id,
                self.rule,
                applied,
                self.weight
            );
        }
        applied
    }

    /// Pairwise STDP on explicit spike times
    pub fn update_stdp_weight(&mut self, pre_spike_time: f64, post_spike_time: f64) -> f64 {
        let delta = rules::pairwise_stdp(post_spike_time - pre_spike_time, &self.params);
        self.apply_delta(delta)
    }

    pub fn update_bcm_weight(&mut self, pre: f64, post: f64, dt: f64) -> f64 {
        self.state.bcm_threshold =
            rules::bcm_threshold_step(self.state.bcm_threshold, post, dt, &self.params);
        let rate = rules::bcm_rate(pre, post, self.state.bcm_threshold, &self.params);
        self.apply_delta(rate * dt)
    }

    pub fn update_hebbian_weight(&mut self, pre: f64, post: f64, dt: f64) -> f64 {
        let rate = rules::hebbian_rate(pre, post, self.weight, &self.params);
        self.apply_delta(rate * dt)
    }

    pub fn update_anti_hebbian_weight(&mut self, pre: f64, post: f64, dt: f64) -> f64 {
        let rate = rules::anti_hebbian_rate(pre, post, self.weight, &self.params);
        self.apply_delta(rate * dt)
    }

    /// Synaptic scaling from the target's firing rate (Hz)
    pub fn update_homeostatic_weight(&mut self, rate: f64, dt: f64) -> f64 {
        self.state.filtered_rate =
            rules::filter_rate(self.state.filtered_rate, rate, dt, &self.params);
        let scale = rules::scaling_factor(self.state.filtered_rate, dt, &self.params);
        let target = self.weight * scale;
        self.apply_delta(target - self.weight)
    }

    pub fn update_reinforcement_weight(&mut self, pre: f64, post: f64, reward: f64, dt: f64) -> f64 {
        self.state.eligibility_trace =
            rules::eligibility_step(self.state.eligibility_trace, pre, post, &self.params);
        let rate = rules::reinforcement_rate(
            self.state.eligibility_trace,
            reward,
            self.state.reward_baseline,
            &self.params,
        );
        self.state.reward_baseline = rules::baseline_step(self.state.reward_baseline, reward, dt);
        self.apply_delta(rate * dt)
    }

    /// Linear decay toward zero: w -= rate · w · dt
    pub fn apply_weight_decay(&mut self, rate: f64, dt: f64) -> f64 {
        self.apply_delta(-rate * self.weight * dt)
    }

    /// Multiply the weight by `factor`
    pub fn normalize_weight(&mut self, factor: f64) -> f64 {
        self.apply_delta(self.weight * factor - self.weight)
    }

    /// Clear learning state and spikes in flight (weight and parameters are kept)
    pub fn reset(&mut self) {
        self.state = PlasticityState::new(&self.params);
        self.in_flight.clear();
        self.last_active_time = NO_SPIKE;
    }

    /// Scalar learning state as a name/value map
    pub fn state(&self) -> BTreeMap<String, f64> {
        self.state.to_map()
    }

    /// Overwrite scalar learning state. Nothing is changed if any key is unknown.
    pub fn set_state(&mut self, values: &BTreeMap<String, f64>) -> Result<()> {
        if let Some(unknown) = values.keys().find(|k| self.state.value(k).is_none()) {
            return Err(PlasticityError::UnknownStateKey(unknown.clone()));
        }
        for (key, value) in values {
            self.state.set_value(key, *value)?;
        }
        Ok(())
    }

    /// The single mutation path for the weight
    fn apply_delta(&mut self, delta: f64) -> f64 {
        let old = self.weight;
        let proposed = if delta.is_finite() { old + delta } else { old };
        self.weight = self.params.clip(proposed);
        let applied = self.weight - old;
        if applied != 0.0 {
            self.state.record_change(applied);
        }
        applied
    }
}
