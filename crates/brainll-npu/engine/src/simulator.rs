// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Simulation drivers
//!
//! [`Simulator`] is the capability set shared by the fixed-timestep
//! [`NetworkSimulator`] and the event-driven simulator: attach a network, step
//! it, run it for a number of steps or until a condition holds, pause/stop it,
//! tune it through a string-keyed parameter map. State shared by both lives in
//! [`SimulationContext`].
//!
//! One fixed step at time `t`:
//! 1. every neuron integrates its buffered input over `dt`
//! 2. every neuron that fired notifies the spike callback and puts a spike in
//!    flight on each outgoing connection
//! 3. spikes due by `t + dt` are added to their target's input buffer
//! 4. plasticity runs on every connection (if enabled on both the simulator and the network)
//! 5. homeostasis runs on every neuron (if enabled)
//! 6. the clock advances to `t + dt`

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use brainll_npu_neural::{Neuron, NeuronId, NO_SPIKE, SPIKE_HISTORY_WINDOW};
use brainll_npu_plasticity::{
    Connection, HomeostasisConfig, HomeostasisMode, PlasticityParameters, SynapticSignals,
};
use tracing::{debug, info, trace, warn};

use crate::error::{Result, SimulationError};
use crate::network_core::{connection_at_mut, neuron_at, neuron_at_mut, NetworkCore};
use crate::SimulationStats;

/// Slack when comparing accumulated step times with delivery times
pub(crate) const TIME_EPSILON: f64 = 1e-9;

/// Default step bound of [`Simulator::run_until`]
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Observer called with `(neuron, time)` for every recorded spike.
///
/// Runs inside the step; it must return quickly.
pub type SpikeCallback = Box<dyn FnMut(NeuronId, f64) + Send>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SimulationState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Requests the end of a `run`/`run_until` loop from a callback or another thread.
///
/// Checked between steps, never during one.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Consume a pending request
    pub(crate) fn take(&self) -> bool {
        self.requested.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn clear(&self) {
        self.requested.store(false, Ordering::Release);
    }
}

/// State shared by every simulator
pub struct SimulationContext {
    pub(crate) network: Option<NetworkCore>,
    pub(crate) dt: f64,
    pub(crate) plasticity_enabled: bool,
    pub(crate) homeostasis_enabled: bool,
    pub(crate) homeostasis: HomeostasisConfig,
    pub(crate) state: SimulationState,
    pub(crate) stop: StopHandle,
    pub(crate) callback: Option<SpikeCallback>,
    pub(crate) stats: SimulationStats,
}

impl SimulationContext {
    pub fn new(network: Option<NetworkCore>) -> Self {
        let dt = network.as_ref().map_or(0.1, NetworkCore::timestep);
        Self {
            network,
            dt,
            plasticity_enabled: true,
            homeostasis_enabled: false,
            homeostasis: HomeostasisConfig::default(),
            state: SimulationState::Stopped,
            stop: StopHandle::default(),
            callback: None,
            stats: SimulationStats::default(),
        }
    }

    pub(crate) fn require_network(&self) -> Result<()> {
        if self.network.is_some() {
            Ok(())
        } else {
            Err(SimulationError::NoNetwork)
        }
    }

    pub(crate) fn set_timestep(&mut self, dt: f64) -> Result<()> {
        if !dt.is_finite() || dt <= 0.0 {
            warn!("[SIMULATOR] Rejected timestep {}", dt);
            return Err(SimulationError::InvalidTimestep(dt));
        }
        self.dt = dt;
        if let Some(network) = self.network.as_mut() {
            network.set_timestep(dt);
        }
        Ok(())
    }

    pub(crate) fn configure(&mut self, dt: f64, plasticity: bool, homeostasis: bool) -> Result<()> {
        self.require_network()?;
        self.set_timestep(dt)?;
        self.plasticity_enabled = plasticity;
        self.homeostasis_enabled = homeostasis;
        self.state = SimulationState::Stopped;
        self.stats = SimulationStats::default();
        self.stop.clear();
        info!(
            "[SIMULATOR] Initialized: dt={} plasticity={} homeostasis={}",
            dt, plasticity, homeostasis
        );
        Ok(())
    }

    pub(crate) fn emit_spike(&mut self, neuron: NeuronId, time: f64) {
        if let Some(callback) = self.callback.as_mut() {
            callback(neuron, time);
        }
    }

    fn set_parameter(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "dt" => self.set_timestep(parse_f64(key, value)?),
            "plasticity_enabled" => {
                self.plasticity_enabled = parse_bool(key, value)?;
                Ok(())
            }
            "homeostasis_enabled" => {
                self.homeostasis_enabled = parse_bool(key, value)?;
                Ok(())
            }
            "homeostasis_mode" => {
                self.homeostasis.mode =
                    HomeostasisMode::parse(value).ok_or_else(|| invalid(key, value))?;
                Ok(())
            }
            _ => {
                if let Some(name) = key.strip_prefix("stdp_") {
                    self.set_stdp_parameter(key, name, value)
                } else if let Some(name) = key.strip_prefix("homeostasis_") {
                    let v = parse_f64(key, value)?;
                    let mut config = self.homeostasis.clone();
                    let slot = homeostasis_field(&mut config, name)
                        .ok_or_else(|| SimulationError::UnknownParameter(key.to_string()))?;
                    *slot = v;
                    if config.time_window <= 0.0 {
                        return Err(invalid(key, value));
                    }
                    self.homeostasis = config;
                    Ok(())
                } else {
                    Err(SimulationError::UnknownParameter(key.to_string()))
                }
            }
        }
    }

    fn set_stdp_parameter(&mut self, key: &str, name: &str, value: &str) -> Result<()> {
        if stdp_field(&mut PlasticityParameters::default(), name).is_none() {
            return Err(SimulationError::UnknownParameter(key.to_string()));
        }
        let v = parse_f64(key, value)?;
        let network = self.network.as_mut().ok_or(SimulationError::NoNetwork)?;
        network
            .update_connection_parameters(|params| {
                if let Some(slot) = stdp_field(params, name) {
                    *slot = v;
                }
            })
            .map_err(|_| invalid(key, value))
    }

    fn parameters(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("dt".to_string(), self.dt.to_string());
        params.insert(
            "plasticity_enabled".to_string(),
            self.plasticity_enabled.to_string(),
        );
        params.insert(
            "homeostasis_enabled".to_string(),
            self.homeostasis_enabled.to_string(),
        );
        params.insert(
            "homeostasis_mode".to_string(),
            self.homeostasis.mode.to_string(),
        );
        let mut homeostasis = self.homeostasis.clone();
        for name in HOMEOSTASIS_FIELDS {
            if let Some(v) = homeostasis_field(&mut homeostasis, name) {
                params.insert(format!("homeostasis_{name}"), v.to_string());
            }
        }
        if let Some(network) = self.network.as_ref() {
            let mut stdp = network.config().connection_parameters.clone();
            for name in STDP_FIELDS {
                if let Some(v) = stdp_field(&mut stdp, name) {
                    params.insert(format!("stdp_{name}"), v.to_string());
                }
            }
        }
        params
    }
}

const STDP_FIELDS: [&str; 6] = [
    "tau_pre",
    "tau_post",
    "a_plus",
    "a_minus",
    "window",
    "learning_rate",
];

fn stdp_field<'a>(params: &'a mut PlasticityParameters, name: &str) -> Option<&'a mut f64> {
    let slot = match name {
        "tau_pre" => &mut params.tau_pre,
        "tau_post" => &mut params.tau_post,
        "a_plus" => &mut params.a_plus,
        "a_minus" => &mut params.a_minus,
        "window" => &mut params.stdp_window,
        "learning_rate" => &mut params.learning_rate,
        _ => return None,
    };
    Some(slot)
}

const HOMEOSTASIS_FIELDS: [&str; 5] = [
    "target_rate",
    "adaptation_rate",
    "time_window",
    "scaling_factor",
    "max_threshold_shift",
];

fn homeostasis_field<'a>(config: &'a mut HomeostasisConfig, name: &str) -> Option<&'a mut f64> {
    let slot = match name {
        "target_rate" => &mut config.target_rate,
        "adaptation_rate" => &mut config.adaptation_rate,
        "time_window" => &mut config.time_window,
        "scaling_factor" => &mut config.scaling_factor,
        "max_threshold_shift" => &mut config.max_threshold_shift,
        _ => return None,
    };
    Some(slot)
}

fn invalid(key: &str, value: &str) -> SimulationError {
    SimulationError::InvalidParameter {
        name: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_f64(key: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

/// A driver that advances a [`NetworkCore`] through time
pub trait Simulator: Send {
    fn context(&self) -> &SimulationContext;

    fn context_mut(&mut self) -> &mut SimulationContext;

    /// Advance by one step (or one event). `Ok(false)` means there was nothing to do.
    fn step(&mut self) -> Result<bool>;

    /// Return the network's dynamic state to its initial values and the clock to 0
    fn reset(&mut self);

    /// Called after the attached network changes
    fn on_network_changed(&mut self) {}

    /// Set the timestep and feature switches and clear statistics
    fn initialize(&mut self, dt: f64, plasticity: bool, homeostasis: bool) -> Result<()> {
        self.context_mut().configure(dt, plasticity, homeostasis)
    }

    fn network(&self) -> Option<&NetworkCore> {
        self.context().network.as_ref()
    }

    fn network_mut(&mut self) -> Option<&mut NetworkCore> {
        self.context_mut().network.as_mut()
    }

    /// Attach `network`, returning the previously attached one.
    ///
    /// # Panics
    ///
    /// Panics if the simulation is running.
    fn attach_network(&mut self, network: NetworkCore) -> Option<NetworkCore> {
        assert!(
            self.context().state != SimulationState::Running,
            "cannot change the network while the simulation is running"
        );
        let previous = self.context_mut().network.replace(network);
        self.on_network_changed();
        previous
    }

    /// # Panics
    ///
    /// Panics if the simulation is running.
    fn detach_network(&mut self) -> Option<NetworkCore> {
        assert!(
            self.context().state != SimulationState::Running,
            "cannot change the network while the simulation is running"
        );
        let previous = self.context_mut().network.take();
        self.on_network_changed();
        previous
    }

    fn current_time(&self) -> f64 {
        self.network().map_or(0.0, NetworkCore::current_time)
    }

    fn timestep(&self) -> f64 {
        self.context().dt
    }

    /// Rejects non-finite and non-positive values
    fn set_timestep(&mut self, dt: f64) -> Result<()> {
        self.context_mut().set_timestep(dt)
    }

    fn plasticity_enabled(&self) -> bool {
        self.context().plasticity_enabled
    }

    fn enable_plasticity(&mut self, enabled: bool) {
        self.context_mut().plasticity_enabled = enabled;
    }

    fn homeostasis_enabled(&self) -> bool {
        self.context().homeostasis_enabled
    }

    fn enable_homeostasis(&mut self, enabled: bool) {
        self.context_mut().homeostasis_enabled = enabled;
    }

    fn homeostasis_config(&self) -> &HomeostasisConfig {
        &self.context().homeostasis
    }

    fn set_homeostasis_config(&mut self, config: HomeostasisConfig) {
        self.context_mut().homeostasis = config;
    }

    fn state(&self) -> SimulationState {
        self.context().state
    }

    fn is_running(&self) -> bool {
        self.state() == SimulationState::Running
    }

    fn stop_handle(&self) -> StopHandle {
        self.context().stop.clone()
    }

    fn stop(&mut self) {
        if self.state() != SimulationState::Stopped {
            info!("[SIMULATOR] Stopped at t={:.3}", self.current_time());
        }
        self.context_mut().state = SimulationState::Stopped;
    }

    fn pause(&mut self) {
        self.context_mut().state = SimulationState::Paused;
        debug!("[SIMULATOR] Paused");
    }

    /// Leave the paused state (back to running)
    fn resume(&mut self) {
        let ctx = self.context_mut();
        if ctx.state == SimulationState::Paused {
            ctx.state = SimulationState::Running;
            debug!("[SIMULATOR] Resumed");
        }
    }

    fn register_spike_callback(&mut self, callback: SpikeCallback) {
        self.context_mut().callback = Some(callback);
    }

    fn clear_spike_callback(&mut self) {
        self.context_mut().callback = None;
    }

    fn stats(&self) -> SimulationStats {
        self.context().stats
    }

    /// Step up to `steps` times; returns how many steps ran.
    ///
    /// Ends early, without error, when the stop handle fires or a step reports
    /// nothing left to do. A failing step aborts the run.
    fn run(&mut self, steps: usize) -> Result<usize> {
        run_steps(self, &mut |_| false, steps)
    }

    /// Step until `stop_condition` holds (checked before each step) or `max_steps` ran
    fn run_until<F>(&mut self, mut stop_condition: F, max_steps: usize) -> Result<usize>
    where
        F: FnMut(&Self) -> bool,
        Self: Sized,
    {
        run_steps(self, &mut stop_condition, max_steps)
    }

    /// Apply `key = value` pairs (`dt`, `plasticity_enabled`, `homeostasis_enabled`,
    /// `stdp_*`, `homeostasis_*`). Stops at the first bad pair.
    fn set_parameters<I, K, V>(&mut self, params: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
        Self: Sized,
    {
        for (key, value) in params {
            self.context_mut()
                .set_parameter(key.as_ref(), value.as_ref())?;
        }
        Ok(())
    }

    fn parameters(&self) -> BTreeMap<String, String> {
        self.context().parameters()
    }
}

/// Shared loop of `run` and `run_until`
fn run_steps<S: Simulator + ?Sized>(
    sim: &mut S,
    stop_condition: &mut dyn FnMut(&S) -> bool,
    max_steps: usize,
) -> Result<usize> {
    sim.context().require_network()?;
    if sim.state() == SimulationState::Paused {
        return Err(SimulationError::Paused);
    }
    sim.context().stop.clear();
    sim.context_mut().state = SimulationState::Running;
    debug!("[SIMULATOR] Running up to {} steps", max_steps);

    let mut done = 0;
    let outcome = loop {
        if done >= max_steps || sim.context().stop.take() || stop_condition(&*sim) {
            break Ok(());
        }
        match sim.step() {
            Ok(true) => done += 1,
            Ok(false) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    // A callback may have stopped or paused the run
    if sim.state() == SimulationState::Running {
        sim.context_mut().state = SimulationState::Stopped;
    }
    outcome.map(|()| done)
}

/// Fixed-timestep driver
pub struct NetworkSimulator {
    context: SimulationContext,
}

impl Default for NetworkSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkSimulator {
    /// A simulator with no network attached
    pub fn new() -> Self {
        Self {
            context: SimulationContext::new(None),
        }
    }

    /// Timestep is taken from the network configuration
    pub fn with_network(network: NetworkCore) -> Self {
        Self {
            context: SimulationContext::new(Some(network)),
        }
    }
}

impl Simulator for NetworkSimulator {
    fn context(&self) -> &SimulationContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut SimulationContext {
        &mut self.context
    }

    fn step(&mut self) -> Result<bool> {
        if self.context.state == SimulationState::Paused {
            return Err(SimulationError::Paused);
        }
        let SimulationContext {
            network,
            dt,
            plasticity_enabled,
            homeostasis_enabled,
            homeostasis,
            callback,
            stats,
            ..
        } = &mut self.context;
        let network = network.as_mut().ok_or(SimulationError::NoNetwork)?;
        let started = Instant::now();
        let dt = *dt;
        let now = network.current_time();
        let learning = *plasticity_enabled && network.learning_enabled();
        let reward = network.reward();
        let (neurons, connections, rng) = network.parts_mut();

        let mut fired = Vec::new();
        for neuron in neurons.iter_mut().flatten() {
            if neuron.update(now, dt, rng) {
                fired.push(neuron.id());
            }
        }

        for &id in &fired {
            if let Some(callback) = callback.as_mut() {
                callback(id, now);
            }
            let Some(neuron) = neuron_at(neurons, id) else {
                continue;
            };
            for &cid in neuron.outgoing() {
                if let Some(connection) = connection_at_mut(connections, cid) {
                    connection.transmit_spike(now);
                }
            }
        }

        // Spikes due before the next integration are buffered for it
        let horizon = now + dt + TIME_EPSILON;
        let mut delivered = 0;
        for connection in connections.iter_mut().flatten() {
            let due = connection.take_due(horizon);
            if due == 0 {
                continue;
            }
            if let Some(target) = neuron_at_mut(neurons, connection.target()) {
                for _ in 0..due {
                    target.add_input(connection.weight());
                }
                delivered += due;
            }
        }

        if learning {
            let view: &[Option<Neuron>] = &*neurons;
            let spiked = |id: NeuronId| neuron_at(view, id).is_some_and(Neuron::has_fired);
            for connection in connections.iter_mut().flatten() {
                update_plasticity(view, connection, now, dt, reward, &spiked);
            }
        }

        if *homeostasis_enabled {
            apply_homeostasis(neurons, connections, homeostasis, now, None);
        }

        network.advance_time(now + dt);
        stats.record(fired.len(), delivered, started.elapsed());
        trace!(
            "[SIMULATOR] t={:.3} fired={} delivered={}",
            now,
            fired.len(),
            delivered
        );
        Ok(true)
    }

    fn reset(&mut self) {
        if let Some(network) = self.context.network.as_mut() {
            network.reset_state();
        }
        self.context.state = SimulationState::Stopped;
        self.context.stats = SimulationStats::default();
        self.context.stop.clear();
        info!("[SIMULATOR] Reset");
    }
}

/// Run one connection's rule with the signals its endpoints provide at `now`
pub(crate) fn update_plasticity(
    neurons: &[Option<Neuron>],
    connection: &mut Connection,
    now: f64,
    dt: f64,
    reward: f64,
    spiked: &dyn Fn(NeuronId) -> bool,
) -> f64 {
    let pre = neuron_at(neurons, connection.source());
    let post = neuron_at(neurons, connection.target());
    let signals = SynapticSignals {
        now,
        pre_spiked: spiked(connection.source()),
        post_spiked: spiked(connection.target()),
        pre_spike_time: pre.map_or(NO_SPIKE, Neuron::last_spike_time),
        post_spike_time: post.map_or(NO_SPIKE, Neuron::last_spike_time),
        post_rate: post.map_or(0.0, |n| n.firing_rate(now, SPIKE_HISTORY_WINDOW)),
        reward,
    };
    connection.update(&signals, dt)
}

/// Neuron-level homeostasis over every neuron, or over `only`
pub(crate) fn apply_homeostasis(
    neurons: &mut [Option<Neuron>],
    connections: &mut [Option<Connection>],
    config: &HomeostasisConfig,
    now: f64,
    only: Option<&[NeuronId]>,
) {
    match only {
        Some(ids) => {
            for id in ids {
                if let Some(neuron) = neuron_at_mut(neurons, *id) {
                    regulate(neuron, connections, config, now);
                }
            }
        }
        None => {
            for neuron in neurons.iter_mut().flatten() {
                regulate(neuron, connections, config, now);
            }
        }
    }
}

fn regulate(
    neuron: &mut Neuron,
    connections: &mut [Option<Connection>],
    config: &HomeostasisConfig,
    now: f64,
) {
    let rate = neuron.firing_rate(now, config.time_window);
    match config.mode {
        HomeostasisMode::SynapticScaling => {
            let scale = config.synaptic_scale(rate);
            if scale == 1.0 {
                return;
            }
            for &cid in neuron.incoming() {
                if let Some(connection) = connection_at_mut(connections, cid) {
                    connection.normalize_weight(scale);
                }
            }
        }
        HomeostasisMode::IntrinsicPlasticity => {
            let base = NetworkCore::base_threshold(neuron.kind());
            let (min, max) = config.threshold_bounds(base);
            neuron.adjust_threshold(config.threshold_shift(rate), min, max);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network_core::NetworkConfig;
    use brainll_npu_neural::{NeuronModelKind, ParameterMap};
    use brainll_npu_plasticity::PlasticityRuleKind;
    use parking_lot::Mutex;

    /// dt = 1 ms and room for strong weights
    fn network() -> NetworkCore {
        let mut config = NetworkConfig {
            timestep: 1.0,
            ..Default::default()
        };
        config.connection_parameters.weight_max = 100.0;
        NetworkCore::new(config)
    }

    fn recorder(sim: &mut impl Simulator) -> Arc<Mutex<Vec<(NeuronId, f64)>>> {
        let spikes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&spikes);
        sim.register_spike_callback(Box::new(move |id, t| sink.lock().push((id, t))));
        spikes
    }

    #[test]
    fn test_spike_travels_with_delay() {
        let mut net = network();
        let a = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        let b = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        net.add_connection(a, b, 30.0, PlasticityRuleKind::None);
        net.stimulate_neuron(a, 25.0);

        let mut sim = NetworkSimulator::with_network(net);
        let spikes = recorder(&mut sim);
        assert_eq!(sim.run(3), Ok(3));

        assert_eq!(*spikes.lock(), vec![(a, 0.0), (b, 1.0)]);
        assert_eq!(sim.stats().total_spikes, 2);
        assert_eq!(sim.stats().total_deliveries, 1);
        assert_eq!(sim.current_time(), 3.0);
        let c = sim.network().and_then(|n| n.connections().next().map(Connection::last_active_time));
        assert_eq!(c, Some(0.0));
    }

    #[test]
    fn test_longer_delay_holds_the_spike() {
        let mut net = network();
        let a = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        let b = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        let c = net.add_connection(a, b, 30.0, PlasticityRuleKind::None);
        if let Some(connection) = net.connection_mut(c) {
            connection.set_delay(4.0);
        }
        net.stimulate_neuron(a, 25.0);

        let mut sim = NetworkSimulator::with_network(net);
        let spikes = recorder(&mut sim);
        sim.run(10).unwrap();
        assert_eq!(*spikes.lock(), vec![(a, 0.0), (b, 4.0)]);
    }

    #[test]
    fn test_step_without_network_fails() {
        let mut sim = NetworkSimulator::new();
        assert_eq!(sim.step(), Err(SimulationError::NoNetwork));
        assert_eq!(sim.run(5), Err(SimulationError::NoNetwork));
        assert_eq!(sim.current_time(), 0.0);
    }

    #[test]
    #[should_panic(expected = "while the simulation is running")]
    fn test_attaching_while_running_panics() {
        let mut sim = NetworkSimulator::with_network(network());
        sim.pause();
        sim.resume();
        assert!(sim.is_running());
        sim.attach_network(network());
    }

    #[test]
    fn test_paused_simulator_does_not_step() {
        let mut sim = NetworkSimulator::with_network(network());
        sim.pause();
        assert_eq!(sim.step(), Err(SimulationError::Paused));
        assert_eq!(sim.run(1), Err(SimulationError::Paused));
        sim.stop();
        assert_eq!(sim.run(2), Ok(2));
        assert_eq!(sim.state(), SimulationState::Stopped);
    }

    #[test]
    fn test_timestep_validation() {
        let mut sim = NetworkSimulator::with_network(network());
        assert_eq!(sim.set_timestep(0.0), Err(SimulationError::InvalidTimestep(0.0)));
        assert!(sim.set_timestep(f64::NAN).is_err());
        assert!(sim.set_timestep(0.25).is_ok());
        assert_eq!(sim.timestep(), 0.25);
        assert_eq!(sim.network().map(NetworkCore::timestep), Some(0.25));
    }

    #[test]
    fn test_initialize_requires_network() {
        let mut sim = NetworkSimulator::new();
        assert_eq!(sim.initialize(0.5, true, false), Err(SimulationError::NoNetwork));
        sim.attach_network(network());
        assert!(sim.initialize(0.5, false, true).is_ok());
        assert!(!sim.plasticity_enabled());
        assert!(sim.homeostasis_enabled());
    }

    #[test]
    fn test_run_until_predicate_and_bound() {
        let mut sim = NetworkSimulator::with_network(network());
        let steps = sim.run_until(|s| s.current_time() >= 5.0, DEFAULT_MAX_STEPS);
        assert_eq!(steps, Ok(5));
        let steps = sim.run_until(|_| false, 7);
        assert_eq!(steps, Ok(7));
        assert_eq!(sim.current_time(), 12.0);
    }

    #[test]
    fn test_stop_handle_from_callback() {
        let mut net = network();
        let a = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        net.stimulate_neuron(a, 25.0);
        let mut sim = NetworkSimulator::with_network(net);
        let handle = sim.stop_handle();
        sim.register_spike_callback(Box::new(move |_, _| handle.stop()));
        assert_eq!(sim.run(100), Ok(1));
        assert_eq!(sim.state(), SimulationState::Stopped);
    }

    #[test]
    fn test_refractory_neuron_skips_input() {
        let mut params = ParameterMap::new();
        params.insert("refractory_period".to_string(), 5.0);
        let mut net = network();
        let a = net.add_neuron(NeuronModelKind::Lif, &params);
        let mut sim = NetworkSimulator::with_network(net);
        let spikes = recorder(&mut sim);
        for _ in 0..20 {
            if let Some(network) = sim.network_mut() {
                network.stimulate_neuron(a, 1000.0);
            }
            sim.step().unwrap();
        }
        let times: Vec<f64> = spikes.lock().iter().map(|(_, t)| *t).collect();
        assert_eq!(times, vec![0.0, 5.0, 10.0, 15.0]);
    }

    #[test]
    fn test_causal_pairing_potentiates() {
        let mut net = network();
        let a = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        let b = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        let c = net.add_connection(a, b, 30.0, PlasticityRuleKind::Stdp);
        net.stimulate_neuron(a, 25.0);

        let mut sim = NetworkSimulator::with_network(net);
        sim.run(2).unwrap();
        let weight = sim.network().and_then(|n| n.connection(c)).map(Connection::weight);
        let expected = 30.0 + 0.01 * (-1.0f64 / 20.0).exp();
        assert!((weight.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_network_learning_switch_freezes_weights() {
        let mut net = network();
        net.set_learning_enabled(false);
        let a = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        let b = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        let c = net.add_connection(a, b, 30.0, PlasticityRuleKind::Stdp);
        net.stimulate_neuron(a, 25.0);

        let mut sim = NetworkSimulator::with_network(net);
        sim.run(3).unwrap();
        let weight = sim.network().and_then(|n| n.connection(c)).map(Connection::weight);
        assert_eq!(weight, Some(30.0));
    }

    #[test]
    fn test_intrinsic_plasticity_lowers_threshold_of_silent_neuron() {
        let mut net = network();
        let a = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        let mut sim = NetworkSimulator::with_network(net);
        sim.enable_homeostasis(true);
        sim.set_homeostasis_config(HomeostasisConfig {
            mode: HomeostasisMode::IntrinsicPlasticity,
            ..Default::default()
        });
        sim.run(10).unwrap();
        let threshold = sim.network().and_then(|n| n.neuron(a)).map(Neuron::threshold);
        assert!((threshold.unwrap() - (-51.0)).abs() < 1e-9);

        sim.run(200).unwrap();
        let threshold = sim.network().and_then(|n| n.neuron(a)).map(Neuron::threshold);
        assert_eq!(threshold, Some(-60.0));
    }

    #[test]
    fn test_synaptic_scaling_strengthens_inputs_of_silent_neuron() {
        let mut net = NetworkCore::new(NetworkConfig {
            timestep: 1.0,
            ..Default::default()
        });
        let a = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        let b = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        let c = net.add_connection(a, b, 1.0, PlasticityRuleKind::None);
        let mut sim = NetworkSimulator::with_network(net);
        sim.enable_homeostasis(true);

        sim.run(1).unwrap();
        let weight = sim.network().and_then(|n| n.connection(c)).map(Connection::weight);
        assert!((weight.unwrap() - 1.01).abs() < 1e-12);

        sim.run(300).unwrap();
        let weight = sim.network().and_then(|n| n.connection(c)).map(Connection::weight);
        assert_eq!(weight, Some(10.0));
    }

    #[test]
    fn test_parameters_round_trip() {
        let mut net = network();
        let a = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        let c = net.add_connection(a, a, 1.0, PlasticityRuleKind::Stdp);
        let mut sim = NetworkSimulator::with_network(net);

        sim.set_parameters([
            ("dt", "0.5"),
            ("plasticity_enabled", "false"),
            ("homeostasis_enabled", "1"),
            ("stdp_a_plus", "0.02"),
            ("homeostasis_target_rate", "7.5"),
            ("homeostasis_mode", "intrinsic_plasticity"),
        ])
        .unwrap();

        let params = sim.parameters();
        assert_eq!(params.get("dt").map(String::as_str), Some("0.5"));
        assert_eq!(params.get("plasticity_enabled").map(String::as_str), Some("false"));
        assert_eq!(params.get("homeostasis_enabled").map(String::as_str), Some("true"));
        assert_eq!(params.get("stdp_a_plus").map(String::as_str), Some("0.02"));
        assert_eq!(params.get("homeostasis_target_rate").map(String::as_str), Some("7.5"));
        assert_eq!(
            params.get("homeostasis_mode").map(String::as_str),
            Some("intrinsic_plasticity")
        );
        let a_plus = sim.network().and_then(|n| n.connection(c)).map(|c| c.params().a_plus);
        assert_eq!(a_plus, Some(0.02));
    }

    #[test]
    fn test_bad_parameters_rejected() {
        let mut sim = NetworkSimulator::with_network(network());
        assert_eq!(
            sim.set_parameters([("gamma", "1")]),
            Err(SimulationError::UnknownParameter("gamma".to_string()))
        );
        assert!(matches!(
            sim.set_parameters([("dt", "fast")]),
            Err(SimulationError::InvalidParameter { .. })
        ));
        assert!(sim.set_parameters([("stdp_tau_pre", "-3")]).is_err());
        assert!(sim.set_parameters([("homeostasis_time_window", "0")]).is_err());
        assert_eq!(sim.homeostasis_config().time_window, 1000.0);
    }

    #[test]
    fn test_reset_returns_to_initial_state() {
        let mut net = network();
        let a = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        net.stimulate_neuron(a, 25.0);
        let mut sim = NetworkSimulator::with_network(net);
        sim.run(4).unwrap();
        sim.reset();

        assert_eq!(sim.current_time(), 0.0);
        assert_eq!(sim.stats(), SimulationStats::default());
        let neuron = sim.network().and_then(|n| n.neuron(a)).unwrap();
        assert_eq!(neuron.last_spike_time(), NO_SPIKE);
        assert_eq!(neuron.potential(), -70.0);
    }
}
