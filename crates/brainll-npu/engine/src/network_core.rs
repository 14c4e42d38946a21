// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! The network arena
//!
//! [`NetworkCore`] owns every neuron, connection and population. Neurons and
//! connections are stored in slot vectors indexed by `id - 1`; a removed entity
//! leaves an empty slot behind, so IDs are never reused within a network's
//! lifetime. Connections hold plain source/target IDs and neurons hold plain
//! connection IDs, so there are no reference cycles to manage.
//!
//! Misses are reported the same way everywhere: lookups return `None`, creation
//! returns the `INVALID` ID (or an empty list), and removals/stimulation return
//! `false`.

use ahash::AHashMap;
use brainll_npu_neural::{
    ConnectionId, Neuron, NeuronId, NeuronModelKind, NeuronParameters, ParameterMap,
};
use brainll_npu_plasticity::{Connection, PlasticityParameters, PlasticityRuleKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{NetworkError, NetworkResult};
use crate::population::Population;
use crate::topology::Topology;

/// Network-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Default simulation step (ms)
    pub timestep: f64,
    pub random_seed: u64,
    /// Master switch for connection plasticity
    pub learning_enabled: bool,
    /// Weight used by population wiring when none is given
    pub default_weight: f64,
    /// Parameters given to every new connection
    pub connection_parameters: PlasticityParameters,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timestep: 0.1,
            random_seed: 42,
            learning_enabled: true,
            default_weight: 1.0,
            connection_parameters: PlasticityParameters::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetworkStats {
    pub neuron_count: usize,
    pub connection_count: usize,
    pub population_count: usize,
    pub mean_weight: f64,
    /// Spikes currently travelling along connections
    pub spikes_in_flight: usize,
}

pub struct NetworkCore {
    config: NetworkConfig,
    neurons: Vec<Option<Neuron>>,
    connections: Vec<Option<Connection>>,
    live_neurons: usize,
    live_connections: usize,
    populations: AHashMap<String, Population>,
    rng: StdRng,
    current_time: f64,
    /// Network-wide reward for reinforcement learning
    reward: f64,
}

impl Default for NetworkCore {
    fn default() -> Self {
        Self::new(NetworkConfig::default())
    }
}

impl std::fmt::Debug for NetworkCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkCore")
            .field("neurons", &self.live_neurons)
            .field("connections", &self.live_connections)
            .field("populations", &self.populations.len())
            .field("current_time", &self.current_time)
            .finish()
    }
}

impl NetworkCore {
    pub fn new(config: NetworkConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.random_seed);
        Self {
            config,
            neurons: Vec::new(),
            connections: Vec::new(),
            live_neurons: 0,
            live_connections: 0,
            populations: AHashMap::new(),
            rng,
            current_time: 0.0,
            reward: 0.0,
        }
    }

    /// Rebuild a network from persisted parts.
    ///
    /// Connection lists on the neurons are recomputed from `connections`. The ID
    /// counters continue after the largest ID present.
    pub fn from_parts(
        config: NetworkConfig,
        neurons: Vec<Neuron>,
        connections: Vec<Connection>,
        populations: Vec<Population>,
        current_time: f64,
    ) -> NetworkResult<Self> {
        let mut network = Self::new(config);
        let neuron_limit = restored_id_limit(neurons.len());
        let connection_limit = restored_id_limit(connections.len());

        for neuron in neurons {
            let id = neuron.id();
            let index = slot_index(id.0).ok_or(NetworkError::NeuronNotFound(id))?;
            if index >= neuron_limit {
                return Err(NetworkError::IdOutOfRange {
                    entity: "neuron",
                    id: id.0,
                    limit: neuron_limit,
                });
            }
            if network.neurons.len() <= index {
                network.neurons.resize_with(index + 1, || None);
            }
            if network.neurons[index].is_some() {
                return Err(NetworkError::DuplicateNeuron(id));
            }
            network.neurons[index] = Some(neuron);
            network.live_neurons += 1;
        }

        // Existing attachments are replaced by the ones implied by `connections`
        let ids: Vec<ConnectionId> = connections.iter().map(Connection::id).collect();
        for neuron in network.neurons.iter_mut().flatten() {
            for cid in &ids {
                neuron.detach(*cid);
            }
        }

        for connection in connections {
            let id = connection.id();
            let index = slot_index(id.0).ok_or(NetworkError::ConnectionNotFound(id))?;
            if index >= connection_limit {
                return Err(NetworkError::IdOutOfRange {
                    entity: "connection",
                    id: id.0,
                    limit: connection_limit,
                });
            }
            for endpoint in [connection.source(), connection.target()] {
                if network.neuron(endpoint).is_none() {
                    return Err(NetworkError::DanglingConnection {
                        connection: id,
                        neuron: endpoint,
                    });
                }
            }
            if network.connections.len() <= index {
                network.connections.resize_with(index + 1, || None);
            }
            if network.connections[index].is_some() {
                return Err(NetworkError::DuplicateConnection(id));
            }
            if let Some(source) = network.neuron_mut(connection.source()) {
                source.attach_outgoing(id);
            }
            if let Some(target) = network.neuron_mut(connection.target()) {
                target.attach_incoming(id);
            }
            network.connections[index] = Some(connection);
            network.live_connections += 1;
        }

        for population in populations {
            if network.populations.contains_key(population.name()) {
                return Err(NetworkError::DuplicatePopulation(population.name().to_string()));
            }
            if let Some(missing) = population
                .neurons()
                .iter()
                .find(|id| network.neuron(**id).is_none())
            {
                return Err(NetworkError::DanglingPopulationMember {
                    population: population.name().to_string(),
                    neuron: *missing,
                });
            }
            network
                .populations
                .insert(population.name().to_string(), population);
        }

        network.current_time = current_time.max(0.0);
        info!(
            "[NETWORK] Restored {} neurons, {} connections, {} populations",
            network.live_neurons,
            network.live_connections,
            network.populations.len()
        );
        Ok(network)
    }

    // ---- Configuration ----

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn timestep(&self) -> f64 {
        self.config.timestep
    }

    /// Ignored unless `dt` is finite and positive
    pub fn set_timestep(&mut self, dt: f64) -> bool {
        if !dt.is_finite() || dt <= 0.0 {
            warn!("[NETWORK] Rejected timestep {}", dt);
            return false;
        }
        self.config.timestep = dt;
        true
    }

    pub fn learning_enabled(&self) -> bool {
        self.config.learning_enabled
    }

    pub fn set_learning_enabled(&mut self, enabled: bool) {
        self.config.learning_enabled = enabled;
    }

    /// Edit the parameters of new connections and of every existing one.
    ///
    /// Nothing changes if the edited defaults are invalid. A connection whose own
    /// parameters become invalid keeps its previous ones.
    pub fn update_connection_parameters(
        &mut self,
        edit: impl Fn(&mut PlasticityParameters),
    ) -> NetworkResult<()> {
        let mut defaults = self.config.connection_parameters.clone();
        edit(&mut defaults);
        defaults.validate()?;
        self.config.connection_parameters = defaults;

        for connection in self.connections.iter_mut().flatten() {
            let mut params = connection.params().clone();
            edit(&mut params);
            if let Err(e) = connection.set_params(params) {
                warn!("[NETWORK] {} kept its parameters: {}", connection.id(), e);
            }
        }
        Ok(())
    }

    /// Restart the network RNG from `seed`
    pub fn reseed(&mut self, seed: u64) {
        self.config.random_seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Move the clock forward; earlier times are ignored
    pub(crate) fn advance_time(&mut self, time: f64) {
        if time > self.current_time {
            self.current_time = time;
        }
    }

    pub fn reward(&self) -> f64 {
        self.reward
    }

    pub fn set_reward(&mut self, reward: f64) {
        self.reward = reward;
    }

    // ---- Neurons ----

    /// Create a neuron with `kind` defaults overridden by `params`. Never fails.
    pub fn add_neuron(&mut self, kind: NeuronModelKind, params: &ParameterMap) -> NeuronId {
        let id = NeuronId(self.neurons.len() as u32 + 1);
        self.neurons.push(Some(Neuron::new(id, kind, params)));
        self.live_neurons += 1;
        debug!("[NETWORK] Added {} ({})", id, kind);
        id
    }

    /// As [`NetworkCore::add_neuron`], with the model given by name (unknown names mean LIF)
    pub fn add_neuron_named(&mut self, model: &str, params: &ParameterMap) -> NeuronId {
        self.add_neuron(NeuronModelKind::from_name(model), params)
    }

    /// Create a pattern-generator neuron that fires every `interval` ms in the
    /// event-driven simulator
    pub fn add_input_neuron(&mut self, kind: NeuronModelKind, interval: f64) -> NeuronId {
        let id = self.add_neuron(kind, &ParameterMap::new());
        self.set_input_interval(id, Some(interval));
        id
    }

    pub fn set_input_interval(&mut self, id: NeuronId, interval: Option<f64>) -> bool {
        match self.neuron_mut(id) {
            Some(neuron) => {
                neuron.set_input_interval(interval);
                true
            }
            None => false,
        }
    }

    /// Remove a neuron, every connection touching it and its population memberships
    pub fn remove_neuron(&mut self, id: NeuronId) -> bool {
        let Some(neuron) = self.neuron(id) else {
            debug!("[NETWORK] remove_neuron: {} not found", id);
            return false;
        };
        let attached: Vec<ConnectionId> = neuron
            .incoming()
            .iter()
            .chain(neuron.outgoing())
            .copied()
            .collect();
        for connection in attached {
            self.remove_connection(connection);
        }
        for population in self.populations.values_mut() {
            population.remove(id);
        }
        if let Some(slot) = slot_index(id.0).and_then(|i| self.neurons.get_mut(i)) {
            *slot = None;
        }
        self.live_neurons -= 1;
        debug!("[NETWORK] Removed {}", id);
        true
    }

    pub fn neuron(&self, id: NeuronId) -> Option<&Neuron> {
        slot_index(id.0)
            .and_then(|i| self.neurons.get(i))
            .and_then(Option::as_ref)
    }

    pub fn neuron_mut(&mut self, id: NeuronId) -> Option<&mut Neuron> {
        slot_index(id.0)
            .and_then(|i| self.neurons.get_mut(i))
            .and_then(Option::as_mut)
    }

    pub fn neurons(&self) -> impl Iterator<Item = &Neuron> {
        self.neurons.iter().flatten()
    }

    pub fn neuron_ids(&self) -> Vec<NeuronId> {
        self.neurons().map(Neuron::id).collect()
    }

    pub fn neuron_count(&self) -> usize {
        self.live_neurons
    }

    pub fn neuron_by_alias(&self, alias: &str) -> Option<NeuronId> {
        self.neurons()
            .find(|n| n.alias() == Some(alias))
            .map(Neuron::id)
    }

    pub fn set_alias(&mut self, id: NeuronId, alias: impl Into<String>) -> bool {
        match self.neuron_mut(id) {
            Some(neuron) => {
                neuron.set_alias(Some(alias.into()));
                true
            }
            None => false,
        }
    }

    /// Change one model parameter of a neuron
    pub fn set_neuron_parameter(&mut self, id: NeuronId, name: &str, value: f64) -> NetworkResult<()> {
        let neuron = self.neuron_mut(id).ok_or(NetworkError::NeuronNotFound(id))?;
        neuron.set_parameter(name, value)?;
        Ok(())
    }

    pub fn outgoing_connections(&self, id: NeuronId) -> Option<&[ConnectionId]> {
        self.neuron(id).map(Neuron::outgoing)
    }

    pub fn incoming_connections(&self, id: NeuronId) -> Option<&[ConnectionId]> {
        self.neuron(id).map(Neuron::incoming)
    }

    // ---- Connections ----

    /// Connect two existing neurons; returns [`ConnectionId::INVALID`] if either is missing
    pub fn add_connection(
        &mut self,
        source: NeuronId,
        target: NeuronId,
        weight: f64,
        rule: PlasticityRuleKind,
    ) -> ConnectionId {
        let params = self.config.connection_parameters.clone();
        self.add_connection_with_parameters(source, target, weight, rule, params)
    }

    pub fn add_connection_with_parameters(
        &mut self,
        source: NeuronId,
        target: NeuronId,
        weight: f64,
        rule: PlasticityRuleKind,
        params: PlasticityParameters,
    ) -> ConnectionId {
        if self.neuron(source).is_none() || self.neuron(target).is_none() {
            warn!(
                "[NETWORK] Cannot connect {} -> {}: endpoint not found",
                source, target
            );
            return ConnectionId::INVALID;
        }
        let id = ConnectionId(self.connections.len() as u32 + 1);
        let connection = Connection::with_parameters(id, source, target, weight, rule, params);
        self.connections.push(Some(connection));
        self.live_connections += 1;
        if let Some(neuron) = self.neuron_mut(source) {
            neuron.attach_outgoing(id);
        }
        if let Some(neuron) = self.neuron_mut(target) {
            neuron.attach_incoming(id);
        }
        debug!("[NETWORK] Added {} {} -> {} ({})", id, source, target, rule);
        id
    }

    /// Rule given by name (unknown names mean no plasticity)
    pub fn add_connection_named(
        &mut self,
        source: NeuronId,
        target: NeuronId,
        weight: f64,
        rule: &str,
    ) -> ConnectionId {
        let rule = PlasticityRuleKind::parse(rule).unwrap_or_default();
        self.add_connection(source, target, weight, rule)
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> bool {
        let Some(connection) = slot_index(id.0)
            .and_then(|i| self.connections.get_mut(i))
            .and_then(Option::take)
        else {
            return false;
        };
        for endpoint in [connection.source(), connection.target()] {
            if let Some(neuron) = self.neuron_mut(endpoint) {
                neuron.detach(id);
            }
        }
        self.live_connections -= 1;
        debug!("[NETWORK] Removed {}", id);
        true
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        slot_index(id.0)
            .and_then(|i| self.connections.get(i))
            .and_then(Option::as_ref)
    }

    pub fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        slot_index(id.0)
            .and_then(|i| self.connections.get_mut(i))
            .and_then(Option::as_mut)
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter().flatten()
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections().map(Connection::id).collect()
    }

    pub fn connection_count(&self) -> usize {
        self.live_connections
    }

    // ---- Populations ----

    /// Create `size` neurons in a new population; empty if `name` is taken
    pub fn create_population(
        &mut self,
        name: &str,
        size: usize,
        kind: NeuronModelKind,
        params: &ParameterMap,
    ) -> Vec<NeuronId> {
        if self.populations.contains_key(name) {
            warn!("[NETWORK] Population '{}' already exists", name);
            return Vec::new();
        }
        let mut population = Population::new(name, kind);
        let ids: Vec<NeuronId> = (0..size).map(|_| self.add_neuron(kind, params)).collect();
        for id in &ids {
            population.push(*id);
        }
        self.populations.insert(name.to_string(), population);
        info!("[NETWORK] Created population '{}' with {} {} neurons", name, size, kind);
        ids
    }

    /// Create a population and wire it internally according to `topology`
    pub fn create_population_with_topology(
        &mut self,
        name: &str,
        size: usize,
        kind: NeuronModelKind,
        params: &ParameterMap,
        topology: Topology,
        rule: PlasticityRuleKind,
    ) -> Vec<NeuronId> {
        let ids = self.create_population(name, size, kind, params);
        if ids.is_empty() {
            return ids;
        }
        let edges = topology.edges(&ids, &mut self.rng);
        let weight = self.config.default_weight;
        for (source, target) in &edges {
            self.add_connection(*source, *target, weight, rule);
        }
        debug!(
            "[NETWORK] Wired '{}' as {} ({} connections)",
            name,
            topology.name(),
            edges.len()
        );
        if let Some(population) = self.populations.get_mut(name) {
            population.set_topology(Some(topology));
        }
        ids
    }

    /// Drop a population. Its neurons stay in the network.
    pub fn remove_population(&mut self, name: &str) -> bool {
        self.populations.remove(name).is_some()
    }

    pub fn population(&self, name: &str) -> Option<&Population> {
        self.populations.get(name)
    }

    pub fn populations(&self) -> impl Iterator<Item = &Population> {
        self.populations.values()
    }

    /// Population names in ascending order
    pub fn population_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.populations.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn population_count(&self) -> usize {
        self.populations.len()
    }

    /// All-to-all wiring between two populations, skipping self-connections
    pub fn connect_populations(
        &mut self,
        source: &str,
        target: &str,
        weight: f64,
        rule: PlasticityRuleKind,
    ) -> Vec<ConnectionId> {
        self.connect_populations_random(source, target, 1.0, weight, rule)
    }

    /// Wire every (source, target) member pair with probability `probability`
    pub fn connect_populations_random(
        &mut self,
        source: &str,
        target: &str,
        probability: f64,
        weight: f64,
        rule: PlasticityRuleKind,
    ) -> Vec<ConnectionId> {
        let (Some(sources), Some(targets)) = (
            self.populations.get(source).map(|p| p.neurons().to_vec()),
            self.populations.get(target).map(|p| p.neurons().to_vec()),
        ) else {
            warn!(
                "[NETWORK] Cannot connect populations '{}' -> '{}': not found",
                source, target
            );
            return Vec::new();
        };
        let p = probability.clamp(0.0, 1.0);
        let mut created = Vec::new();
        for &pre in &sources {
            for &post in &targets {
                if pre == post || !self.rng.gen_bool(p) {
                    continue;
                }
                let id = self.add_connection(pre, post, weight, rule);
                if id.is_valid() {
                    created.push(id);
                }
            }
        }
        debug!(
            "[NETWORK] Connected '{}' -> '{}' with {} connections",
            source,
            target,
            created.len()
        );
        created
    }

    // ---- Stimulation ----

    /// Buffer `current` for the neuron's next update
    pub fn stimulate_neuron(&mut self, id: NeuronId, current: f64) -> bool {
        match self.neuron_mut(id) {
            Some(neuron) => {
                neuron.add_input(current);
                true
            }
            None => false,
        }
    }

    pub fn stimulate_population(&mut self, name: &str, current: f64) -> bool {
        let Some(members) = self.populations.get(name).map(|p| p.neurons().to_vec()) else {
            return false;
        };
        for id in members {
            self.stimulate_neuron(id, current);
        }
        true
    }

    /// Give member `i` the current `pattern[i]`. Extra values (or members) are ignored.
    pub fn stimulate_pattern(&mut self, name: &str, pattern: &[f64]) -> bool {
        let Some(members) = self.populations.get(name).map(|p| p.neurons().to_vec()) else {
            return false;
        };
        if members.len() != pattern.len() {
            debug!(
                "[NETWORK] Pattern of {} values for '{}' with {} members",
                pattern.len(),
                name,
                members.len()
            );
        }
        for (id, current) in members.into_iter().zip(pattern) {
            self.stimulate_neuron(id, *current);
        }
        true
    }

    // ---- Monitoring ----

    /// Firing rate (Hz) of each member over the last `window` ms
    pub fn population_firing_rates(&self, name: &str, window: f64) -> Option<Vec<f64>> {
        let now = self.current_time;
        self.member_values(name, |n| n.firing_rate(now, window))
    }

    pub fn population_potentials(&self, name: &str) -> Option<Vec<f64>> {
        self.member_values(name, Neuron::potential)
    }

    /// Fraction of members that spiked within the last `window` ms
    pub fn population_synchrony(&self, name: &str, window: f64) -> Option<f64> {
        let now = self.current_time;
        let spiked = self.member_values(name, |n| {
            if n.spiked_within(now, window) {
                1.0
            } else {
                0.0
            }
        })?;
        if spiked.is_empty() {
            return Some(0.0);
        }
        Some(spiked.iter().sum::<f64>() / spiked.len() as f64)
    }

    fn member_values(&self, name: &str, f: impl Fn(&Neuron) -> f64) -> Option<Vec<f64>> {
        let population = self.populations.get(name)?;
        Some(
            population
                .neurons()
                .iter()
                .filter_map(|id| self.neuron(*id))
                .map(f)
                .collect(),
        )
    }

    pub fn stats(&self) -> NetworkStats {
        let (sum, in_flight) = self
            .connections()
            .fold((0.0, 0), |(sum, n), c| (sum + c.weight(), n + c.in_flight()));
        NetworkStats {
            neuron_count: self.live_neurons,
            connection_count: self.live_connections,
            population_count: self.populations.len(),
            mean_weight: if self.live_connections == 0 {
                0.0
            } else {
                sum / self.live_connections as f64
            },
            spikes_in_flight: in_flight,
        }
    }

    // ---- Lifecycle ----

    /// Return every neuron and connection to its initial dynamic state and the clock to 0
    pub fn reset_state(&mut self) {
        for neuron in self.neurons.iter_mut().flatten() {
            neuron.reset();
        }
        for connection in self.connections.iter_mut().flatten() {
            connection.reset();
        }
        self.current_time = 0.0;
        self.reward = 0.0;
    }

    /// Remove everything. IDs keep counting from where they were.
    pub fn clear(&mut self) {
        self.neurons.iter_mut().for_each(|slot| *slot = None);
        self.connections.iter_mut().for_each(|slot| *slot = None);
        self.live_neurons = 0;
        self.live_connections = 0;
        self.populations.clear();
        self.current_time = 0.0;
        self.reward = 0.0;
        info!("[NETWORK] Cleared");
    }

    /// Split borrow of the arena for the simulators
    pub(crate) fn parts_mut(
        &mut self,
    ) -> (&mut [Option<Neuron>], &mut [Option<Connection>], &mut StdRng) {
        (&mut self.neurons, &mut self.connections, &mut self.rng)
    }

    /// Model default threshold of a neuron (homeostasis bounds)
    pub(crate) fn base_threshold(kind: NeuronModelKind) -> f64 {
        NeuronParameters::for_model(kind).threshold
    }
}

/// Removed entities leave gaps in the ID sequence, up to this many beyond twice the saved count
const RESTORE_ID_SLACK: usize = 1 << 16;

/// Exclusive upper bound on slot indices accepted by `from_parts` for `count` entities
fn restored_id_limit(count: usize) -> usize {
    count.saturating_mul(2).saturating_add(RESTORE_ID_SLACK)
}

/// Arena slot of an ID (IDs start at 1)
#[inline]
pub(crate) fn slot_index(raw: u32) -> Option<usize> {
    (raw as usize).checked_sub(1)
}

pub(crate) fn neuron_at(neurons: &[Option<Neuron>], id: NeuronId) -> Option<&Neuron> {
    slot_index(id.0)
        .and_then(|i| neurons.get(i))
        .and_then(Option::as_ref)
}

pub(crate) fn neuron_at_mut(neurons: &mut [Option<Neuron>], id: NeuronId) -> Option<&mut Neuron> {
    slot_index(id.0)
        .and_then(|i| neurons.get_mut(i))
        .and_then(Option::as_mut)
}

pub(crate) fn connection_at_mut(
    connections: &mut [Option<Connection>],
    id: ConnectionId,
) -> Option<&mut Connection> {
    slot_index(id.0)
        .and_then(|i| connections.get_mut(i))
        .and_then(Option::as_mut)
}
