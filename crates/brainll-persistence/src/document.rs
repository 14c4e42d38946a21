// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Persisted document structures
//!
//! The same structures back both formats: JSON writes them as text, the binary
//! format writes them with bincode after the `BLNN` header.

use std::fmt;

use brainll_npu_engine::{NetworkConfig, NetworkCore, Population, Topology};
use brainll_npu_neural::{
    ConnectionId, ModelState, Neuron, NeuronId, NeuronModelKind, NeuronParameters,
};
use brainll_npu_plasticity::{
    Connection, PlasticityParameters, PlasticityRuleKind, PlasticityState,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PersistenceError, Result};

/// Current document version (both formats)
pub const DOCUMENT_VERSION: u32 = 1;

/// What a persisted file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Network,
    Weights,
    LearningState,
}

impl ContentType {
    /// Code stored in the binary header
    pub fn code(self) -> u32 {
        match self {
            Self::Network => 0,
            Self::Weights => 1,
            Self::LearningState => 2,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Network),
            1 => Some(Self::Weights),
            2 => Some(Self::LearningState),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Weights => "weights",
            Self::LearningState => "learning_state",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronRecord {
    pub id: NeuronId,
    pub alias: Option<String>,
    pub model: NeuronModelKind,
    pub params: NeuronParameters,
    pub potential: f64,
    pub last_spike_time: f64,
    pub state: ModelState,
    pub input_interval: Option<f64>,
}

impl NeuronRecord {
    fn capture(neuron: &Neuron) -> Self {
        Self {
            id: neuron.id(),
            alias: neuron.alias().map(str::to_string),
            model: neuron.kind(),
            params: neuron.params().clone(),
            potential: neuron.potential(),
            last_spike_time: neuron.last_spike_time(),
            state: neuron.model_state(),
            input_interval: neuron.input_interval(),
        }
    }

    fn into_neuron(self) -> Result<Neuron> {
        let mut neuron = Neuron::with_parameters(self.id, self.model, self.params)
            .map_err(|e| PersistenceError::Deserialization(format!("{}: {}", self.id, e)))?;
        neuron.set_alias(self.alias);
        neuron.set_input_interval(self.input_interval);
        neuron.restore_state(self.potential, self.last_spike_time, &self.state);
        Ok(neuron)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub id: ConnectionId,
    pub source: NeuronId,
    pub target: NeuronId,
    pub weight: f64,
    pub delay: f64,
    pub rule: PlasticityRuleKind,
    pub params: PlasticityParameters,
    pub plasticity_state: PlasticityState,
}

impl ConnectionRecord {
    fn capture(connection: &Connection) -> Self {
        Self {
            id: connection.id(),
            source: connection.source(),
            target: connection.target(),
            weight: connection.weight(),
            delay: connection.delay(),
            rule: connection.rule(),
            params: connection.params().clone(),
            plasticity_state: connection.plasticity_state().clone(),
        }
    }

    fn into_connection(self) -> Connection {
        let mut connection = Connection::with_parameters(
            self.id,
            self.source,
            self.target,
            self.weight,
            self.rule,
            self.params,
        );
        connection.set_delay(self.delay);
        connection.restore_plasticity_state(self.plasticity_state);
        connection
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub name: String,
    pub model: NeuronModelKind,
    pub neurons: Vec<NeuronId>,
    pub topology: Option<Topology>,
}

/// Full network: configuration, neurons, connections and populations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDocument {
    pub version: u32,
    #[serde(rename = "type")]
    pub content: ContentType,
    pub time: f64,
    pub config: NetworkConfig,
    pub neurons: Vec<NeuronRecord>,
    pub connections: Vec<ConnectionRecord>,
    /// Sorted by name
    pub populations: Vec<PopulationRecord>,
}

impl NetworkDocument {
    pub fn capture(network: &NetworkCore) -> Self {
        let populations = network
            .population_names()
            .into_iter()
            .filter_map(|name| {
                let population = network.population(&name)?;
                Some(PopulationRecord {
                    model: population.kind(),
                    neurons: population.neurons().to_vec(),
                    topology: population.topology().cloned(),
                    name,
                })
            })
            .collect();
        Self {
            version: DOCUMENT_VERSION,
            content: ContentType::Network,
            time: network.current_time(),
            config: network.config().clone(),
            neurons: network.neurons().map(NeuronRecord::capture).collect(),
            connections: network
                .connections()
                .map(ConnectionRecord::capture)
                .collect(),
            populations,
        }
    }

    /// Rebuild the network; fails on dangling or duplicate references
    pub fn into_network(self) -> Result<NetworkCore> {
        let neurons = self
            .neurons
            .into_iter()
            .map(NeuronRecord::into_neuron)
            .collect::<Result<Vec<_>>>()?;
        let connections = self
            .connections
            .into_iter()
            .map(ConnectionRecord::into_connection)
            .collect();
        let populations = self
            .populations
            .into_iter()
            .map(|p| Population::with_members(p.name, p.model, p.neurons, p.topology))
            .collect();
        Ok(NetworkCore::from_parts(
            self.config,
            neurons,
            connections,
            populations,
            self.time,
        )?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    pub id: ConnectionId,
    pub source: NeuronId,
    pub target: NeuronId,
    pub weight: f64,
}

/// Connection weights only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightsDocument {
    pub version: u32,
    #[serde(rename = "type")]
    pub content: ContentType,
    pub weights: Vec<WeightRecord>,
}

impl WeightsDocument {
    pub fn capture(network: &NetworkCore) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            content: ContentType::Weights,
            weights: network
                .connections()
                .map(|c| WeightRecord {
                    id: c.id(),
                    source: c.source(),
                    target: c.target(),
                    weight: c.weight(),
                })
                .collect(),
        }
    }

    /// Apply to matching connections (same ID and endpoints); returns how many were applied
    pub fn apply(&self, network: &mut NetworkCore) -> usize {
        let mut applied = 0;
        for record in &self.weights {
            match network.connection_mut(record.id) {
                Some(c) if c.source() == record.source && c.target() == record.target => {
                    c.set_weight(record.weight);
                    applied += 1;
                }
                Some(_) => warn!(
                    "[PERSISTENCE] {} endpoints differ from the saved ones, skipped",
                    record.id
                ),
                None => debug!("[PERSISTENCE] {} not in network, skipped", record.id),
            }
        }
        applied
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningRecord {
    pub id: ConnectionId,
    pub weight: f64,
    pub plasticity_state: PlasticityState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRecord {
    pub id: NeuronId,
    pub threshold: f64,
}

/// What learning changed: weights, plasticity state and (homeostatic) thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStateDocument {
    pub version: u32,
    #[serde(rename = "type")]
    pub content: ContentType,
    pub connections: Vec<LearningRecord>,
    pub thresholds: Vec<ThresholdRecord>,
}

impl LearningStateDocument {
    pub fn capture(network: &NetworkCore) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            content: ContentType::LearningState,
            connections: network
                .connections()
                .map(|c| LearningRecord {
                    id: c.id(),
                    weight: c.weight(),
                    plasticity_state: c.plasticity_state().clone(),
                })
                .collect(),
            thresholds: network
                .neurons()
                .map(|n| ThresholdRecord {
                    id: n.id(),
                    threshold: n.threshold(),
                })
                .collect(),
        }
    }

    /// Apply to the connections and neurons that exist; returns how many records were applied
    pub fn apply(&self, network: &mut NetworkCore) -> usize {
        let mut applied = 0;
        for record in &self.connections {
            if let Some(connection) = network.connection_mut(record.id) {
                connection.set_weight(record.weight);
                connection.restore_plasticity_state(record.plasticity_state.clone());
                applied += 1;
            }
        }
        for record in &self.thresholds {
            match network.set_neuron_parameter(record.id, "threshold", record.threshold) {
                Ok(()) => applied += 1,
                Err(e) => debug!("[PERSISTENCE] Threshold of {} skipped: {}", record.id, e),
            }
        }
        applied
    }
}

/// Any persisted document
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Network(NetworkDocument),
    Weights(WeightsDocument),
    LearningState(LearningStateDocument),
}

impl Document {
    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Network(_) => ContentType::Network,
            Self::Weights(_) => ContentType::Weights,
            Self::LearningState(_) => ContentType::LearningState,
        }
    }

    /// Version and content type recorded inside the document body
    pub fn header(&self) -> (u32, ContentType) {
        match self {
            Self::Network(d) => (d.version, d.content),
            Self::Weights(d) => (d.version, d.content),
            Self::LearningState(d) => (d.version, d.content),
        }
    }
}

/// Reject unsupported versions and content other than `expected`
pub(crate) fn check_header(version: u32, found: ContentType, expected: ContentType) -> Result<()> {
    if version != DOCUMENT_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: version,
            supported: DOCUMENT_VERSION,
        });
    }
    if found != expected {
        return Err(PersistenceError::ContentTypeMismatch { expected, found });
    }
    Ok(())
}
