// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use brainll_npu_neural::{ConnectionId, NeuralError, NeuronId};
use brainll_npu_plasticity::PlasticityError;
use thiserror::Error;

/// Failures of network reconstruction and parameter edits.
///
/// Lookups and structural edits (add/remove) report misses with `Option`, the
/// invalid-ID sentinel or `bool` instead.
#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    #[error("neuron {0} not found")]
    NeuronNotFound(NeuronId),

    #[error("connection {0} not found")]
    ConnectionNotFound(ConnectionId),

    #[error("duplicate neuron id {0}")]
    DuplicateNeuron(NeuronId),

    #[error("duplicate connection id {0}")]
    DuplicateConnection(ConnectionId),

    #[error("duplicate population name '{0}'")]
    DuplicatePopulation(String),

    /// A persisted ID far beyond the number of saved entities
    #[error("{entity} id {id} is out of range (at most {limit} for this network)")]
    IdOutOfRange {
        entity: &'static str,
        id: u32,
        limit: usize,
    },

    #[error("connection {connection} references missing neuron {neuron}")]
    DanglingConnection {
        connection: ConnectionId,
        neuron: NeuronId,
    },

    #[error("population '{population}' references missing neuron {neuron}")]
    DanglingPopulationMember { population: String, neuron: NeuronId },

    #[error(transparent)]
    Neural(#[from] NeuralError),

    #[error(transparent)]
    Plasticity(#[from] PlasticityError),
}

pub type NetworkResult<T> = std::result::Result<T, NetworkError>;

#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("no network attached")]
    NoNetwork,

    #[error("simulation is paused")]
    Paused,

    #[error("invalid timestep {0}: must be finite and positive")]
    InvalidTimestep(f64),

    #[error("unknown simulation parameter '{0}'")]
    UnknownParameter(String),

    #[error("invalid value '{value}' for simulation parameter '{name}'")]
    InvalidParameter { name: String, value: String },
}

pub type Result<T> = std::result::Result<T, SimulationError>;
