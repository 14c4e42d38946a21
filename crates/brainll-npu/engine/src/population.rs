// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use brainll_npu_neural::{NeuronId, NeuronModelKind};
use serde::{Deserialize, Serialize};

use crate::topology::Topology;

/// A named, ordered group of neurons.
///
/// Membership is by ID only; the neurons themselves live in the network arena. A
/// neuron may be a member of any number of populations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    name: String,
    kind: NeuronModelKind,
    neurons: Vec<NeuronId>,
    /// Wiring used at creation time; not enforced afterwards
    topology: Option<Topology>,
}

impl Population {
    pub fn new(name: impl Into<String>, kind: NeuronModelKind) -> Self {
        Self {
            name: name.into(),
            kind,
            neurons: Vec::new(),
            topology: None,
        }
    }

    pub fn with_members(
        name: impl Into<String>,
        kind: NeuronModelKind,
        neurons: Vec<NeuronId>,
        topology: Option<Topology>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            neurons,
            topology,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model the population was created with
    pub fn kind(&self) -> NeuronModelKind {
        self.kind
    }

    /// Members in creation order
    pub fn neurons(&self) -> &[NeuronId] {
        &self.neurons
    }

    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    pub fn contains(&self, id: NeuronId) -> bool {
        self.neurons.contains(&id)
    }

    pub(crate) fn push(&mut self, id: NeuronId) {
        self.neurons.push(id);
    }

    /// Drop `id` from the member list; returns whether it was a member
    pub(crate) fn remove(&mut self, id: NeuronId) -> bool {
        let before = self.neurons.len();
        self.neurons.retain(|n| *n != id);
        self.neurons.len() != before
    }

    pub(crate) fn set_topology(&mut self, topology: Option<Topology>) {
        self.topology = topology;
    }
}
