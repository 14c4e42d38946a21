// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Read-only views of network state for renderers and loggers

use brainll_npu_neural::{ConnectionId, NeuronId, NeuronModelKind};
use brainll_npu_plasticity::PlasticityRuleKind;
use serde::{Deserialize, Serialize};

use crate::network_core::NetworkCore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronSnapshot {
    pub id: NeuronId,
    pub alias: Option<String>,
    pub model: NeuronModelKind,
    pub potential: f64,
    pub threshold: f64,
    pub last_spike_time: f64,
    pub fired: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    pub id: ConnectionId,
    pub source: NeuronId,
    pub target: NeuronId,
    pub weight: f64,
    pub delay: f64,
    pub rule: PlasticityRuleKind,
    pub last_active_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub name: String,
    pub neurons: Vec<NeuronId>,
}

/// State of a whole network at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub time: f64,
    pub neurons: Vec<NeuronSnapshot>,
    pub connections: Vec<ConnectionSnapshot>,
    /// Sorted by name
    pub populations: Vec<PopulationSnapshot>,
}

impl NetworkSnapshot {
    pub fn capture(network: &NetworkCore) -> Self {
        let neurons = network
            .neurons()
            .map(|n| NeuronSnapshot {
                id: n.id(),
                alias: n.alias().map(str::to_string),
                model: n.kind(),
                potential: n.potential(),
                threshold: n.threshold(),
                last_spike_time: n.last_spike_time(),
                fired: n.has_fired(),
            })
            .collect();
        let connections = network
            .connections()
            .map(|c| ConnectionSnapshot {
                id: c.id(),
                source: c.source(),
                target: c.target(),
                weight: c.weight(),
                delay: c.delay(),
                rule: c.rule(),
                last_active_time: c.last_active_time(),
            })
            .collect();
        let populations = network
            .population_names()
            .into_iter()
            .filter_map(|name| {
                let neurons = network.population(&name)?.neurons().to_vec();
                Some(PopulationSnapshot { name, neurons })
            })
            .collect();
        Self {
            time: network.current_time(),
            neurons,
            connections,
            populations,
        }
    }

    /// Neurons that were flagged as fired at capture time
    pub fn fired_neurons(&self) -> impl Iterator<Item = NeuronId> + '_ {
        self.neurons.iter().filter(|n| n.fired).map(|n| n.id)
    }
}

impl NetworkCore {
    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot::capture(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainll_npu_neural::ParameterMap;

    #[test]
    fn test_snapshot_mirrors_network() {
        let mut net = NetworkCore::default();
        let ids = net.create_population("b", 2, NeuronModelKind::Lif, &ParameterMap::new());
        net.create_population("a", 1, NeuronModelKind::Gru, &ParameterMap::new());
        let c = net.add_connection(ids[0], ids[1], 0.7, PlasticityRuleKind::Hebbian);

        let snapshot = net.snapshot();
        assert_eq!(snapshot.neurons.len(), 3);
        assert_eq!(snapshot.connections.len(), 1);
        assert_eq!(snapshot.connections[0].id, c);
        assert_eq!(snapshot.connections[0].weight, 0.7);
        let names: Vec<&str> = snapshot.populations.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(snapshot.fired_neurons().count(), 0);
    }
}
