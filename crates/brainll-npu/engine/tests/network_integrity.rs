// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Structural integrity of the network arena under random edits

use ahash::AHashSet;
use brainll_npu_engine::NetworkCore;
use brainll_npu_neural::{ConnectionId, NeuronId, NeuronModelKind, ParameterMap};
use brainll_npu_plasticity::PlasticityRuleKind;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn assert_consistent(net: &NetworkCore) {
    for connection in net.connections() {
        let source = net
            .neuron(connection.source())
            .unwrap_or_else(|| panic!("{} has a dangling source", connection.id()));
        let target = net
            .neuron(connection.target())
            .unwrap_or_else(|| panic!("{} has a dangling target", connection.id()));
        assert!(source.outgoing().contains(&connection.id()));
        assert!(target.incoming().contains(&connection.id()));
    }
    for neuron in net.neurons() {
        for cid in neuron.incoming().iter().chain(neuron.outgoing()) {
            assert!(
                net.connection(*cid).is_some(),
                "{} lists removed {}",
                neuron.id(),
                cid
            );
        }
    }
    for population in net.populations() {
        for id in population.neurons() {
            assert!(net.neuron(*id).is_some());
        }
    }
    assert_eq!(net.neuron_count(), net.neurons().count());
    assert_eq!(net.connection_count(), net.connections().count());
}

#[test]
fn test_random_edits_keep_network_consistent() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut net = NetworkCore::default();
    net.create_population("pool", 5, NeuronModelKind::Lif, &ParameterMap::new());
    let mut issued_neurons: AHashSet<NeuronId> = net.neuron_ids().into_iter().collect();
    let mut issued_connections: AHashSet<ConnectionId> = AHashSet::new();

    for _ in 0..600 {
        let neurons = net.neuron_ids();
        match rng.gen_range(0..10) {
            0..=2 => {
                let id = net.add_neuron(NeuronModelKind::AdaptiveLif, &ParameterMap::new());
                assert!(issued_neurons.insert(id), "neuron id {} reused", id);
            }
            3..=6 if !neurons.is_empty() => {
                let source = *neurons.choose(&mut rng).unwrap();
                let target = *neurons.choose(&mut rng).unwrap();
                let id = net.add_connection(source, target, 0.5, PlasticityRuleKind::Stdp);
                assert!(id.is_valid());
                assert!(issued_connections.insert(id), "connection id {} reused", id);
            }
            7 if !neurons.is_empty() => {
                let victim = *neurons.choose(&mut rng).unwrap();
                assert!(net.remove_neuron(victim));
                assert!(net.neuron(victim).is_none());
            }
            8 | 9 => {
                let connections = net.connection_ids();
                if let Some(victim) = connections.choose(&mut rng) {
                    assert!(net.remove_connection(*victim));
                    assert!(!net.remove_connection(*victim));
                }
            }
            _ => {}
        }
        assert_consistent(&net);
    }
}

#[test]
fn test_removing_hub_neuron_cascades() {
    let mut net = NetworkCore::default();
    let hub = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
    let spokes: Vec<NeuronId> = (0..4)
        .map(|_| net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new()))
        .collect();
    for spoke in &spokes {
        net.add_connection(hub, *spoke, 1.0, PlasticityRuleKind::None);
        net.add_connection(*spoke, hub, 1.0, PlasticityRuleKind::None);
    }
    let kept = net.add_connection(spokes[0], spokes[1], 1.0, PlasticityRuleKind::None);
    assert_eq!(net.connection_count(), 9);

    assert!(net.remove_neuron(hub));
    assert_eq!(net.connection_count(), 1);
    assert!(net.connection(kept).is_some());
    for spoke in &spokes {
        let neuron = net.neuron(*spoke).unwrap();
        assert!(neuron
            .incoming()
            .iter()
            .chain(neuron.outgoing())
            .all(|cid| *cid == kept));
    }
    assert_consistent(&net);
}

#[test]
fn test_population_names_are_unique() {
    let mut net = NetworkCore::default();
    let first = net.create_population("v1", 3, NeuronModelKind::Lif, &ParameterMap::new());
    let second = net.create_population("v1", 8, NeuronModelKind::Izhikevich, &ParameterMap::new());

    assert_eq!(first.len(), 3);
    assert!(second.is_empty());
    assert_eq!(net.neuron_count(), 3);
    assert_eq!(net.population("v1").map(|p| p.kind()), Some(NeuronModelKind::Lif));
}

#[test]
fn test_removed_members_leave_populations() {
    let mut net = NetworkCore::default();
    let ids = net.create_population("motor", 3, NeuronModelKind::Lif, &ParameterMap::new());
    net.remove_neuron(ids[1]);

    let members = net.population("motor").map(|p| p.neurons().to_vec());
    assert_eq!(members, Some(vec![ids[0], ids[2]]));
    assert_consistent(&net);
}

#[test]
fn test_connecting_populations_skips_self_pairs() {
    let mut net = NetworkCore::default();
    net.create_population("ring", 4, NeuronModelKind::Lif, &ParameterMap::new());
    let created = net.connect_populations("ring", "ring", 0.3, PlasticityRuleKind::Hebbian);

    assert_eq!(created.len(), 12);
    assert!(net.connections().all(|c| c.source() != c.target()));
    assert_consistent(&net);
}
