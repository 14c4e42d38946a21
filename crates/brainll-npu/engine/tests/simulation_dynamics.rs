// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use brainll_npu_engine::{
    EventDrivenSimulator, NetworkConfig, NetworkCore, NetworkSimulator, Simulator, Topology,
};
use brainll_npu_neural::{ConnectionId, NeuronId, NeuronModelKind, ParameterMap};
use brainll_npu_plasticity::PlasticityRuleKind;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type SpikeLog = Arc<Mutex<Vec<(NeuronId, f64)>>>;

fn record(sim: &mut impl Simulator) -> SpikeLog {
    let log: SpikeLog = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    sim.register_spike_callback(Box::new(move |id, t| sink.lock().push((id, t))));
    log
}

fn strong_config(timestep: f64) -> NetworkConfig {
    let mut config = NetworkConfig {
        timestep,
        ..Default::default()
    };
    config.connection_parameters.weight_max = 100.0;
    config
}

/// a -> b -> c, each link strong enough to fire its target
fn chain(config: NetworkConfig) -> (NetworkCore, [NeuronId; 3]) {
    let mut net = NetworkCore::new(config);
    let ids = [(); 3].map(|_| net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new()));
    net.add_connection(ids[0], ids[1], 30.0, PlasticityRuleKind::None);
    net.add_connection(ids[1], ids[2], 30.0, PlasticityRuleKind::None);
    (net, ids)
}

#[test]
fn test_fixed_step_chain_propagation() {
    let (mut net, [a, b, c]) = chain(strong_config(1.0));
    net.stimulate_neuron(a, 25.0);
    let mut sim = NetworkSimulator::with_network(net);
    let log = record(&mut sim);

    assert_eq!(sim.run(10), Ok(10));
    assert_eq!(*log.lock(), vec![(a, 0.0), (b, 1.0), (c, 2.0)]);
    assert_eq!(sim.stats().total_spikes, 3);
}

#[test]
fn test_event_driven_chain_matches_fixed_step() {
    let (net, [a, b, c]) = chain(strong_config(1.0));
    let mut sim = EventDrivenSimulator::with_network(net);
    let log = record(&mut sim);
    sim.schedule_spike(a, 0.0);

    assert_eq!(sim.run(100), Ok(3));
    assert_eq!(*log.lock(), vec![(a, 0.0), (b, 1.0), (c, 2.0)]);
}

#[test]
fn test_event_driven_never_delivers_early() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut net = NetworkCore::new(strong_config(0.1));
    let sources: Vec<NeuronId> = (0..8)
        .map(|_| net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new()))
        .collect();
    let mut links = Vec::new();
    for source in &sources {
        let target = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
        let delay = rng.gen_range(0.5..20.0);
        let id = net.add_connection(*source, target, 30.0, PlasticityRuleKind::None);
        if let Some(connection) = net.connection_mut(id) {
            connection.set_delay(delay);
        }
        links.push((*source, target, delay));
    }

    let mut sim = EventDrivenSimulator::with_network(net);
    let log = record(&mut sim);
    let mut emitted = Vec::new();
    for source in &sources {
        let t = rng.gen_range(0.0..50.0);
        assert!(sim.schedule_spike(*source, t));
        emitted.push(t);
    }
    sim.run(1000).unwrap();

    let log = log.lock();
    for ((source, target, delay), t0) in links.iter().zip(&emitted) {
        assert!(log.contains(&(*source, *t0)));
        let arrival = log
            .iter()
            .find(|(id, _)| id == target)
            .map(|(_, t)| *t)
            .unwrap_or_else(|| panic!("{} never fired", target));
        assert!((arrival - (t0 + delay)).abs() < 1e-9);
    }
    let times: Vec<f64> = log.iter().map(|(_, t)| *t).collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_weights_stay_in_bounds_under_learning() {
    for rule in [
        PlasticityRuleKind::Stdp,
        PlasticityRuleKind::TripletStdp,
        PlasticityRuleKind::Hebbian,
        PlasticityRuleKind::AntiHebbian,
        PlasticityRuleKind::Bcm,
        PlasticityRuleKind::Homeostatic,
        PlasticityRuleKind::Reinforcement,
    ] {
        let mut config = NetworkConfig {
            timestep: 1.0,
            default_weight: 8.0,
            ..Default::default()
        };
        config.connection_parameters.learning_rate = 0.5;
        config.connection_parameters.weight_max = 12.0;
        let mut net = NetworkCore::new(config);
        net.create_population_with_topology(
            "cortex",
            30,
            NeuronModelKind::Lif,
            &ParameterMap::new(),
            Topology::Random { probability: 0.3 },
            rule,
        );
        net.set_reward(1.0);

        let mut sim = NetworkSimulator::with_network(net);
        sim.enable_homeostasis(true);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            if let Some(net) = sim.network_mut() {
                let pattern: Vec<f64> = (0..30).map(|_| rng.gen_range(0.0..30.0)).collect();
                net.stimulate_pattern("cortex", &pattern);
            }
            sim.step().unwrap();
        }

        let net = sim.network().unwrap();
        for connection in net.connections() {
            let w = connection.weight();
            assert!((0.0..=12.0).contains(&w), "{:?} drove weight to {}", rule, w);
        }
        assert!(sim.stats().total_spikes > 0);
    }
}

#[test]
fn test_same_seed_same_noisy_run() {
    let run = |seed: u64| {
        let mut params = ParameterMap::new();
        params.insert("noise_variance".to_string(), 4.0);
        let mut net = NetworkCore::new(NetworkConfig {
            timestep: 1.0,
            random_seed: seed,
            ..Default::default()
        });
        net.create_population("noisy", 10, NeuronModelKind::Lif, &params);
        let mut sim = NetworkSimulator::with_network(net);
        let log = record(&mut sim);
        for _ in 0..100 {
            if let Some(net) = sim.network_mut() {
                net.stimulate_population("noisy", 1.9);
            }
            sim.step().unwrap();
        }
        let spikes = log.lock().clone();
        let potentials = sim
            .network()
            .and_then(|n| n.population_potentials("noisy"))
            .unwrap_or_default();
        (spikes, potentials)
    };

    assert_eq!(run(42), run(42));
}

#[test]
fn test_population_monitoring_after_run() {
    let mut net = NetworkCore::new(strong_config(1.0));
    net.create_population("burst", 4, NeuronModelKind::Lif, &ParameterMap::new());
    let mut sim = NetworkSimulator::with_network(net);
    for _ in 0..10 {
        if let Some(net) = sim.network_mut() {
            net.stimulate_population("burst", 25.0);
        }
        sim.step().unwrap();
    }
    let net = sim.network().unwrap();
    let rates = net.population_firing_rates("burst", 10.0).unwrap();
    assert_eq!(rates.len(), 4);
    assert!(rates.iter().all(|r| *r > 0.0));
    assert!(net.population_synchrony("burst", 10.0).unwrap() > 0.99);
    assert!(net.population_firing_rates("missing", 10.0).is_none());
}

/// Input neuron firing every 50 ms into a reward-modulated connection, reward held at 1
fn rewarded_input(timestep: f64) -> (NetworkCore, ConnectionId) {
    let mut net = NetworkCore::new(strong_config(timestep));
    let input = net.add_input_neuron(NeuronModelKind::Lif, 50.0);
    let target = net.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
    let c = net.add_connection(input, target, 30.0, PlasticityRuleKind::Reinforcement);
    net.set_reward(1.0);
    (net, c)
}

fn reward_baseline(net: Option<&NetworkCore>, c: ConnectionId) -> f64 {
    net.and_then(|n| n.connection(c))
        .map(|c| c.plasticity_state().reward_baseline)
        .unwrap_or(f64::NAN)
}

#[test]
fn test_reward_baseline_tracks_reward_across_long_event_gaps() {
    let (net, c) = rewarded_input(1.0);
    let mut sim = EventDrivenSimulator::with_network(net);
    sim.initialize(1.0, true, false).unwrap();
    let log = record(&mut sim);
    sim.run_until_time(500.0).unwrap();

    assert!(log.lock().len() >= 10);
    let baseline = reward_baseline(sim.network(), c);
    assert!((0.0..=1.0).contains(&baseline), "baseline {}", baseline);
    assert!(baseline > 0.9);
    let weight = sim.network().and_then(|n| n.connection(c)).map(|c| c.weight());
    assert!(weight.is_some_and(|w| (0.0..=100.0).contains(&w)));
}

#[test]
fn test_reward_baseline_tracks_reward_with_coarse_timestep() {
    let (net, c) = rewarded_input(25.0);
    let mut sim = NetworkSimulator::with_network(net);
    sim.initialize(25.0, true, false).unwrap();
    for _ in 0..10 {
        sim.step().unwrap();
        let baseline = reward_baseline(sim.network(), c);
        assert!((0.0..=1.0).contains(&baseline), "baseline {}", baseline);
    }
    assert!(reward_baseline(sim.network(), c) > 0.9);
}
