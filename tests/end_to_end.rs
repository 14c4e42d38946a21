// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file -> network -> simulation -> persistence -> reload

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use brainll::prelude::*;
use brainll::{network_from_config, persistence_from_config, simulator_from_config};
use parking_lot::Mutex;

const CONFIG: &str = r#"
[simulation]
timestep = 1.0
random_seed = 17
plasticity_enabled = true
mode = "fixed"

[network]
default_weight = 30.0
weight_max = 40.0

[stdp]
a_plus = 0.05

[persistence]
format = "binary"
"#;

fn load(dir: &std::path::Path, overrides: &[(&str, &str)]) -> BrainllConfig {
    let path = dir.join("brainll_configuration.toml");
    fs::write(&path, CONFIG).unwrap();
    let cli: HashMap<String, String> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    load_config(Some(&path), Some(&cli)).unwrap()
}

/// input -> relay -> output, every link strong enough to fire its target
fn relay_network(config: &BrainllConfig) -> (NetworkCore, [NeuronId; 3]) {
    let mut network = network_from_config(config);
    let model = brainll::default_model(config);
    let input = network.add_neuron(model, &ParameterMap::new());
    let relay = network.add_neuron(model, &ParameterMap::new());
    let output = network.add_neuron(model, &ParameterMap::new());
    network.set_alias(output, "output");
    let weight = config.network.default_weight;
    network.add_connection(input, relay, weight, PlasticityRuleKind::Stdp);
    network.add_connection(relay, output, weight, PlasticityRuleKind::Stdp);
    (network, [input, relay, output])
}

#[test]
fn test_configured_run_learns_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let config = load(dir.path(), &[]);
    let (mut network, [input, relay, output]) = relay_network(&config);
    network.stimulate_neuron(input, 25.0);
    let before = network.connection(network.outgoing_connections(input).unwrap()[0])
        .unwrap()
        .weight();

    let mut sim = simulator_from_config(&config, Some(network)).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    sim.register_spike_callback(Box::new(move |id, t| sink.lock().push((id, t))));
    assert_eq!(sim.run(10).unwrap(), 10);
    assert_eq!(*log.lock(), vec![(input, 0.0), (relay, 1.0), (output, 2.0)]);

    let network = sim.network().unwrap();
    let after = network
        .connection(network.outgoing_connections(input).unwrap()[0])
        .unwrap()
        .weight();
    assert!(after > before, "causal pairing should potentiate: {} -> {}", before, after);

    let persistence = persistence_from_config(&config).unwrap();
    let path = dir.path().join("relay.blnn");
    persistence.save_network(network, &path).unwrap();
    let reloaded = persistence.load_network(&path).unwrap();
    assert_eq!(reloaded.neuron_by_alias("output"), Some(output));
    assert_eq!(reloaded.current_time(), network.current_time());
    for (a, b) in network.connections().zip(reloaded.connections()) {
        assert_eq!(a.weight(), b.weight());
    }
}

#[test]
fn test_event_mode_matches_fixed_mode() {
    let dir = tempfile::tempdir().unwrap();
    let config = load(dir.path(), &[("mode", "event")]);
    let (network, [input, relay, output]) = relay_network(&config);

    let mut sim = EventDrivenSimulator::with_network(network);
    sim.initialize(1.0, true, false).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    sim.register_spike_callback(Box::new(move |id, t| sink.lock().push((id, t))));
    assert!(sim.schedule_spike(input, 0.0));
    sim.run(100).unwrap();

    assert_eq!(*log.lock(), vec![(input, 0.0), (relay, 1.0), (output, 2.0)]);
    assert_eq!(sim.pending_events(), 0);
}

#[test]
fn test_runner_drives_configured_network() {
    let dir = tempfile::tempdir().unwrap();
    let config = load(dir.path(), &[]);
    let (network, [input, _, output]) = relay_network(&config);

    let mut sim = NetworkSimulator::with_network(network);
    sim.initialize(
        config.simulation.timestep,
        config.simulation.plasticity_enabled,
        config.simulation.homeostasis_enabled,
    )
    .unwrap();
    let mut runner = SimulationRunner::new(sim);
    runner.start().unwrap();
    runner.submit(SimulationCommand::StimulateNeuron {
        neuron: input,
        current: 25.0,
    });

    let simulator = runner.simulator();
    let deadline = Instant::now() + Duration::from_secs(2);
    let mut fired = false;
    while Instant::now() < deadline && !fired {
        fired = simulator
            .lock()
            .network()
            .and_then(|n| n.neuron(output))
            .map(|n| n.last_spike_time() >= 0.0)
            .unwrap_or(false);
        thread::sleep(Duration::from_millis(2));
    }
    runner.stop();
    assert!(fired, "stimulus never reached the output neuron");
    assert!(runner.steps_completed() >= 3);
}

#[test]
fn test_invalid_override_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("brainll_configuration.toml");
    fs::write(&path, CONFIG).unwrap();
    let mut cli = HashMap::new();
    cli.insert("timestep".to_string(), "0".to_string());
    assert!(load_config(Some(&path), Some(&cli)).is_err());
}
