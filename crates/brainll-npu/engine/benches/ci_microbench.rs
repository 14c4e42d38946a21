// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CI Microbenchmarks
//!
//! Purpose:
//! - Provide a fast microbenchmark pack suitable for CI gating.
//! - Cover the fixed-step loop, the event loop and the plasticity pass.
//!
//! Notes:
//! - Keep runtime low (shared CI runners are noisy and slower).
//! - Networks are built from a fixed seed; no I/O.

use std::time::Duration;

use brainll_npu_engine::{
    EventDrivenSimulator, NetworkConfig, NetworkCore, NetworkSimulator, Simulator, Topology,
};
use brainll_npu_neural::{NeuronId, NeuronModelKind, ParameterMap};
use brainll_npu_plasticity::PlasticityRuleKind;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn create_test_network(neuron_count: usize, probability: f64, rule: PlasticityRuleKind) -> NetworkCore {
    let mut net = NetworkCore::new(NetworkConfig {
        timestep: 1.0,
        default_weight: 4.0,
        random_seed: 1,
        ..Default::default()
    });
    net.create_population_with_topology(
        "bench",
        neuron_count,
        NeuronModelKind::Lif,
        &ParameterMap::new(),
        Topology::Random { probability },
        rule,
    );
    net
}

fn bench_fixed_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("ci_fixed_step");
    group.sample_size(20);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(1));

    for (label, rule) in [
        ("static", PlasticityRuleKind::None),
        ("stdp", PlasticityRuleKind::Stdp),
    ] {
        let neuron_count = 1_000;
        let net = create_test_network(neuron_count, 0.01, rule);
        let mut sim = NetworkSimulator::with_network(net);
        let drive = vec![22.0; neuron_count / 10];

        group.throughput(Throughput::Elements(neuron_count as u64));
        group.bench_with_input(
            BenchmarkId::new("step", format!("1k_{label}")),
            &neuron_count,
            |b, _| {
                b.iter(|| {
                    if let Some(net) = sim.network_mut() {
                        net.stimulate_pattern("bench", black_box(&drive));
                    }
                    let _ = black_box(sim.step());
                });
            },
        );
    }

    group.finish();
}

fn bench_event_driven(c: &mut Criterion) {
    let mut group = c.benchmark_group("ci_event_driven");
    group.sample_size(20);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(1));

    let neuron_count = 1_000;
    let burst = 100;
    group.throughput(Throughput::Elements(burst as u64));
    group.bench_with_input(
        BenchmarkId::new("burst_to_quiescence", "1k_100"),
        &neuron_count,
        |b, &n| {
            let mut sim = EventDrivenSimulator::with_network(create_test_network(
                n,
                0.01,
                PlasticityRuleKind::None,
            ));
            b.iter(|| {
                sim.reset();
                for i in 0..burst {
                    sim.schedule_spike(NeuronId(i as u32 + 1), i as f64);
                }
                let _ = black_box(sim.run(100_000));
            });
        },
    );

    group.finish();
}

criterion_group!(benches, bench_fixed_step, bench_event_driven);
criterion_main!(benches);
