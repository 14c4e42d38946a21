// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # BrainLL
//!
//! Simulation core for networks of spiking and recurrent neurons with online
//! synaptic plasticity.
//!
//! ## Crates
//! - [`neural`]: neuron models, parameters and the neuron container
//! - [`plasticity`]: connections, learning rules and homeostasis
//! - [`engine`]: the network arena, populations and both simulators
//! - [`persistence`]: JSON and `BLNN` binary network files
//! - [`config`]: `brainll_configuration.toml` with environment and CLI overrides
//! - [`observability`]: logging setup
//!
//! This crate also wires them together: a loaded [`BrainllConfig`] becomes a
//! [`NetworkCore`], a simulator and a persistence backend.
//!
//! ```rust,no_run
//! use brainll::prelude::*;
//!
//! let config = BrainllConfig::default();
//! let mut network = brainll::network_from_config(&config);
//! let a = network.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
//! let b = network.add_neuron(NeuronModelKind::Lif, &ParameterMap::new());
//! network.add_connection(a, b, 5.0, PlasticityRuleKind::Stdp);
//!
//! let mut sim = brainll::simulator_from_config(&config, Some(network))?;
//! sim.run(1000)?;
//! # Ok::<(), brainll::Error>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use brainll_config as config;
pub use brainll_npu_engine as engine;
pub use brainll_npu_neural as neural;
pub use brainll_npu_plasticity as plasticity;
pub use brainll_observability as observability;
pub use brainll_persistence as persistence;

pub use brainll_config::{BrainllConfig, SimulationMode};
pub use brainll_npu_engine::{
    EventDrivenSimulator, NetworkConfig, NetworkCore, NetworkSimulator, Simulator,
};

use brainll_npu_neural::NeuronModelKind;
use brainll_npu_plasticity::{HomeostasisConfig, HomeostasisMode, PlasticityParameters};
use brainll_observability::CrateDebugFlags;
use brainll_persistence::NetworkPersistence;
use thiserror::Error;
use tracing::{info, warn};

pub mod prelude {
    pub use brainll_config::{load_config, BrainllConfig};
    pub use brainll_npu_engine::{
        CommandQueue, EventDrivenSimulator, NetworkConfig, NetworkCore, NetworkSimulator,
        SimulationCommand, SimulationRunner, Simulator, Topology,
    };
    pub use brainll_npu_neural::{ConnectionId, NeuronId, NeuronModelKind, ParameterMap};
    pub use brainll_npu_plasticity::{HomeostasisConfig, PlasticityRuleKind};
    pub use brainll_persistence::{persistence_for_format, NetworkPersistence};
}

/// Errors surfaced by the glue layer
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] brainll_config::ConfigError),

    #[error(transparent)]
    Persistence(#[from] brainll_persistence::PersistenceError),

    #[error(transparent)]
    Simulation(#[from] brainll_npu_engine::SimulationError),

    #[error("Unknown simulation mode '{0}' (expected fixed or event)")]
    UnknownMode(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Connection parameters for new connections from the `[network]` and `[stdp]` sections
pub fn connection_parameters(config: &BrainllConfig) -> PlasticityParameters {
    PlasticityParameters {
        learning_rate: config.stdp.learning_rate,
        tau_pre: config.stdp.tau_pre,
        tau_post: config.stdp.tau_post,
        a_plus: config.stdp.a_plus,
        a_minus: config.stdp.a_minus,
        stdp_window: config.stdp.window,
        stdp_traces: config.stdp.traces,
        weight_min: config.network.weight_min,
        weight_max: config.network.weight_max,
        delay: config.network.default_delay,
        ..PlasticityParameters::default()
    }
}

pub fn network_config(config: &BrainllConfig) -> NetworkConfig {
    NetworkConfig {
        timestep: config.simulation.timestep,
        random_seed: config.simulation.random_seed,
        learning_enabled: config.simulation.plasticity_enabled,
        default_weight: config.network.default_weight,
        connection_parameters: connection_parameters(config),
    }
}

/// `[homeostasis]` as the simulators use it; an unknown mode keeps synaptic scaling
pub fn homeostasis_config(config: &BrainllConfig) -> HomeostasisConfig {
    let section = &config.homeostasis;
    let mode = HomeostasisMode::parse(&section.mode).unwrap_or_else(|| {
        warn!(
            "[CONFIG] Unknown homeostasis mode '{}', using synaptic_scaling",
            section.mode
        );
        HomeostasisMode::SynapticScaling
    });
    HomeostasisConfig {
        mode,
        target_rate: section.target_rate,
        adaptation_rate: section.adaptation_rate,
        time_window: section.time_window,
        scaling_factor: section.scaling_factor,
        max_threshold_shift: section.max_threshold_shift,
    }
}

/// Model for neurons created without an explicit one (`[network] default_model`)
pub fn default_model(config: &BrainllConfig) -> NeuronModelKind {
    NeuronModelKind::from_name(&config.network.default_model)
}

/// Empty network with the configured timestep, seed and connection defaults
pub fn network_from_config(config: &BrainllConfig) -> NetworkCore {
    NetworkCore::new(network_config(config))
}

/// Simulator for `[simulation] mode`, configured and (if given) holding `network`.
///
/// A network's own timestep is replaced by the configured one.
pub fn simulator_from_config(
    config: &BrainllConfig,
    network: Option<NetworkCore>,
) -> Result<Box<dyn Simulator>> {
    let mode = config
        .simulation
        .simulation_mode()
        .ok_or_else(|| Error::UnknownMode(config.simulation.mode.clone()))?;

    let mut simulator: Box<dyn Simulator> = match mode {
        SimulationMode::Fixed => Box::new(NetworkSimulator::new()),
        SimulationMode::Event => Box::new(EventDrivenSimulator::new()),
    };
    simulator.set_homeostasis_config(homeostasis_config(config));

    let simulation = &config.simulation;
    match network {
        Some(network) => {
            simulator.attach_network(network);
            simulator.initialize(
                simulation.timestep,
                simulation.plasticity_enabled,
                simulation.homeostasis_enabled,
            )?;
        }
        None => {
            simulator.set_timestep(simulation.timestep)?;
            simulator.enable_plasticity(simulation.plasticity_enabled);
            simulator.enable_homeostasis(simulation.homeostasis_enabled);
        }
    }
    info!("[SIMULATOR] Created {} simulator (dt = {} ms)", mode, simulation.timestep);
    Ok(simulator)
}

/// Backend for `[persistence] format`
pub fn persistence_from_config(config: &BrainllConfig) -> Result<Box<dyn NetworkPersistence>> {
    Ok(brainll_persistence::persistence_for_format(
        &config.persistence.format,
    )?)
}

/// Debug flags from `[logging] debug_crates`, merged with `--debug-*` arguments and `BRAINLL_DEBUG`
pub fn debug_flags_from_config(config: &BrainllConfig) -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_names(&config.logging.debug_crates);
    flags.merge(&brainll_observability::parse_debug_flags());
    flags
}

/// Install console logging at `[logging] level`
pub fn init_logging_from_config(config: &BrainllConfig) -> anyhow::Result<()> {
    brainll_observability::init_logging(&debug_flags_from_config(config), &config.logging.level)
}
