// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # BrainLL Simulation Engine
//!
//! Owns the network and moves it through time.
//!
//! ## Architecture
//! - **NetworkCore**: slot arena of neurons and connections, populations, the seeded RNG
//! - **NetworkSimulator**: fixed-timestep driver
//!   (integrate → emit → deliver → plasticity → homeostasis → advance)
//! - **EventDrivenSimulator**: priority queue of fire/delivery events, time jumps between events
//! - **SimulationRunner**: background thread stepping a simulator and draining a command queue
//!
//! Both simulators implement [`Simulator`], so the runner and callers can treat them alike.
//! The core is single-threaded; the runner serialises every mutation behind one lock.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod command_queue;
pub mod error;
pub mod event_driven;
pub mod network_core;
pub mod population;
pub mod simulation_runner;
pub mod simulator;
pub mod snapshot;
pub mod topology;

pub use command_queue::{CommandQueue, SimulationCommand};
pub use error::{NetworkError, NetworkResult, Result, SimulationError};
pub use event_driven::EventDrivenSimulator;
pub use network_core::{NetworkConfig, NetworkCore, NetworkStats};
pub use population::Population;
pub use simulation_runner::SimulationRunner;
pub use simulator::{
    NetworkSimulator, SimulationContext, SimulationState, Simulator, SpikeCallback, StopHandle,
};
pub use snapshot::{ConnectionSnapshot, NetworkSnapshot, NeuronSnapshot, PopulationSnapshot};
pub use topology::Topology;

use std::time::Duration;

/// Simulation statistics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationStats {
    /// Fixed steps or processed events
    pub total_steps: u64,
    pub total_spikes: u64,
    /// Spikes handed to their target neuron
    pub total_deliveries: u64,
    pub total_processing_time_us: u64,
}

impl SimulationStats {
    pub fn record(&mut self, spikes: usize, deliveries: usize, elapsed: Duration) {
        self.total_steps += 1;
        self.total_spikes += spikes as u64;
        self.total_deliveries += deliveries as u64;
        self.total_processing_time_us += elapsed.as_micros() as u64;
    }

    /// Get average spikes per step
    pub fn avg_spikes_per_step(&self) -> f64 {
        if self.total_steps == 0 {
            0.0
        } else {
            self.total_spikes as f64 / self.total_steps as f64
        }
    }

    /// Get average processing time per step (microseconds)
    pub fn avg_processing_time_us(&self) -> f64 {
        if self.total_steps == 0 {
            0.0
        } else {
            self.total_processing_time_us as f64 / self.total_steps as f64
        }
    }

    /// Get average deliveries per spike (effective fan-out)
    pub fn avg_deliveries_per_spike(&self) -> f64 {
        if self.total_spikes == 0 {
            0.0
        } else {
            self.total_deliveries as f64 / self.total_spikes as f64
        }
    }
}
