// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Command queue for a simulation running on another thread.

Other threads push commands without touching the simulator; the simulation
loop drains and applies them between steps, so a command never lands in the
middle of a step.
*/

use std::collections::VecDeque;
use std::sync::Arc;

use brainll_npu_neural::NeuronId;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::simulator::Simulator;

/// A single deferred operation on a simulator
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationCommand {
    StimulateNeuron { neuron: NeuronId, current: f64 },
    StimulatePopulation { population: String, current: f64 },
    /// Per-member currents, in member order
    StimulatePattern { population: String, pattern: Vec<f64> },
    /// Same keys as [`Simulator::set_parameters`]
    SetParameter { name: String, value: String },
    SetReward(f64),
    SetLearning(bool),
    Pause,
    Resume,
    Reset,
    /// End the simulation loop; handled by the runner
    Stop,
}

impl SimulationCommand {
    /// Apply to `simulator`. Stimulation of unknown targets is logged and skipped.
    pub fn apply<S: Simulator>(self, simulator: &mut S) -> Result<()> {
        debug!("[RUNNER] Applying {:?}", self);
        match self {
            Self::StimulateNeuron { neuron, current } => {
                let applied = simulator
                    .network_mut()
                    .is_some_and(|n| n.stimulate_neuron(neuron, current));
                if !applied {
                    warn!("[RUNNER] Cannot stimulate {}: not found", neuron);
                }
            }
            Self::StimulatePopulation {
                population,
                current,
            } => {
                let applied = simulator
                    .network_mut()
                    .is_some_and(|n| n.stimulate_population(&population, current));
                if !applied {
                    warn!("[RUNNER] Cannot stimulate population '{}': not found", population);
                }
            }
            Self::StimulatePattern {
                population,
                pattern,
            } => {
                let applied = simulator
                    .network_mut()
                    .is_some_and(|n| n.stimulate_pattern(&population, &pattern));
                if !applied {
                    warn!("[RUNNER] Cannot stimulate population '{}': not found", population);
                }
            }
            Self::SetParameter { name, value } => {
                simulator.set_parameters([(name, value)])?;
            }
            Self::SetReward(reward) => {
                if let Some(network) = simulator.network_mut() {
                    network.set_reward(reward);
                }
            }
            Self::SetLearning(enabled) => {
                if let Some(network) = simulator.network_mut() {
                    network.set_learning_enabled(enabled);
                }
            }
            Self::Pause => simulator.pause(),
            Self::Resume => simulator.resume(),
            Self::Reset => simulator.reset(),
            Self::Stop => {}
        }
        Ok(())
    }
}

/// Thread-safe FIFO of [`SimulationCommand`]s; clones share the same queue
pub struct CommandQueue {
    queue: Arc<Mutex<VecDeque<SimulationCommand>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::with_capacity(100))),
        }
    }

    pub fn push(&self, command: SimulationCommand) {
        self.queue.lock().push_back(command);
    }

    /// Take every pending command, oldest first
    pub fn drain_all(&self) -> Vec<SimulationCommand> {
        self.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CommandQueue {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}
