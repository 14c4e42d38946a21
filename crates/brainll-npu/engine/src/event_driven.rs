// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Event-driven simulation
//!
//! Time jumps from one event to the next instead of advancing in fixed steps.
//! There are two kinds of event:
//!
//! - **Fire**: a neuron emits a spike (scheduled externally or by an input
//!   neuron rescheduling itself)
//! - **Deliver**: a spike in flight on a connection reaches its target
//!
//! Events are ordered by time, then by scheduling order. A delivered spike is
//! never applied before `emission_time + delay`.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Instant;

use brainll_npu_neural::{ConnectionId, Neuron, NeuronId};
use tracing::{debug, info, trace, warn};

use crate::error::{Result, SimulationError};
use crate::network_core::{connection_at_mut, neuron_at, neuron_at_mut, NetworkCore};
use crate::simulator::{
    apply_homeostasis, update_plasticity, SimulationContext, SimulationState, Simulator,
    TIME_EPSILON,
};
use crate::SimulationStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Fire(NeuronId),
    Deliver(ConnectionId),
}

#[derive(Debug, Clone, Copy)]
struct Event {
    time: f64,
    seq: u64,
    kind: EventKind,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.seq.cmp(&other.seq))
    }
}

#[derive(Debug, Default)]
struct EventQueue {
    heap: BinaryHeap<Reverse<Event>>,
    next_seq: u64,
}

impl EventQueue {
    fn push(&mut self, time: f64, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Event { time, seq, kind }));
    }

    fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(event)| event)
    }

    fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|Reverse(event)| event.time)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.next_seq = 0;
    }
}

/// Event-driven driver; one `step` processes one event
pub struct EventDrivenSimulator {
    context: SimulationContext,
    queue: EventQueue,
}

impl Default for EventDrivenSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDrivenSimulator {
    pub fn new() -> Self {
        Self {
            context: SimulationContext::new(None),
            queue: EventQueue::default(),
        }
    }

    /// Input neurons of `network` are scheduled immediately
    pub fn with_network(network: NetworkCore) -> Self {
        let mut sim = Self {
            context: SimulationContext::new(Some(network)),
            queue: EventQueue::default(),
        };
        sim.schedule_input_neurons();
        sim
    }

    /// Schedule `neuron` to fire at `time`.
    ///
    /// Returns false (and schedules nothing) for times before the current time and
    /// for unknown neurons.
    pub fn schedule_spike(&mut self, neuron: NeuronId, time: f64) -> bool {
        let Some(network) = self.context.network.as_ref() else {
            warn!("[EVENT-SIM] Cannot schedule {}: no network attached", neuron);
            return false;
        };
        if !time.is_finite() || time < network.current_time() {
            warn!(
                "[EVENT-SIM] Ignoring spike for {} at {} (current time {})",
                neuron,
                time,
                network.current_time()
            );
            return false;
        }
        if network.neuron(neuron).is_none() {
            warn!("[EVENT-SIM] Cannot schedule unknown neuron {}", neuron);
            return false;
        }
        self.queue.push(time, EventKind::Fire(neuron));
        true
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn next_event_time(&self) -> Option<f64> {
        self.queue.peek_time()
    }

    /// Process every event due at or before `until`, then move the clock to `until`.
    ///
    /// Returns the number of events processed. A stop request leaves the clock at
    /// the last processed event.
    pub fn run_until_time(&mut self, until: f64) -> Result<usize> {
        self.context.require_network()?;
        if self.context.state == SimulationState::Paused {
            return Err(SimulationError::Paused);
        }
        self.context.stop.clear();
        self.context.state = SimulationState::Running;

        let mut processed = 0;
        let mut interrupted = false;
        let outcome = loop {
            if !self.next_event_time().is_some_and(|t| t <= until) {
                break Ok(());
            }
            if self.context.stop.take() {
                interrupted = true;
                break Ok(());
            }
            match self.step() {
                Ok(true) => processed += 1,
                Ok(false) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        if !interrupted && outcome.is_ok() {
            if let Some(network) = self.context.network.as_mut() {
                network.advance_time(until);
            }
        }
        if self.context.state == SimulationState::Running {
            self.context.state = SimulationState::Stopped;
        }
        outcome.map(|()| processed)
    }

    fn schedule_input_neurons(&mut self) {
        let Some(network) = self.context.network.as_ref() else {
            return;
        };
        let now = network.current_time();
        let inputs: Vec<(NeuronId, f64)> = network
            .neurons()
            .filter_map(|n| n.input_interval().map(|interval| (n.id(), interval)))
            .collect();
        for (id, interval) in &inputs {
            self.queue.push(now + interval, EventKind::Fire(*id));
        }
        if !inputs.is_empty() {
            debug!("[EVENT-SIM] Scheduled {} input neurons", inputs.len());
        }
    }

    fn process_next_event(&mut self) -> Result<bool> {
        if self.context.state == SimulationState::Paused {
            return Err(SimulationError::Paused);
        }
        let SimulationContext {
            network,
            plasticity_enabled,
            homeostasis_enabled,
            homeostasis,
            callback,
            stats,
            ..
        } = &mut self.context;
        let network = network.as_mut().ok_or(SimulationError::NoNetwork)?;
        let Some(event) = self.queue.pop() else {
            return Ok(false);
        };
        let started = Instant::now();
        let now = event.time;
        network.advance_time(now);
        let learning = *plasticity_enabled && network.learning_enabled();
        let reward = network.reward();
        let (neurons, connections, rng) = network.parts_mut();

        let mut fired: Vec<NeuronId> = Vec::new();
        let mut delivered = 0;
        let involved = match event.kind {
            EventKind::Fire(id) => {
                let Some(neuron) = neuron_at_mut(neurons, id) else {
                    trace!("[EVENT-SIM] Dropping fire event for removed {}", id);
                    return Ok(true);
                };
                neuron.fire(now);
                fired.push(id);
                if let Some(interval) = neuron.input_interval() {
                    self.queue.push(now + interval, EventKind::Fire(id));
                }
                id
            }
            EventKind::Deliver(cid) => {
                let Some(connection) = connection_at_mut(connections, cid) else {
                    trace!("[EVENT-SIM] Dropping delivery on removed {}", cid);
                    return Ok(true);
                };
                // A reset clears spikes in flight; their events become no-ops
                let due = connection.take_due(now + TIME_EPSILON);
                let target = connection.target();
                let weight = connection.weight();
                if let Some(neuron) = neuron_at_mut(neurons, target) {
                    for _ in 0..due {
                        delivered += 1;
                        if neuron.receive_spike(now, weight, rng) {
                            fired.push(target);
                        }
                    }
                }
                target
            }
        };

        for &id in &fired {
            if let Some(callback) = callback.as_mut() {
                callback(id, now);
            }
            let outgoing = neuron_at(neurons, id)
                .map(|n| n.outgoing().to_vec())
                .unwrap_or_default();
            for cid in outgoing {
                if let Some(connection) = connection_at_mut(connections, cid) {
                    let delivery = connection.transmit_spike(now);
                    self.queue.push(delivery, EventKind::Deliver(cid));
                }
            }
        }

        if learning && !fired.is_empty() {
            let view: &[Option<Neuron>] = &*neurons;
            let mut incident: Vec<ConnectionId> = fired
                .iter()
                .filter_map(|id| neuron_at(view, *id))
                .flat_map(|n| n.incoming().iter().chain(n.outgoing()).copied())
                .collect();
            incident.sort_unstable();
            incident.dedup();

            let spiked = |id: NeuronId| fired.contains(&id);
            for cid in incident {
                if let Some(connection) = connection_at_mut(connections, cid) {
                    let dt = (now - connection.plasticity_state().last_update_time).max(0.0);
                    update_plasticity(view, connection, now, dt, reward, &spiked);
                }
            }
        }

        if *homeostasis_enabled {
            let mut regulated = fired.clone();
            regulated.push(involved);
            regulated.sort_unstable();
            regulated.dedup();
            apply_homeostasis(neurons, connections, homeostasis, now, Some(&regulated));
        }

        // Fire flags only mean "fired in this event"
        for id in &fired {
            if let Some(neuron) = neuron_at_mut(neurons, *id) {
                neuron.clear_fired();
            }
        }

        stats.record(fired.len(), delivered, started.elapsed());
        trace!(
            "[EVENT-SIM] t={:.3} {:?} fired={} pending={}",
            now,
            event.kind,
            fired.len(),
            self.queue.len()
        );
        Ok(true)
    }
}

impl Simulator for EventDrivenSimulator {
    fn context(&self) -> &SimulationContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut SimulationContext {
        &mut self.context
    }

    fn step(&mut self) -> Result<bool> {
        self.process_next_event()
    }

    fn reset(&mut self) {
        if let Some(network) = self.context.network.as_mut() {
            network.reset_state();
        }
        self.queue.clear();
        self.context.state = SimulationState::Stopped;
        self.context.stats = SimulationStats::default();
        self.context.stop.clear();
        self.schedule_input_neurons();
        info!("[EVENT-SIM] Reset");
    }

    fn on_network_changed(&mut self) {
        self.queue.clear();
        self.schedule_input_neurons();
    }

    /// Also clears the event queue and schedules every input neuron
    fn initialize(&mut self, dt: f64, plasticity: bool, homeostasis: bool) -> Result<()> {
        self.context.configure(dt, plasticity, homeostasis)?;
        self.queue.clear();
        self.schedule_input_neurons();
        Ok(())
    }
}
