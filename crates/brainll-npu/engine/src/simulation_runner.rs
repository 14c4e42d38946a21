// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Background simulation thread
//!
//! Runs a simulator on a dedicated thread:
//! - commands queued from other threads are applied between steps
//! - every step, and every external access through [`SimulationRunner::simulator`],
//!   happens under one lock, so structural edits never overlap a step
//! - shutdown is cooperative: the loop checks its flag between steps and while sleeping

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::command_queue::{CommandQueue, SimulationCommand};
use crate::error::SimulationError;
use crate::simulator::{SimulationState, Simulator};

/// Sleep between polls when there is nothing to simulate
const IDLE_POLL: Duration = Duration::from_millis(5);

/// Longest uninterrupted sleep; bounds shutdown latency
const SLEEP_CHUNK: Duration = Duration::from_millis(50);

/// Owns a simulator and steps it on a background thread
pub struct SimulationRunner<S: Simulator + 'static> {
    simulator: Arc<Mutex<S>>,
    commands: CommandQueue,
    running: Arc<AtomicBool>,
    step_interval: Arc<Mutex<Duration>>,
    steps_completed: Arc<AtomicU64>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl<S: Simulator + 'static> SimulationRunner<S> {
    pub fn new(simulator: S) -> Self {
        Self {
            simulator: Arc::new(Mutex::new(simulator)),
            commands: CommandQueue::new(),
            running: Arc::new(AtomicBool::new(false)),
            step_interval: Arc::new(Mutex::new(Duration::ZERO)),
            steps_completed: Arc::new(AtomicU64::new(0)),
            thread_handle: None,
        }
    }

    /// Shared handle to the simulator. Holding the lock pauses the loop.
    pub fn simulator(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.simulator)
    }

    /// Producer handle for other threads
    pub fn commands(&self) -> CommandQueue {
        self.commands.clone()
    }

    pub fn submit(&self, command: SimulationCommand) {
        self.commands.push(command);
    }

    /// Minimum wall-clock time per step; zero steps as fast as possible
    pub fn set_step_interval(&self, interval: Duration) {
        *self.step_interval.lock() = interval;
        info!("[RUNNER] Step interval set to {:?}", interval);
    }

    pub fn steps_completed(&self) -> u64 {
        self.steps_completed.load(Ordering::Relaxed)
    }

    /// Start the simulation loop in a background thread
    pub fn start(&mut self) -> Result<(), String> {
        if self.running.load(Ordering::Acquire) {
            return Err("Simulation loop already running".to_string());
        }
        // A loop that ended on a Stop command leaves its handle behind
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }

        info!("[RUNNER] Starting simulation loop");
        self.running.store(true, Ordering::Release);

        let simulator = self.simulator.clone();
        let commands = self.commands.clone();
        let running = self.running.clone();
        let step_interval = self.step_interval.clone();
        let steps_completed = self.steps_completed.clone();

        let spawned = thread::Builder::new()
            .name("brainll-simulation".to_string())
            .spawn(move || {
                simulation_loop(simulator, commands, running, step_interval, steps_completed)
            });
        match spawned {
            Ok(handle) => {
                self.thread_handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(format!("Failed to spawn simulation thread: {}", e))
            }
        }
    }

    /// Stop the loop and wait (bounded) for the thread to exit
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        let Some(handle) = self.thread_handle.take() else {
            return;
        };
        info!("[RUNNER] Stopping simulation loop...");

        let stop_timeout = Duration::from_secs(2);
        let (tx, rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(handle.join());
        });

        match rx.recv_timeout(stop_timeout) {
            Ok(Ok(())) => info!("[RUNNER] Simulation loop stopped cleanly"),
            Ok(Err(_)) => warn!("[RUNNER] Simulation thread panicked during shutdown"),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => warn!(
                "[RUNNER] Simulation loop did not stop within {:?}, proceeding with shutdown",
                stop_timeout
            ),
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                warn!("[RUNNER] Join thread disconnected unexpectedly")
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl<S: Simulator + 'static> Drop for SimulationRunner<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn simulation_loop<S: Simulator>(
    simulator: Arc<Mutex<S>>,
    commands: CommandQueue,
    running: Arc<AtomicBool>,
    step_interval: Arc<Mutex<Duration>>,
    steps_completed: Arc<AtomicU64>,
) {
    info!("[RUNNER] Simulation loop started");
    simulator.lock().context_mut().state = SimulationState::Running;

    while running.load(Ordering::Acquire) {
        let iteration_start = Instant::now();
        let idle = {
            let mut sim = simulator.lock();
            for command in commands.drain_all() {
                if command == SimulationCommand::Stop {
                    info!("[RUNNER] Stop command received");
                    running.store(false, Ordering::Release);
                    break;
                }
                if let Err(e) = command.apply(&mut *sim) {
                    warn!("[RUNNER] Command failed: {}", e);
                }
            }
            if !running.load(Ordering::Acquire) {
                break;
            }
            // Reset leaves the simulator stopped; the loop keeps it running
            if sim.state() == SimulationState::Stopped {
                sim.context_mut().state = SimulationState::Running;
            }

            if sim.state() == SimulationState::Paused {
                true
            } else {
                match sim.step() {
                    Ok(true) => {
                        steps_completed.fetch_add(1, Ordering::Relaxed);
                        false
                    }
                    Ok(false) | Err(SimulationError::NoNetwork) => true,
                    Err(e) => {
                        warn!("[RUNNER] Step failed: {}", e);
                        true
                    }
                }
            }
        };

        let interval = *step_interval.lock();
        let wait = if idle { interval.max(IDLE_POLL) } else { interval };
        let target_time = iteration_start + wait;
        while running.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now >= target_time {
                break;
            }
            thread::sleep((target_time - now).min(SLEEP_CHUNK));
        }
    }

    let mut sim = simulator.lock();
    if sim.state() == SimulationState::Running {
        sim.context_mut().state = SimulationState::Stopped;
    }
    debug!(
        "[RUNNER] Simulation loop exited after {} steps",
        steps_completed.load(Ordering::Relaxed)
    );
}
