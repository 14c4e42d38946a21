// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # BrainLL Neural Computation
//!
//! Everything that happens inside a single neuron:
//! - **Types**: identities and the error type
//! - **Models**: one struct per neuron model behind the [`NeuronModel`] trait
//! - **Neuron**: the container holding potential, input buffer and spike history
//!
//! Network wiring, spike transport and plasticity live in the sibling crates.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod models;
pub mod neuron;
pub mod types;

pub use models::{
    create_model, IzhikevichPreset, ModelParameters, ModelState, NeuronModel, NeuronModelKind,
    NeuronParameters, ParameterMap, PARAMETER_NAMES,
};
pub use neuron::{Neuron, NO_SPIKE, SPIKE_HISTORY_WINDOW};
pub use types::{ConnectionId, Error, NeuralError, NeuronId, Result};
