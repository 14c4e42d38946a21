// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # BrainLL Plasticity
//!
//! Synaptic learning for BrainLL networks:
//! - Pairwise, trace and triplet STDP
//! - BCM with a sliding threshold
//! - Hebbian and anti-Hebbian learning with optional decay
//! - Homeostatic synaptic scaling (per connection and per neuron)
//! - Reward-modulated eligibility traces
//!
//! ## Architecture
//! - [`rules`] holds the pure math, free of any state
//! - [`Connection`] owns weight, delay queue and [`PlasticityState`] and dispatches
//!   on its [`PlasticityRuleKind`]
//! - [`homeostasis`] holds the neuron-level rules applied by the simulators

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod connection;
pub mod error;
pub mod homeostasis;
pub mod kind;
pub mod params;
pub mod rules;
pub mod state;

pub use connection::{Connection, SynapticSignals};
pub use error::{PlasticityError, Result};
pub use homeostasis::{HomeostasisConfig, HomeostasisMode};
pub use kind::PlasticityRuleKind;
pub use params::PlasticityParameters;
pub use state::{PlasticityState, STATE_KEYS, WEIGHT_HISTORY_LEN};
