// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core type definitions shared by every BrainLL crate

pub mod error;
pub mod ids;

pub use error::{Error, NeuralError, Result};
pub use ids::{ConnectionId, NeuronId};
