// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for neuron operations

use super::ids::NeuronId;

/// Error types for neuron construction and state handling
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NeuralError {
    #[error("Neuron not found: {0}")]
    NeuronNotFound(NeuronId),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid model state: {0}")]
    InvalidState(String),
}

pub type Result<T> = core::result::Result<T, NeuralError>;
pub type Error = NeuralError;
