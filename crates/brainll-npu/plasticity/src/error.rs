// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for plasticity configuration

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlasticityError {
    #[error("Invalid plasticity parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid weight bounds: min {min} > max {max}")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Unknown plasticity state key: {0}")]
    UnknownStateKey(String),
}

pub type Result<T> = std::result::Result<T, PlasticityError>;
