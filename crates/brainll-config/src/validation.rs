// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every check runs; all violations are reported together.

use crate::{BrainllConfig, ConfigError, ConfigResult};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const PERSISTENCE_FORMATS: &[&str] = &["json", "binary", "bin", "blnn"];
const HOMEOSTASIS_MODES: &[&str] = &[
    "synaptic_scaling",
    "scaling",
    "intrinsic_plasticity",
    "intrinsic",
];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    NotPositive { field: String, value: f64 },
    Negative { field: String, value: f64 },
    InvalidRange { field: String, min: f64, max: f64 },
    UnknownOption { field: String, value: String, expected: &'static [&'static str] },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPositive { field, value } => {
                write!(f, "{} = {} must be positive and finite", field, value)
            }
            Self::Negative { field, value } => {
                write!(f, "{} = {} must not be negative", field, value)
            }
            Self::InvalidRange { field, min, max } => {
                write!(f, "{}: minimum {} exceeds maximum {}", field, min, max)
            }
            Self::UnknownOption {
                field,
                value,
                expected,
            } => write!(
                f,
                "{} = '{}' is not one of: {}",
                field,
                value,
                expected.join(", ")
            ),
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &BrainllConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// All violations, in section order
pub fn collect_errors(config: &BrainllConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_simulation(config, &mut errors);
    validate_network(config, &mut errors);
    validate_stdp(config, &mut errors);
    validate_homeostasis(config, &mut errors);
    validate_options(config, &mut errors);
    errors
}

fn positive(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(ConfigValidationError::NotPositive {
            field: field.to_string(),
            value,
        });
    }
}

fn non_negative(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if value.is_nan() || value < 0.0 {
        errors.push(ConfigValidationError::Negative {
            field: field.to_string(),
            value,
        });
    }
}

fn validate_simulation(config: &BrainllConfig, errors: &mut Vec<ConfigValidationError>) {
    positive("simulation.timestep", config.simulation.timestep, errors);
    if config.simulation.max_steps == 0 {
        errors.push(ConfigValidationError::NotPositive {
            field: "simulation.max_steps".to_string(),
            value: 0.0,
        });
    }
    if config.simulation.simulation_mode().is_none() {
        errors.push(ConfigValidationError::UnknownOption {
            field: "simulation.mode".to_string(),
            value: config.simulation.mode.clone(),
            expected: &["fixed", "event"],
        });
    }
}

fn validate_network(config: &BrainllConfig, errors: &mut Vec<ConfigValidationError>) {
    let network = &config.network;
    non_negative("network.default_delay", network.default_delay, errors);
    if network.weight_min > network.weight_max {
        errors.push(ConfigValidationError::InvalidRange {
            field: "network.weight_min/weight_max".to_string(),
            min: network.weight_min,
            max: network.weight_max,
        });
    }
}

fn validate_stdp(config: &BrainllConfig, errors: &mut Vec<ConfigValidationError>) {
    let stdp = &config.stdp;
    positive("stdp.tau_pre", stdp.tau_pre, errors);
    positive("stdp.tau_post", stdp.tau_post, errors);
    non_negative("stdp.a_plus", stdp.a_plus, errors);
    non_negative("stdp.a_minus", stdp.a_minus, errors);
    non_negative("stdp.window", stdp.window, errors);
    non_negative("stdp.learning_rate", stdp.learning_rate, errors);
}

fn validate_homeostasis(config: &BrainllConfig, errors: &mut Vec<ConfigValidationError>) {
    let homeostasis = &config.homeostasis;
    non_negative("homeostasis.target_rate", homeostasis.target_rate, errors);
    non_negative(
        "homeostasis.adaptation_rate",
        homeostasis.adaptation_rate,
        errors,
    );
    positive("homeostasis.time_window", homeostasis.time_window, errors);
    non_negative(
        "homeostasis.max_threshold_shift",
        homeostasis.max_threshold_shift,
        errors,
    );
}

fn validate_options(config: &BrainllConfig, errors: &mut Vec<ConfigValidationError>) {
    let checks: [(&str, &String, &'static [&'static str]); 3] = [
        ("homeostasis.mode", &config.homeostasis.mode, HOMEOSTASIS_MODES),
        ("logging.level", &config.logging.level, LOG_LEVELS),
        ("persistence.format", &config.persistence.format, PERSISTENCE_FORMATS),
    ];
    for (field, value, expected) in checks {
        if !expected.contains(&value.to_ascii_lowercase().as_str()) {
            errors.push(ConfigValidationError::UnknownOption {
                field: field.to_string(),
                value: value.clone(),
                expected,
            });
        }
    }
}
