// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Homeostatic synaptic scaling

use crate::params::PlasticityParameters;

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 1.5;

/// Low-pass filter step for the firing-rate estimate (time constant `rate_tau`)
#[inline]
pub fn filter_rate(filtered: f64, rate: f64, dt: f64, params: &PlasticityParameters) -> f64 {
    super::relax(filtered, rate, dt, params.rate_tau)
}

/// Multiplicative weight scale pushing `filtered_rate` toward the target
///
/// Clamped to `[0.5, 1.5]` per update.
#[inline]
pub fn scaling_factor(filtered_rate: f64, dt: f64, params: &PlasticityParameters) -> f64 {
    let scale = 1.0 + params.scaling_factor * (params.target_rate - filtered_rate) * dt;
    scale.clamp(MIN_SCALE, MAX_SCALE)
}
