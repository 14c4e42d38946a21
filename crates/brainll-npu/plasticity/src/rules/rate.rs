// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Rate-based rules: BCM and (anti-)Hebbian
//!
//! `pre` and `post` are non-negative activity levels. The returned deltas are
//! rates; callers multiply by the step length.

use crate::params::PlasticityParameters;

/// BCM sliding threshold: θ relaxes toward post² with time constant τθ
#[inline]
pub fn bcm_threshold_step(theta: f64, post: f64, dt: f64, params: &PlasticityParameters) -> f64 {
    super::relax(theta, post * post, dt, params.bcm_tau)
}

/// BCM weight rate: η · post · (post − θ) · pre
#[inline]
pub fn bcm_rate(pre: f64, post: f64, theta: f64, params: &PlasticityParameters) -> f64 {
    params.learning_rate * post * (post - theta) * pre
}

/// Hebbian weight rate: η · pre · post − decay · w
#[inline]
pub fn hebbian_rate(pre: f64, post: f64, weight: f64, params: &PlasticityParameters) -> f64 {
    params.learning_rate * pre * post - params.weight_decay * weight
}

/// Anti-Hebbian weight rate: −η · pre · post − decay · w
#[inline]
pub fn anti_hebbian_rate(pre: f64, post: f64, weight: f64, params: &PlasticityParameters) -> f64 {
    -params.learning_rate * pre * post - params.weight_decay * weight
}
