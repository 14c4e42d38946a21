// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Reward-modulated eligibility-trace learning

use crate::params::PlasticityParameters;

/// Time constant (ms) with which the reward baseline follows the actual reward
pub const BASELINE_TAU: f64 = 10.0;

/// e = γ·e + pre·post
#[inline]
pub fn eligibility_step(trace: f64, pre: f64, post: f64, params: &PlasticityParameters) -> f64 {
    params.trace_decay * trace + pre * post
}

/// Baseline relaxes toward the reward with time constant [`BASELINE_TAU`]
#[inline]
pub fn baseline_step(baseline: f64, reward: f64, dt: f64) -> f64 {
    super::relax(baseline, reward, dt, BASELINE_TAU)
}

/// Weight rate: η · (reward − baseline) · e
#[inline]
pub fn reinforcement_rate(
    trace: f64,
    reward: f64,
    baseline: f64,
    params: &PlasticityParameters,
) -> f64 {
    params.learning_rate * (reward - baseline) * trace
}
