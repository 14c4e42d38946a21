// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Pure STDP computation
//!
//! Three formulations share the same amplitudes and time constants:
//! - **Pairwise**: closed form on one pre/post spike-time pair
//! - **Trace**: online form on exponentially decaying pre/post traces
//! - **Triplet**: trace form whose amplitudes grow with a slower trace of the
//!   opposite side, capturing the frequency dependence of plasticity

use crate::params::PlasticityParameters;

/// Pairwise STDP weight change for `delta_t = t_post - t_pre`
///
/// - Δw = A+ · exp(-Δt/τ+) if Δt > 0 (pre before post, potentiation)
/// - Δw = -A- · exp(Δt/τ-) otherwise (depression)
/// - Δw = 0 when |Δt| ≥ the STDP window
///
/// # Example
/// ```
/// use brainll_npu_plasticity::rules::stdp::pairwise_stdp;
/// use brainll_npu_plasticity::PlasticityParameters;
///
/// let params = PlasticityParameters::default();
/// assert!(pairwise_stdp(5.0, &params) > 0.0);
/// assert!(pairwise_stdp(-5.0, &params) < 0.0);
/// assert_eq!(pairwise_stdp(150.0, &params), 0.0);
/// ```
#[inline]
pub fn pairwise_stdp(delta_t: f64, params: &PlasticityParameters) -> f64 {
    if delta_t.abs() >= params.stdp_window {
        return 0.0;
    }
    if delta_t > 0.0 {
        params.a_plus * (-delta_t / params.tau_pre).exp()
    } else {
        -params.a_minus * (delta_t / params.tau_post).exp()
    }
}

/// Online STDP on traces
///
/// A post spike potentiates by `A+ · x_pre`, a pre spike depresses by `A- · x_post`.
/// The traces are the values just before this step's spikes were added.
#[inline]
pub fn trace_stdp(
    pre_trace: f64,
    post_trace: f64,
    pre_spiked: bool,
    post_spiked: bool,
    params: &PlasticityParameters,
) -> f64 {
    let mut delta = 0.0;
    if post_spiked {
        delta += params.a_plus * pre_trace;
    }
    if pre_spiked {
        delta -= params.a_minus * post_trace;
    }
    delta
}

/// Fast and slow traces seen by the triplet rule
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TripletTraces {
    pub pre_fast: f64,
    pub post_fast: f64,
    pub pre_slow: f64,
    pub post_slow: f64,
}

/// Triplet STDP
///
/// ```text
/// post spike: Δw = x_pre  · (A+ + A3 · y_post_slow)
/// pre spike:  Δw = -y_post · (A- + A3 · x_pre_slow)
/// ```
#[inline]
pub fn triplet_stdp(
    traces: &TripletTraces,
    pre_spiked: bool,
    post_spiked: bool,
    params: &PlasticityParameters,
) -> f64 {
    let mut delta = 0.0;
    if post_spiked {
        delta += traces.pre_fast * (params.a_plus + params.triplet_a3 * traces.post_slow);
    }
    if pre_spiked {
        delta -= traces.post_fast * (params.a_minus + params.triplet_a3 * traces.pre_slow);
    }
    delta
}
