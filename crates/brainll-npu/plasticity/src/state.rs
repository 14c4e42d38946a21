// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Mutable learning state carried by each connection

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{PlasticityError, Result};
use crate::params::PlasticityParameters;
use crate::rules::TripletTraces;

/// Number of recent weight deltas kept per connection
pub const WEIGHT_HISTORY_LEN: usize = 100;

/// Keys accepted by [`PlasticityState::set_value`]
pub const STATE_KEYS: &[&str] = &[
    "last_update_time",
    "eligibility_trace",
    "average_activity",
    "pre_trace",
    "post_trace",
    "pre_trace_slow",
    "post_trace_slow",
    "bcm_threshold",
    "filtered_rate",
    "reward_baseline",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlasticityState {
    pub last_update_time: f64,
    pub eligibility_trace: f64,
    /// Slow running average of post-synaptic activity
    pub average_activity: f64,
    pub pre_trace: f64,
    pub post_trace: f64,
    pub pre_trace_slow: f64,
    pub post_trace_slow: f64,
    pub bcm_threshold: f64,
    pub filtered_rate: f64,
    pub reward_baseline: f64,
    pub weight_history: VecDeque<f64>,
}

impl Default for PlasticityState {
    fn default() -> Self {
        Self::new(&PlasticityParameters::default())
    }
}

impl PlasticityState {
    pub fn new(params: &PlasticityParameters) -> Self {
        Self {
            last_update_time: 0.0,
            eligibility_trace: 0.0,
            average_activity: 0.0,
            pre_trace: 0.0,
            post_trace: 0.0,
            pre_trace_slow: 0.0,
            post_trace_slow: 0.0,
            bcm_threshold: params.bcm_threshold,
            filtered_rate: 0.0,
            reward_baseline: 0.0,
            weight_history: VecDeque::with_capacity(WEIGHT_HISTORY_LEN),
        }
    }

    /// Exponential decay of every trace over `dt`
    pub fn decay_traces(&mut self, dt: f64, params: &PlasticityParameters) {
        if dt <= 0.0 {
            return;
        }
        let pre = (-dt / params.tau_pre).exp();
        let post = (-dt / params.tau_post).exp();
        let slow = (-dt / params.tau_slow).exp();
        self.pre_trace *= pre;
        self.post_trace *= post;
        self.pre_trace_slow *= slow;
        self.post_trace_slow *= slow;
    }

    /// Add this step's spikes to the traces
    pub fn register_spikes(&mut self, pre_spiked: bool, post_spiked: bool) {
        if pre_spiked {
            self.pre_trace += 1.0;
            self.pre_trace_slow += 1.0;
        }
        if post_spiked {
            self.post_trace += 1.0;
            self.post_trace_slow += 1.0;
        }
    }

    pub fn triplet_traces(&self) -> TripletTraces {
        TripletTraces {
            pre_fast: self.pre_trace,
            post_fast: self.post_trace,
            pre_slow: self.pre_trace_slow,
            post_slow: self.post_trace_slow,
        }
    }

    /// Record an applied weight change, keeping only the most recent ones
    pub fn record_change(&mut self, delta: f64) {
        if self.weight_history.len() == WEIGHT_HISTORY_LEN {
            self.weight_history.pop_front();
        }
        self.weight_history.push_back(delta);
    }

    /// Scalar state as a name/value map
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        STATE_KEYS
            .iter()
            .filter_map(|key| self.value(key).map(|v| (key.to_string(), v)))
            .collect()
    }

    pub fn value(&self, key: &str) -> Option<f64> {
        let value = match key {
            "last_update_time" => self.last_update_time,
            "eligibility_trace" => self.eligibility_trace,
            "average_activity" => self.average_activity,
            "pre_trace" => self.pre_trace,
            "post_trace" => self.post_trace,
            "pre_trace_slow" => self.pre_trace_slow,
            "post_trace_slow" => self.post_trace_slow,
            "bcm_threshold" => self.bcm_threshold,
            "filtered_rate" => self.filtered_rate,
            "reward_baseline" => self.reward_baseline,
            _ => return None,
        };
        Some(value)
    }

    pub fn set_value(&mut self, key: &str, value: f64) -> Result<()> {
        let slot = match key {
            "last_update_time" => &mut self.last_update_time,
            "eligibility_trace" => &mut self.eligibility_trace,
            "average_activity" => &mut self.average_activity,
            "pre_trace" => &mut self.pre_trace,
            "post_trace" => &mut self.post_trace,
            "pre_trace_slow" => &mut self.pre_trace_slow,
            "post_trace_slow" => &mut self.post_trace_slow,
            "bcm_threshold" => &mut self.bcm_threshold,
            "filtered_rate" => &mut self.filtered_rate,
            "reward_baseline" => &mut self.reward_baseline,
            other => return Err(PlasticityError::UnknownStateKey(other.to_string())),
        };
        *slot = value;
        Ok(())
    }
}
