// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pure learning-rule math
//!
//! Nothing here owns state; [`crate::Connection`] keeps the traces and thresholds
//! and calls into these functions.

pub mod homeostatic;
pub mod rate;
pub mod reinforcement;
pub mod stdp;

/// Move `current` toward `target` with time constant `tau` over an interval `dt`
///
/// Exact solution of `dx/dt = (target − x)/τ` for a constant target, so it never
/// overshoots however long the interval.
#[inline]
pub fn relax(current: f64, target: f64, dt: f64, tau: f64) -> f64 {
    if dt <= 0.0 {
        return current;
    }
    current + (1.0 - (-dt / tau).exp()) * (target - current)
}

pub use homeostatic::{filter_rate, scaling_factor};
pub use rate::{anti_hebbian_rate, bcm_rate, bcm_threshold_step, hebbian_rate};
pub use reinforcement::{baseline_step, eligibility_step, reinforcement_rate};
pub use stdp::{pairwise_stdp, trace_stdp, triplet_stdp, TripletTraces};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relax_never_overshoots() {
        for dt in [0.1, 1.0, 25.0, 1_000.0, 1e9] {
            let x = relax(0.0, 1.0, dt, 10.0);
            assert!((0.0..=1.0).contains(&x), "dt {} gave {}", dt, x);
        }
        assert_eq!(relax(0.3, 1.0, 0.0, 10.0), 0.3);
        assert_eq!(relax(0.3, 1.0, -1.0, 10.0), 0.3);
    }
}
