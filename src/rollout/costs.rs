//! Pure helpers for turning rollout losses into cost vectors.
//!
//! A candidate's cost is its rollout loss minus the smallest rollout loss
//! among all candidates at the same position:
//!
//!   c_i = L_i - min_j L_j
//!
//! so every cost vector is non-negative and contains at least one zero.

use crate::policy::Policy;

/// Loss contributed by one simulated step.
pub fn step_loss(prediction: u32, truth: u32, weight: f32, discount: f32) -> f32 {
    if prediction == truth {
        0.0
    } else {
        discount * weight
    }
}

/// Shift `costs` so that its minimum is exactly zero.
///
/// Empty input is left alone.
pub fn shift_to_zero_min(costs: &mut [f32]) {
    let min = costs.iter().copied().fold(f32::INFINITY, f32::min);
    if !min.is_finite() {
        return;
    }
    for cost in costs.iter_mut() {
        *cost -= min;
    }
}

/// Exclusive end of the rollout window started at position `t`.
///
/// The window covers at most `rollout` positions after `t`. Trailing
/// positions rolled out by the oracle cannot change any candidate's loss
/// and are dropped; if every position uses the oracle no rollout happens.
pub fn rollout_horizon(t: usize, n: usize, rollout: usize, policies: &[Policy]) -> usize {
    let start = t + 1;
    if policies[..n].iter().all(|p| p.is_oracle()) {
        return start.min(n);
    }
    let mut end = n.min(start.saturating_add(rollout));
    while end > start && policies[end - 1].is_oracle() {
        end -= 1;
    }
    end.max(start.min(n))
}
