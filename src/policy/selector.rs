//! Stochastic choice among the frozen policies, the current one and the oracle.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::error;

/// The policy that produces a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Policy {
    /// A learned policy. Ids below the current policy count are frozen; the
    /// id equal to the count is the policy being trained right now.
    Learned(usize),
    /// Answers with the true label.
    Oracle,
}

impl Policy {
    pub fn is_oracle(self) -> bool {
        matches!(self, Policy::Oracle)
    }
}

/// Mixes policies with a truncated geometric law that favours the most
/// recent one.
#[derive(Debug)]
pub struct PolicySelector {
    rng: StdRng,
    beta: f32,
}

impl PolicySelector {
    pub fn new(beta: f32, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            beta,
        }
    }

    /// Pick a policy given `count` frozen policies.
    ///
    /// With `beta >= 1` the choice is deterministic: the current policy if
    /// allowed, else the newest frozen one, else the oracle.
    pub fn choose(&mut self, count: usize, allow_oracle: bool, allow_current: bool) -> Policy {
        if self.beta >= 1.0 {
            if allow_current {
                return Policy::Learned(count);
            }
            if count > 0 {
                return Policy::Learned(count - 1);
            }
            if allow_oracle {
                return Policy::Oracle;
            }
            error!(count, "internal error (bug): no valid policy to choose from; using current");
            return Policy::Learned(count);
        }

        let valid = count + allow_oracle as usize + allow_current as usize;
        if valid == 0 {
            error!(count, "internal error (bug): no valid policy to choose from; using current");
            return Policy::Learned(count);
        }

        let rank = if valid == 1 { 0 } else { self.sample_rank(valid) };
        rank_to_policy(rank, valid, count, allow_oracle, allow_current)
    }

    /// Rank in `0..valid`, rank 0 with probability `beta`, each further rank
    /// geometrically less likely.
    fn sample_rank(&mut self, valid: usize) -> usize {
        let beta = self.beta as f64;
        let mut u: f64 = self.rng.gen();
        let mut rank = 0;
        if u > beta {
            u -= beta;
            while u > 0.0 && rank < valid - 1 {
                rank += 1;
                u -= beta * (1.0 - beta).powi(rank as i32);
            }
        }
        rank
    }
}

/// Map a rank (0 = most recent) onto a policy, counting backward.
fn rank_to_policy(
    rank: usize,
    valid: usize,
    count: usize,
    allow_oracle: bool,
    allow_current: bool,
) -> Policy {
    if allow_oracle && rank == valid - 1 {
        return Policy::Oracle;
    }
    let newest = if allow_current { count } else { count.saturating_sub(1) };
    Policy::Learned(newest.saturating_sub(rank))
}
