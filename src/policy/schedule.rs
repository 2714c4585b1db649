//! How many policies have been frozen, advanced once per
//! `passes_per_policy` completed passes.

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct PolicySchedule {
    current: usize,
    budget: usize,
    passes_per_policy: usize,
    passes_since_new: usize,
}

impl PolicySchedule {
    pub fn new(budget: usize, passes_per_policy: usize) -> Self {
        Self {
            current: 0,
            budget: budget.max(1),
            passes_per_policy: passes_per_policy.max(1),
            passes_since_new: 0,
        }
    }

    /// A schedule with all `budget` policies already frozen, for prediction
    /// with a finished model.
    pub fn all_frozen(budget: usize, passes_per_policy: usize) -> Self {
        let mut schedule = Self::new(budget, passes_per_policy);
        schedule.current = schedule.budget;
        schedule
    }

    /// Number of frozen policies; also the id of the policy being trained.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Record a completed pass. Returns true when a new policy started.
    pub fn on_pass_boundary(&mut self) -> bool {
        self.passes_since_new += 1;
        if self.passes_since_new < self.passes_per_policy {
            return false;
        }
        self.passes_since_new = 0;

        if self.current + 1 >= self.budget {
            if self.current >= self.budget {
                return false;
            }
            warn!(
                current = self.current,
                budget = self.budget,
                "policy budget exhausted; continuing to train the last policy"
            );
            return false;
        }
        self.current += 1;
        info!(policy = self.current, budget = self.budget, "starting new policy");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advances_every_pass_by_default() {
        let mut schedule = PolicySchedule::new(3, 1);
        assert_eq!(schedule.current(), 0);
        assert!(schedule.on_pass_boundary());
        assert!(schedule.on_pass_boundary());
        assert_eq!(schedule.current(), 2);
    }

    #[test]
    fn test_clamps_to_budget() {
        let mut schedule = PolicySchedule::new(2, 1);
        assert!(schedule.on_pass_boundary());
        assert!(!schedule.on_pass_boundary());
        assert!(!schedule.on_pass_boundary());
        assert_eq!(schedule.current(), 1);
    }

    #[test]
    fn test_all_frozen_never_advances() {
        let mut schedule = PolicySchedule::all_frozen(2, 1);
        assert_eq!(schedule.current(), 2);
        assert!(!schedule.on_pass_boundary());
        assert_eq!(schedule.current(), 2);
    }

    #[test]
    fn test_passes_per_policy() {
        let mut schedule = PolicySchedule::new(4, 2);
        assert!(!schedule.on_pass_boundary());
        assert_eq!(schedule.current(), 0);
        assert!(schedule.on_pass_boundary());
        assert_eq!(schedule.current(), 1);
        assert!(!schedule.on_pass_boundary());
        assert!(schedule.on_pass_boundary());
        assert_eq!(schedule.current(), 2);
    }
}
