//! Termination policy: decides after each traversal round whether to keep
//! expanding.

use std::time::Duration;

/// Terminal states of a traversal. All are final; `Running` is implicit in
/// `evaluate` returning `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    /// Best finding reached the caller's confidence target.
    Satisfied,
    /// The round counter reached the caller's max depth.
    DepthLimitHit,
    /// No candidate edges remained anywhere on the frontier.
    Exhausted,
    /// Candidate edges existed but every one led to an already-visited
    /// entity. Distinct from `Exhausted`: the frontier was not empty, it
    /// was just unproductive.
    Stalled,
    /// The wall-clock budget ran out.
    TimedOut,
}

/// What one full expansion round produced, as seen by the policy.
#[derive(Debug, Clone, Copy)]
pub struct RoundSummary {
    /// Round counter after the round completed.
    pub depth: usize,
    /// Best confidence over all findings so far; `None` before anything is
    /// discovered. Entry points are self-evident and do not count.
    pub best_confidence: Option<f64>,
    /// Unvisited relationships examined during the round, whether or not
    /// they led anywhere new.
    pub candidate_edges: usize,
    /// Entities discovered for the first time this round.
    pub newly_discovered: usize,
}

/// Evaluated once per round; never mid-round.
#[derive(Debug, Clone)]
pub struct TerminationPolicy {
    pub max_depth: usize,
    pub confidence_target: f64,
    pub time_budget: Option<Duration>,
}

impl TerminationPolicy {
    /// Check the round against the policy. Order matters: a satisfied
    /// target stops the query even with depth budget remaining, and the
    /// depth limit is reported in preference to `Exhausted`/`Stalled` when
    /// several conditions coincide.
    pub fn evaluate(&self, round: &RoundSummary, elapsed: Duration) -> Option<TerminalState> {
        if round
            .best_confidence
            .is_some_and(|best| best >= self.confidence_target)
        {
            return Some(TerminalState::Satisfied);
        }
        if self.time_budget.is_some_and(|budget| elapsed >= budget) {
            return Some(TerminalState::TimedOut);
        }
        if round.depth >= self.max_depth {
            return Some(TerminalState::DepthLimitHit);
        }
        if round.candidate_edges == 0 {
            return Some(TerminalState::Exhausted);
        }
        if round.newly_discovered == 0 {
            return Some(TerminalState::Stalled);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_depth: usize, target: f64) -> TerminationPolicy {
        TerminationPolicy {
            max_depth,
            confidence_target: target,
            time_budget: None,
        }
    }

    fn round(depth: usize, best: Option<f64>, candidates: usize, new: usize) -> RoundSummary {
        RoundSummary {
            depth,
            best_confidence: best,
            candidate_edges: candidates,
            newly_discovered: new,
        }
    }

    #[test]
    fn test_running_when_productive() {
        let state = policy(5, 0.9).evaluate(&round(1, Some(0.4), 10, 3), Duration::ZERO);
        assert_eq!(state, None);
    }

    #[test]
    fn test_satisfied_at_target() {
        let state = policy(5, 0.5).evaluate(&round(1, Some(0.5), 10, 3), Duration::ZERO);
        assert_eq!(state, Some(TerminalState::Satisfied));
    }

    #[test]
    fn test_satisfied_wins_over_depth_limit() {
        // Target reached on the same round the depth budget ran out
        let state = policy(1, 0.5).evaluate(&round(1, Some(0.9), 0, 0), Duration::ZERO);
        assert_eq!(state, Some(TerminalState::Satisfied));
    }

    #[test]
    fn test_depth_limit_before_exhausted() {
        let state = policy(2, 0.99).evaluate(&round(2, Some(0.1), 0, 0), Duration::ZERO);
        assert_eq!(state, Some(TerminalState::DepthLimitHit));
    }

    #[test]
    fn test_exhausted_when_no_candidates() {
        let state = policy(5, 0.99).evaluate(&round(1, Some(0.1), 0, 0), Duration::ZERO);
        assert_eq!(state, Some(TerminalState::Exhausted));
    }

    #[test]
    fn test_stalled_when_candidates_all_visited() {
        let state = policy(5, 0.99).evaluate(&round(1, Some(0.1), 4, 0), Duration::ZERO);
        assert_eq!(state, Some(TerminalState::Stalled));
    }

    #[test]
    fn test_no_findings_is_not_satisfied() {
        let state = policy(5, 0.0).evaluate(&round(1, None, 3, 2), Duration::ZERO);
        assert_eq!(state, None);
    }

    #[test]
    fn test_time_budget() {
        let p = TerminationPolicy {
            max_depth: 5,
            confidence_target: 0.99,
            time_budget: Some(Duration::from_millis(10)),
        };
        let state = p.evaluate(&round(1, Some(0.1), 3, 2), Duration::from_millis(11));
        assert_eq!(state, Some(TerminalState::TimedOut));
        let state = p.evaluate(&round(1, Some(0.1), 3, 2), Duration::from_millis(5));
        assert_eq!(state, None);
    }
}
