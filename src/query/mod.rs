//! Query module: confidence scoring, termination policy, and the stateful
//! multi-hop traversal engine.

pub mod confidence;
mod termination;
mod traversal;

pub use termination::{RoundSummary, TerminalState, TerminationPolicy};
pub use traversal::run_query;

use serde::Serialize;
use std::time::Duration;

/// Caller-supplied bounds for a single query.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Maximum number of expansion rounds.
    pub max_depth: usize,
    /// Stop as soon as any finding reaches this confidence.
    pub confidence_target: f64,
    /// Optional wall-clock budget, checked once per round alongside the
    /// termination policy. There is no mid-round cancellation.
    pub time_budget: Option<Duration>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            confidence_target: 0.7,
            time_budget: None,
        }
    }
}

/// Why a query stopped. Distinguishes a confident answer (`Satisfied`),
/// best-effort partial answers (`DepthLimitHit`, `Stalled`, `TimedOut`),
/// a fully-explored graph (`Exhausted`), and a query that never started
/// because no seed resolved (`NoEntryPoints`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutcome {
    Satisfied,
    DepthLimitHit,
    Exhausted,
    Stalled,
    TimedOut,
    NoEntryPoints,
}

impl From<TerminalState> for QueryOutcome {
    fn from(state: TerminalState) -> Self {
        match state {
            TerminalState::Satisfied => QueryOutcome::Satisfied,
            TerminalState::DepthLimitHit => QueryOutcome::DepthLimitHit,
            TerminalState::Exhausted => QueryOutcome::Exhausted,
            TerminalState::Stalled => QueryOutcome::Stalled,
            TerminalState::TimedOut => QueryOutcome::TimedOut,
        }
    }
}

/// A discovered entity with the best path that reached it.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub entity_id: String,
    pub entity_name: String,
    pub entity_type: String,
    /// Confidence of the best path, per the multiplicative decay model.
    pub confidence: f64,
    /// Round in which the entity was first discovered.
    pub depth: usize,
    /// Ordered relationship ids of the best path from an entry point.
    pub path: Vec<String>,
    /// Union of source documents over every entity and relationship on the
    /// path, entry point included.
    pub source_docs: Vec<String>,
}

/// The complete, always-terminating answer to a query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub outcome: QueryOutcome,
    /// Discovered entities sorted by confidence, best first. Entry points
    /// themselves are not findings.
    pub findings: Vec<Finding>,
    /// Entity ids the seed terms resolved to.
    pub entry_points: Vec<String>,
    /// Seed terms that matched nothing; recorded, never fatal on their own.
    pub unresolved_seeds: Vec<String>,
    /// Number of expansion rounds that ran.
    pub rounds: usize,
}
