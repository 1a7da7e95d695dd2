//! Stateful breadth-first traversal over the graph store.
//!
//! Breadth-first order is load-bearing: the first round an entity is
//! reached is via a shortest path, and under multiplicative decay a
//! shortest path has the highest-or-tied confidence, so "keep the best path
//! per entity" only has to compare rival paths within a single round.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Instant;

use log::{debug, info, warn};

use crate::error::{KgraphError, Result};
use crate::graph::GraphStore;
use crate::query::confidence;
use crate::query::{
    Finding, QueryOptions, QueryOutcome, QueryResult, RoundSummary, TerminationPolicy,
};

/// Best path recorded so far for one entity.
#[derive(Debug, Clone)]
struct PathState {
    confidence: f64,
    /// Ordered relationship ids from an entry point.
    path: Vec<String>,
    /// Union of source docs over the whole path.
    source_docs: BTreeSet<String>,
    depth: usize,
}

/// Run a confidence-scored multi-hop query from the given seed terms.
///
/// Seeds are resolved case-insensitively against entity names and aliases.
/// A seed that matches nothing is recorded in `unresolved_seeds` and
/// skipped; only when every seed fails does the query return a
/// `NoEntryPoints` outcome (with empty findings) instead of running.
///
/// The store is only read; all traversal state lives in this call, so
/// independent queries may run against the same store concurrently.
pub fn run_query(
    store: &GraphStore,
    seeds: &[String],
    options: &QueryOptions,
) -> Result<QueryResult> {
    let mut entry_points: Vec<String> = Vec::new();
    let mut unresolved_seeds: Vec<String> = Vec::new();
    let mut states: HashMap<String, PathState> = HashMap::new();

    for seed in seeds {
        let matches = store.find_entities_by_name(seed);
        if matches.is_empty() {
            warn!("seed '{}' resolved to no entities, skipping", seed);
            unresolved_seeds.push(seed.clone());
            continue;
        }
        for entity in matches {
            if states.contains_key(&entity.id) {
                continue;
            }
            // An entry point is self-evident: confidence 1.0, empty path.
            states.insert(
                entity.id.clone(),
                PathState {
                    confidence: 1.0,
                    path: Vec::new(),
                    source_docs: entity.source_docs.clone(),
                    depth: 0,
                },
            );
            entry_points.push(entity.id.clone());
        }
    }

    if entry_points.is_empty() {
        info!("no seed resolved to an entity, returning no_entry_points");
        return Ok(QueryResult {
            outcome: QueryOutcome::NoEntryPoints,
            findings: Vec::new(),
            entry_points,
            unresolved_seeds,
            rounds: 0,
        });
    }

    let policy = TerminationPolicy {
        max_depth: options.max_depth,
        confidence_target: options.confidence_target,
        time_budget: options.time_budget,
    };

    if options.max_depth == 0 {
        return assemble(
            store,
            QueryOutcome::DepthLimitHit,
            &states,
            &entry_points,
            unresolved_seeds,
            0,
        );
    }

    let started = Instant::now();
    let mut visited_entities: HashSet<String> = entry_points.iter().cloned().collect();
    let mut visited_relationships: HashSet<String> = HashSet::new();
    let mut frontier: Vec<String> = entry_points.clone();
    let mut depth = 0;
    let mut best_confidence: Option<f64> = None;

    let outcome = loop {
        let mut next_frontier: Vec<String> = Vec::new();
        let mut discovered_this_round: HashSet<String> = HashSet::new();
        let mut candidate_edges = 0;

        for entity_id in &frontier {
            let parent = states
                .get(entity_id)
                .cloned()
                .ok_or_else(|| {
                    KgraphError::Consistency(format!(
                        "frontier entity '{}' has no recorded path state",
                        entity_id
                    ))
                })?;

            for (rel, neighbor) in store.get_neighbors(entity_id)? {
                if visited_relationships.contains(&rel.id) {
                    continue;
                }
                candidate_edges += 1;
                visited_relationships.insert(rel.id.clone());

                let newly_discovered = !visited_entities.contains(&neighbor.id);
                if !newly_discovered && !discovered_this_round.contains(&neighbor.id) {
                    // Reached an entity from an earlier round (or a seed);
                    // its existing path is at most as long and cannot score
                    // lower under multiplicative decay.
                    continue;
                }

                let path_confidence = confidence::extend(
                    parent.confidence,
                    rel.extraction_confidence,
                    neighbor.extraction_confidence,
                );

                if let Some(existing) = states.get(&neighbor.id) {
                    // Rival path within the same round: the best single
                    // piece of evidence wins.
                    if confidence::combine(existing.confidence, path_confidence)
                        <= existing.confidence
                    {
                        continue;
                    }
                }

                let mut path = parent.path.clone();
                path.push(rel.id.clone());
                let mut source_docs = parent.source_docs.clone();
                source_docs.extend(rel.source_docs.iter().cloned());
                source_docs.extend(neighbor.source_docs.iter().cloned());

                states.insert(
                    neighbor.id.clone(),
                    PathState {
                        confidence: path_confidence,
                        path,
                        source_docs,
                        depth: depth + 1,
                    },
                );
                best_confidence = Some(match best_confidence {
                    Some(best) => confidence::combine(best, path_confidence),
                    None => path_confidence,
                });

                if newly_discovered {
                    visited_entities.insert(neighbor.id.clone());
                    discovered_this_round.insert(neighbor.id.clone());
                    next_frontier.push(neighbor.id.clone());
                }
            }
        }

        depth += 1;
        let summary = RoundSummary {
            depth,
            best_confidence,
            candidate_edges,
            newly_discovered: discovered_this_round.len(),
        };
        debug!(
            "round {}: {} candidate edges, {} new entities, best confidence {:?}",
            depth, candidate_edges, summary.newly_discovered, best_confidence
        );
        frontier = next_frontier;

        if let Some(state) = policy.evaluate(&summary, started.elapsed()) {
            break QueryOutcome::from(state);
        }
    };

    assemble(store, outcome, &states, &entry_points, unresolved_seeds, depth)
}

fn assemble(
    store: &GraphStore,
    outcome: QueryOutcome,
    states: &HashMap<String, PathState>,
    entry_points: &[String],
    unresolved_seeds: Vec<String>,
    rounds: usize,
) -> Result<QueryResult> {
    let seed_ids: HashSet<&str> = entry_points.iter().map(String::as_str).collect();
    let mut findings = Vec::new();
    for (entity_id, state) in states {
        if seed_ids.contains(entity_id.as_str()) {
            continue;
        }
        let entity = store.get_entity(entity_id).ok_or_else(|| {
            KgraphError::Consistency(format!(
                "finding references entity '{}' missing from the store",
                entity_id
            ))
        })?;
        findings.push(Finding {
            entity_id: entity_id.clone(),
            entity_name: entity.name.clone(),
            entity_type: entity.entity_type.clone(),
            confidence: state.confidence,
            depth: state.depth,
            path: state.path.clone(),
            source_docs: state.source_docs.iter().cloned().collect(),
        });
    }
    // Best first; name tiebreak keeps output deterministic across runs.
    findings.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.entity_name.cmp(&b.entity_name))
    });

    Ok(QueryResult {
        outcome,
        findings,
        entry_points: entry_points.to_vec(),
        unresolved_seeds,
        rounds,
    })
}
