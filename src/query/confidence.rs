//! Path confidence scoring: multiplicative decay per hop, max across
//! independent paths.
//!
//! The product (not an average) is used deliberately: a single weak link
//! caps the whole chain and cannot be diluted by several strong hops, and a
//! longer inference chain is never more trustworthy than a shorter prefix
//! of it.

/// Extend a path's confidence by one hop: traverse `relationship_confidence`
/// to reach an entity with `entity_confidence`.
pub fn extend(parent: f64, relationship_confidence: f64, entity_confidence: f64) -> f64 {
    (parent * relationship_confidence * entity_confidence).clamp(0.0, 1.0)
}

/// Aggregate confidence for an entity reached via independent paths: the
/// best single piece of evidence wins. Averaging would let many weak paths
/// outvote one strong one.
pub fn combine(a: f64, b: f64) -> f64 {
    a.max(b)
}
