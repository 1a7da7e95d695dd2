//! Knowledge graph module: record types and the in-memory graph store.
//!
//! Entities and relationships live in flat arenas keyed by id; all
//! cross-references are ids, so cyclic structure needs no special handling.

mod store;

pub use store::{GraphStats, GraphStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

fn default_confidence() -> f64 {
    1.0
}

/// A graph node: a real-world thing extracted from the corpus
/// (person, organization, concept, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identifier, derived from `(type, name)` so re-ingestion of the
    /// same content produces the same id.
    pub id: String,
    /// Open classification tag, e.g. `person`, `organization`, `concept`.
    /// New corpora introduce new types, so this is not a closed enum.
    pub entity_type: String,
    /// Canonical display name.
    pub name: String,
    /// Alternate names; indexed case-insensitively alongside `name`.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Open key/value facts. Known keys are validated at the ingestion
    /// boundary, not here.
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
    /// Ids of documents that contributed to this entity.
    #[serde(default)]
    pub source_docs: BTreeSet<String>,
    /// Extraction confidence in [0, 1]; 1.0 for manually-created entities.
    #[serde(default = "default_confidence")]
    pub extraction_confidence: f64,
}

impl Entity {
    /// Create an entity with a deterministic id derived from `(type, name)`.
    pub fn new(entity_type: &str, name: &str) -> Self {
        let id = format!(
            "ent-{}",
            short_hash(&format!("{}:{}", entity_type, name.to_lowercase()))
        );
        Self {
            id,
            entity_type: entity_type.to_string(),
            name: name.to_string(),
            aliases: Vec::new(),
            attributes: BTreeMap::new(),
            source_docs: BTreeSet::new(),
            extraction_confidence: 1.0,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.extraction_confidence = confidence;
        self
    }

    pub fn with_attribute(mut self, key: &str, value: serde_json::Value) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }

    pub fn with_source_doc(mut self, doc_id: &str) -> Self {
        self.source_docs.insert(doc_id.to_string());
        self
    }
}

/// A directed, typed edge between two entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique identifier (UUID v4 unless supplied by the caller).
    pub id: String,
    /// Open relation type, e.g. `references`, `supports`, `works_with`.
    pub relationship_type: String,
    /// Must reference an entity present in the graph at insert time.
    pub source_entity_id: String,
    /// Must reference an entity present in the graph at insert time.
    pub target_entity_id: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub source_docs: BTreeSet<String>,
    #[serde(default = "default_confidence")]
    pub extraction_confidence: f64,
}

impl Relationship {
    pub fn new(relationship_type: &str, source_entity_id: &str, target_entity_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            relationship_type: relationship_type.to_string(),
            source_entity_id: source_entity_id.to_string(),
            target_entity_id: target_entity_id.to_string(),
            attributes: BTreeMap::new(),
            source_docs: BTreeSet::new(),
            extraction_confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.extraction_confidence = confidence;
        self
    }

    pub fn with_source_doc(mut self, doc_id: &str) -> Self {
        self.source_docs.insert(doc_id.to_string());
        self
    }
}

/// Provenance metadata for an ingested source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier derived from the path.
    pub id: String,
    pub path: String,
    pub title: String,
    /// SHA256 of the document content, used for change detection.
    pub content_hash: String,
    pub chunk_count: usize,
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    pub fn new(path: &str, title: &str, content_hash: &str, chunk_count: usize) -> Self {
        Self {
            id: format!("doc-{}", short_hash(path)),
            path: path.to_string(),
            title: title.to_string(),
            content_hash: content_hash.to_string(),
            chunk_count,
            indexed_at: Utc::now(),
        }
    }
}

/// Compute SHA256 hash of content bytes (change detection for documents).
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// First 16 hex chars of SHA256 over `seed`; enough to avoid collisions
/// within a single-corpus graph while keeping ids readable.
fn short_hash(seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}
