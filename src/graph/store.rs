//! In-memory graph store: record arenas plus derived lookup indexes.
//!
//! All indexes are fields of a [`GraphStore`] instance (no process-wide
//! state) and are updated synchronously with every mutation, so there is no
//! observable window where an index and its arena disagree.

use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::Serialize;

use crate::error::{KgraphError, Result};
use crate::graph::{Document, Entity, Relationship};

/// Diagnostic counts over a graph instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub entity_count: usize,
    pub relationship_count: usize,
    pub document_count: usize,
    pub entities_by_type: BTreeMap<String, usize>,
    pub relationships_by_type: BTreeMap<String, usize>,
}

/// Owns all entity/relationship/document records and their lookup indexes.
///
/// Mutation takes `&mut self` and querying takes `&self`, so independent
/// queries may share a store snapshot while the borrow checker rules out
/// concurrent ingestion.
#[derive(Debug, Default)]
pub struct GraphStore {
    entities: HashMap<String, Entity>,
    relationships: HashMap<String, Relationship>,
    documents: HashMap<String, Document>,

    /// Lowercased name or alias -> entity ids.
    name_index: HashMap<String, Vec<String>>,
    /// Entity type -> entity ids.
    type_index: HashMap<String, Vec<String>>,
    /// Entity id -> ids of relationships where it is the source.
    outgoing: HashMap<String, Vec<String>>,
    /// Entity id -> ids of relationships where it is the target.
    incoming: HashMap<String, Vec<String>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity, or idempotently re-insert one with a known id.
    ///
    /// Re-insertion merges: aliases and source_docs are unioned, attributes
    /// are merged per-key with the newer value winning, and name, type and
    /// confidence are taken from the newer record. Never fails on a
    /// duplicate id; returns the entity id.
    pub fn add_entity(&mut self, entity: Entity) -> Result<String> {
        validate_confidence(&entity.id, entity.extraction_confidence)?;

        let merged = match self.entities.remove(&entity.id) {
            Some(existing) => {
                self.unindex_entity(&existing);
                merge_entities(existing, entity)
            }
            None => entity,
        };

        let id = merged.id.clone();
        self.index_entity(&merged);
        self.entities.insert(id.clone(), merged);
        debug!("add_entity: {}", id);
        Ok(id)
    }

    /// Insert a relationship. Both endpoints must already exist in the
    /// entity arena; a dangling reference is rejected before any mutation.
    pub fn add_relationship(&mut self, rel: Relationship) -> Result<String> {
        validate_confidence(&rel.id, rel.extraction_confidence)?;

        if !self.entities.contains_key(&rel.source_entity_id) {
            return Err(KgraphError::Referential(format!(
                "relationship '{}' references unknown source entity '{}'",
                rel.id, rel.source_entity_id
            )));
        }
        if !self.entities.contains_key(&rel.target_entity_id) {
            return Err(KgraphError::Referential(format!(
                "relationship '{}' references unknown target entity '{}'",
                rel.id, rel.target_entity_id
            )));
        }

        // Idempotent re-insert: drop the old adjacency entries first in case
        // the endpoints changed.
        if let Some(existing) = self.relationships.remove(&rel.id) {
            remove_id(self.outgoing.get_mut(&existing.source_entity_id), &existing.id);
            remove_id(self.incoming.get_mut(&existing.target_entity_id), &existing.id);
        }

        let id = rel.id.clone();
        push_unique(self.outgoing.entry(rel.source_entity_id.clone()).or_default(), &id);
        push_unique(self.incoming.entry(rel.target_entity_id.clone()).or_default(), &id);
        self.relationships.insert(id.clone(), rel);
        debug!("add_relationship: {}", id);
        Ok(id)
    }

    /// Insert or replace document metadata; returns the document id.
    pub fn add_document(&mut self, doc: Document) -> String {
        let id = doc.id.clone();
        self.documents.insert(id.clone(), doc);
        id
    }

    pub fn get_entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    pub fn get_document(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Case-insensitive exact match against canonical names and aliases.
    /// Returns an empty vec (not an error) when nothing matches.
    pub fn find_entities_by_name(&self, name: &str) -> Vec<&Entity> {
        self.name_index
            .get(&name.trim().to_lowercase())
            .map(|ids| ids.iter().filter_map(|id| self.entities.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn find_entities_by_type(&self, entity_type: &str) -> Vec<&Entity> {
        self.type_index
            .get(entity_type)
            .map(|ids| ids.iter().filter_map(|id| self.entities.get(id)).collect())
            .unwrap_or_default()
    }

    /// Relationships where `entity_id` is the source. O(1) average via the
    /// adjacency index, not a scan.
    pub fn get_outgoing_relationships(&self, entity_id: &str) -> Vec<&Relationship> {
        self.outgoing
            .get(entity_id)
            .map(|ids| ids.iter().filter_map(|id| self.relationships.get(id)).collect())
            .unwrap_or_default()
    }

    /// Relationships where `entity_id` is the target.
    pub fn get_incoming_relationships(&self, entity_id: &str) -> Vec<&Relationship> {
        self.incoming
            .get(entity_id)
            .map(|ids| ids.iter().filter_map(|id| self.relationships.get(id)).collect())
            .unwrap_or_default()
    }

    /// Union of both directions: for each connected relationship, the
    /// relationship and the entity on the far end. This is the sole
    /// primitive the traversal engine uses to expand a frontier.
    ///
    /// An adjacency entry pointing at a missing record means invariant 2 was
    /// violated upstream and is surfaced as a `Consistency` error.
    pub fn get_neighbors(&self, entity_id: &str) -> Result<Vec<(&Relationship, &Entity)>> {
        let mut neighbors = Vec::new();
        for (index, far_end) in [(&self.outgoing, Direction::Target), (&self.incoming, Direction::Source)] {
            let Some(rel_ids) = index.get(entity_id) else {
                continue;
            };
            for rel_id in rel_ids {
                let rel = self.relationships.get(rel_id).ok_or_else(|| {
                    KgraphError::Consistency(format!(
                        "adjacency index of '{}' references missing relationship '{}'",
                        entity_id, rel_id
                    ))
                })?;
                let neighbor_id = match far_end {
                    Direction::Target => &rel.target_entity_id,
                    Direction::Source => &rel.source_entity_id,
                };
                let entity = self.entities.get(neighbor_id).ok_or_else(|| {
                    KgraphError::Consistency(format!(
                        "relationship '{}' endpoint '{}' is missing from the entity arena",
                        rel_id, neighbor_id
                    ))
                })?;
                neighbors.push((rel, entity));
            }
        }
        Ok(neighbors)
    }

    /// Counts for diagnostics; not used by traversal.
    pub fn stats(&self) -> GraphStats {
        let mut entities_by_type: BTreeMap<String, usize> = BTreeMap::new();
        for entity in self.entities.values() {
            *entities_by_type.entry(entity.entity_type.clone()).or_default() += 1;
        }
        let mut relationships_by_type: BTreeMap<String, usize> = BTreeMap::new();
        for rel in self.relationships.values() {
            *relationships_by_type.entry(rel.relationship_type.clone()).or_default() += 1;
        }
        GraphStats {
            entity_count: self.entities.len(),
            relationship_count: self.relationships.len(),
            document_count: self.documents.len(),
            entities_by_type,
            relationships_by_type,
        }
    }

    /// Drop every record and index.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn index_entity(&mut self, entity: &Entity) {
        push_unique(
            self.name_index.entry(entity.name.trim().to_lowercase()).or_default(),
            &entity.id,
        );
        for alias in &entity.aliases {
            push_unique(
                self.name_index.entry(alias.trim().to_lowercase()).or_default(),
                &entity.id,
            );
        }
        push_unique(
            self.type_index.entry(entity.entity_type.clone()).or_default(),
            &entity.id,
        );
    }

    fn unindex_entity(&mut self, entity: &Entity) {
        remove_index_entry(&mut self.name_index, &entity.name.trim().to_lowercase(), &entity.id);
        for alias in &entity.aliases {
            remove_index_entry(&mut self.name_index, &alias.trim().to_lowercase(), &entity.id);
        }
        remove_index_entry(&mut self.type_index, &entity.entity_type, &entity.id);
    }
}

enum Direction {
    Source,
    Target,
}

fn validate_confidence(id: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) || value.is_nan() {
        return Err(KgraphError::InvalidConfidence {
            id: id.to_string(),
            value,
        });
    }
    Ok(())
}

/// Last-write-wins merge for an idempotent re-insert of the same id.
fn merge_entities(existing: Entity, newer: Entity) -> Entity {
    let mut merged = newer;
    for alias in existing.aliases {
        if !merged.aliases.contains(&alias) {
            merged.aliases.push(alias);
        }
    }
    merged.source_docs.extend(existing.source_docs);
    for (key, value) in existing.attributes {
        merged.attributes.entry(key).or_insert(value);
    }
    merged
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}

fn remove_id(ids: Option<&mut Vec<String>>, id: &str) {
    if let Some(ids) = ids {
        ids.retain(|existing| existing != id);
    }
}

fn remove_index_entry(index: &mut HashMap<String, Vec<String>>, key: &str, id: &str) {
    if let Some(ids) = index.get_mut(key) {
        ids.retain(|existing| existing != id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn sample_store() -> GraphStore {
        let mut store = GraphStore::new();
        let org = Entity::new("organization", "Anthropic").with_alias("Anthropic PBC");
        let concept = Entity::new("concept", "Claude");
        let org_id = store.add_entity(org).unwrap();
        let concept_id = store.add_entity(concept).unwrap();
        store
            .add_relationship(Relationship::new("created", &org_id, &concept_id))
            .unwrap();
        store
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let store = sample_store();
        assert_eq!(store.find_entities_by_name("anthropic").len(), 1);
        assert_eq!(store.find_entities_by_name("ANTHROPIC").len(), 1);
        assert_eq!(store.find_entities_by_name("anthropic pbc").len(), 1);
        assert!(store.find_entities_by_name("unknown").is_empty());
    }

    #[test]
    fn test_find_by_type() {
        let store = sample_store();
        assert_eq!(store.find_entities_by_type("organization").len(), 1);
        assert_eq!(store.find_entities_by_type("concept").len(), 1);
        assert!(store.find_entities_by_type("person").is_empty());
    }

    #[test]
    fn test_idempotent_insert_no_duplicates() {
        let mut store = GraphStore::new();
        let id1 = store.add_entity(Entity::new("concept", "gravity")).unwrap();
        let id2 = store.add_entity(Entity::new("concept", "gravity")).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.stats().entity_count, 1);
        // Name index holds exactly one entry for the shared key
        assert_eq!(store.find_entities_by_name("gravity").len(), 1);
        assert_eq!(store.find_entities_by_type("concept").len(), 1);
    }

    #[test]
    fn test_reinsert_merges_aliases_and_docs() {
        let mut store = GraphStore::new();
        store
            .add_entity(
                Entity::new("concept", "RLHF")
                    .with_alias("reinforcement learning from human feedback")
                    .with_source_doc("doc-1"),
            )
            .unwrap();
        store
            .add_entity(
                Entity::new("concept", "RLHF")
                    .with_alias("RL from human feedback")
                    .with_source_doc("doc-2")
                    .with_attribute("field", json!("ml")),
            )
            .unwrap();

        let found = store.find_entities_by_name("rlhf");
        assert_eq!(found.len(), 1);
        let entity = found[0];
        assert_eq!(entity.aliases.len(), 2);
        assert_eq!(entity.source_docs.len(), 2);
        assert_eq!(entity.attributes["field"], json!("ml"));
        // Old alias remains indexed after the merge
        assert_eq!(
            store
                .find_entities_by_name("reinforcement learning from human feedback")
                .len(),
            1
        );
    }

    #[test]
    fn test_reinsert_attributes_last_write_wins() {
        let mut store = GraphStore::new();
        store
            .add_entity(Entity::new("person", "Ada").with_attribute("role", json!("engineer")))
            .unwrap();
        store
            .add_entity(Entity::new("person", "Ada").with_attribute("role", json!("founder")))
            .unwrap();
        let entity = store.find_entities_by_name("Ada")[0];
        assert_eq!(entity.attributes["role"], json!("founder"));
    }

    #[test]
    fn test_dangling_relationship_rejected_without_mutation() {
        let mut store = GraphStore::new();
        let org_id = store.add_entity(Entity::new("organization", "Acme")).unwrap();
        let before = store.stats();

        let result =
            store.add_relationship(Relationship::new("created", &org_id, "ent-missing"));
        assert!(matches!(result, Err(KgraphError::Referential(_))));

        let result =
            store.add_relationship(Relationship::new("created", "ent-missing", &org_id));
        assert!(matches!(result, Err(KgraphError::Referential(_))));

        assert_eq!(store.stats(), before);
        assert!(store.get_neighbors(&org_id).unwrap().is_empty());
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let mut store = GraphStore::new();
        let result = store.add_entity(Entity::new("concept", "x").with_confidence(1.5));
        assert!(matches!(result, Err(KgraphError::InvalidConfidence { .. })));
        let result = store.add_entity(Entity::new("concept", "x").with_confidence(-0.1));
        assert!(matches!(result, Err(KgraphError::InvalidConfidence { .. })));
        assert_eq!(store.stats().entity_count, 0);
    }

    #[test]
    fn test_neighbors_union_of_directions() {
        let mut store = GraphStore::new();
        let a = store.add_entity(Entity::new("concept", "a")).unwrap();
        let b = store.add_entity(Entity::new("concept", "b")).unwrap();
        let c = store.add_entity(Entity::new("concept", "c")).unwrap();
        store.add_relationship(Relationship::new("references", &a, &b)).unwrap();
        store.add_relationship(Relationship::new("references", &c, &a)).unwrap();

        let neighbors = store.get_neighbors(&a).unwrap();
        assert_eq!(neighbors.len(), 2);
        let ids: HashSet<&str> = neighbors.iter().map(|(_, e)| e.id.as_str()).collect();
        assert!(ids.contains(b.as_str()));
        assert!(ids.contains(c.as_str()));
    }

    #[test]
    fn test_directional_lookups() {
        let store = sample_store();
        let org = store.find_entities_by_name("Anthropic")[0];
        let concept = store.find_entities_by_name("Claude")[0];
        assert_eq!(store.get_outgoing_relationships(&org.id).len(), 1);
        assert_eq!(store.get_incoming_relationships(&org.id).len(), 0);
        assert_eq!(store.get_incoming_relationships(&concept.id).len(), 1);
    }

    #[test]
    fn test_relationship_reinsert_idempotent() {
        let mut store = GraphStore::new();
        let a = store.add_entity(Entity::new("concept", "a")).unwrap();
        let b = store.add_entity(Entity::new("concept", "b")).unwrap();
        let mut rel = Relationship::new("references", &a, &b);
        rel.id = "rel-fixed".to_string();
        store.add_relationship(rel.clone()).unwrap();
        store.add_relationship(rel).unwrap();
        assert_eq!(store.stats().relationship_count, 1);
        assert_eq!(store.get_outgoing_relationships(&a).len(), 1);
        assert_eq!(store.get_incoming_relationships(&b).len(), 1);
    }

    #[test]
    fn test_stats_by_type() {
        let store = sample_store();
        let stats = store.stats();
        assert_eq!(stats.entity_count, 2);
        assert_eq!(stats.relationship_count, 1);
        assert_eq!(stats.entities_by_type["organization"], 1);
        assert_eq!(stats.entities_by_type["concept"], 1);
        assert_eq!(stats.relationships_by_type["created"], 1);
    }

    #[test]
    fn test_clear() {
        let mut store = sample_store();
        store.clear();
        let stats = store.stats();
        assert_eq!(stats.entity_count, 0);
        assert_eq!(stats.relationship_count, 0);
        assert!(store.find_entities_by_name("Anthropic").is_empty());
    }
}
