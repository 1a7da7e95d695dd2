//! Snapshot persistence: the whole graph as flat JSON keyed by id.
//!
//! Only the records are serialized; name/type/adjacency indexes are derived
//! state and are rebuilt on load by re-inserting every record through the
//! normal store API, so load exercises exactly the same validation as live
//! ingestion.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{KgraphError, Result};
use crate::graph::{Document, Entity, GraphStore, Relationship};

/// On-disk layout: three top-level collections, each keyed by record id.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    entities: BTreeMap<String, Entity>,
    relationships: BTreeMap<String, Relationship>,
    documents: BTreeMap<String, Document>,
}

/// Serialize the store to `path`, overwriting any previous snapshot
/// wholesale (no incremental diffing).
pub fn save(store: &GraphStore, path: &Path) -> Result<()> {
    let snapshot = Snapshot {
        entities: store.entities().map(|e| (e.id.clone(), e.clone())).collect(),
        relationships: store
            .relationships()
            .map(|r| (r.id.clone(), r.clone()))
            .collect(),
        documents: store.documents().map(|d| (d.id.clone(), d.clone())).collect(),
    };
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &snapshot)?;
    // Flush explicitly: BufWriter's Drop discards write errors, which would
    // let a truncated snapshot pass as a successful save.
    writer.flush()?;
    info!(
        "saved snapshot to {}: {} entities, {} relationships, {} documents",
        path.display(),
        snapshot.entities.len(),
        snapshot.relationships.len(),
        snapshot.documents.len()
    );
    Ok(())
}

/// Read a snapshot and rebuild a fully-indexed store.
///
/// Entities are inserted before relationships so the referential check
/// holds; a missing or corrupt file fails fast and never yields a
/// partially-populated graph.
pub fn load(path: &Path) -> Result<GraphStore> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        KgraphError::Snapshot(format!("cannot read snapshot {}: {}", path.display(), e))
    })?;
    let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
        KgraphError::Snapshot(format!("corrupt snapshot {}: {}", path.display(), e))
    })?;

    let mut store = GraphStore::new();
    for (_, entity) in snapshot.entities {
        store.add_entity(entity)?;
    }
    for (_, rel) in snapshot.relationships {
        store.add_relationship(rel)?;
    }
    for (_, doc) in snapshot.documents {
        store.add_document(doc);
    }
    info!("loaded snapshot from {}", path.display());
    Ok(store)
}
