use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use kgraph::{snapshot, Config};

/// Print diagnostic counts for a knowledge-graph snapshot.
#[derive(Parser, Debug)]
#[command(name = "stats")]
struct Args {
    /// Path to the graph snapshot (defaults to the configured snapshot_path)
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Emit the stats as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::load()?;

    let graph_path = args
        .graph
        .unwrap_or_else(|| config.snapshot_path().to_path_buf());
    let store = snapshot::load(&graph_path)
        .with_context(|| format!("Failed to load graph from {}", graph_path.display()))?;
    let stats = store.stats();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("\n=== KGraph Snapshot Statistics ===\n");
    println!("Snapshot: {}", graph_path.display());
    println!();
    println!("Entities:      {}", stats.entity_count);
    println!("Relationships: {}", stats.relationship_count);
    println!("Documents:     {}", stats.document_count);

    if !stats.entities_by_type.is_empty() {
        println!("\nEntities by type:\n");
        println!("{:-<40}", "");
        println!("{:<28} {:>10}", "Type", "Count");
        println!("{:-<40}", "");
        for (entity_type, count) in &stats.entities_by_type {
            println!("{:<28} {:>10}", entity_type, count);
        }
        println!("{:-<40}", "");
    }

    if !stats.relationships_by_type.is_empty() {
        println!("\nRelationships by type:\n");
        println!("{:-<40}", "");
        println!("{:<28} {:>10}", "Type", "Count");
        println!("{:-<40}", "");
        for (rel_type, count) in &stats.relationships_by_type {
            println!("{:<28} {:>10}", rel_type, count);
        }
        println!("{:-<40}", "");
    }

    println!();

    Ok(())
}
