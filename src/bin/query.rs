use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use kgraph::{run_query, snapshot, Config, QueryOptions};

/// Query a knowledge-graph snapshot with confidence-scored multi-hop
/// traversal. Prints findings with provenance as JSON.
#[derive(Parser, Debug)]
#[command(name = "query")]
struct Args {
    /// Path to the graph snapshot (defaults to the configured snapshot_path)
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Seed terms to start the traversal from (entity names or aliases)
    #[arg(long = "query", required = true, num_args = 1..)]
    query: Vec<String>,

    /// Maximum number of expansion rounds
    #[arg(long)]
    max_depth: Option<usize>,

    /// Stop as soon as any finding reaches this confidence [0, 1]
    #[arg(long)]
    confidence: Option<f64>,

    /// Wall-clock budget for the traversal, in milliseconds
    #[arg(long)]
    time_budget_ms: Option<u64>,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::load()?;

    if let Some(confidence) = args.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            anyhow::bail!("--confidence must be between 0.0 and 1.0");
        }
    }

    let graph_path = args
        .graph
        .unwrap_or_else(|| config.snapshot_path().to_path_buf());
    let store = snapshot::load(&graph_path)
        .with_context(|| format!("Failed to load graph from {}", graph_path.display()))?;

    let options = QueryOptions {
        max_depth: args.max_depth.unwrap_or(config.query.default_max_depth),
        confidence_target: args
            .confidence
            .unwrap_or(config.query.default_confidence_target),
        time_budget: args
            .time_budget_ms
            .or(config.query.time_budget_ms)
            .map(Duration::from_millis),
    };

    let result = run_query(&store, &args.query, &options)?;

    let output = if args.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{}", output);

    Ok(())
}
