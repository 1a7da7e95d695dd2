pub mod config;
pub mod error;
pub mod graph;
pub mod query;
pub mod snapshot;

pub use config::Config;
pub use error::{KgraphError, Result};
pub use graph::{content_hash, Document, Entity, GraphStats, GraphStore, Relationship};
pub use query::{run_query, Finding, QueryOptions, QueryOutcome, QueryResult};
