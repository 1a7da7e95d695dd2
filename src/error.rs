use thiserror::Error;

/// Main error type for KGraph
#[derive(Error, Debug)]
pub enum KgraphError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A relationship references an entity id not present in the graph
    #[error("Referential integrity error: {0}")]
    Referential(String),

    /// Extraction confidence outside the [0, 1] range
    #[error("Invalid extraction confidence {value} on '{id}': must be within [0, 1]")]
    InvalidConfidence { id: String, value: f64 },

    /// An index points at a record missing from the backing store.
    /// Indicates an invariant was violated upstream; never silently skipped.
    #[error("Graph consistency fault: {0}")]
    Consistency(String),

    /// Snapshot file missing, unreadable, or corrupt
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// Convenient Result type using KgraphError
pub type Result<T> = std::result::Result<T, KgraphError>;
