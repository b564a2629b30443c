//! Host store errors. These sit below the engine's own `EngineError`
//! taxonomy: the host only reports what physically happened (row
//! missing, index missing), not which rule it violated.

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{table} row not found: {id}")]
    NotFound { table: String, id: String },

    #[error("table '{0}' is not declared in the schema")]
    UnknownTable(String),

    #[error("table '{table}' has no index named '{index}'")]
    UnknownIndex { table: String, index: String },

    #[error("scheduled function '{0}' is not registered")]
    UnknownScheduledFunction(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
