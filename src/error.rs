use thiserror::Error;

/// Error type for dbrelay operations
#[derive(Debug, Error)]
pub enum DbRelayError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Failed to serialize bind value: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Failed to decode JSON column `{column}`: {source}")]
    Decode {
        column: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for dbrelay operations
pub type Result<T> = std::result::Result<T, DbRelayError>;
