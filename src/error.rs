//! Error types for the query-orchestration pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {

    // =============================
    // Core Pipeline Errors
    // =============================

    /// The reasoning backend named a tool that is not in the registry.
    /// Recoverable inside the loop: recorded as an observation.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A store adapter failed (connection, auth, malformed query).
    /// Recoverable inside the loop: recorded as an observation.
    #[error("Adapter error: {0}")]
    AdapterError(String),

    /// The reasoning backend could not be reached. Fatal for the request.
    #[error("Reasoning backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The reasoning backend responded but the response was unusable.
    /// Fatal for the request.
    #[error("Reasoning backend error: {0}")]
    BackendError(String),

    /// The loop ran out of steps without a terminal decision.
    #[error("Step limit exceeded after {0} steps")]
    StepLimitExceeded(usize),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("SQL store error: {0}")]
    SqlError(#[from] sqlx::Error),

    #[error("Document store error: {0}")]
    DocumentStoreError(#[from] mongodb::error::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AgentError {
    /// Stable machine-readable tag for the transport layer.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::UnknownTool(_) => "unknown_tool",
            AgentError::AdapterError(_) => "adapter_error",
            AgentError::BackendUnavailable(_) => "backend_unavailable",
            AgentError::BackendError(_) => "backend_error",
            AgentError::StepLimitExceeded(_) => "step_limit_exceeded",
            AgentError::SerializationError(_) => "serialization_error",
            AgentError::HttpError(_) => "http_error",
            AgentError::SqlError(_) => "sql_error",
            AgentError::DocumentStoreError(_) => "document_store_error",
            AgentError::IoError(_) => "io_error",
        }
    }

    /// Single human-readable message per error, free of internals.
    pub fn user_message(&self) -> String {
        match self {
            AgentError::StepLimitExceeded(_) => {
                "I couldn't determine an answer for this query. Could you try \
                 rephrasing it or being more specific? For example: 'Show me clients \
                 from New York' or 'List top 5 portfolios by value'"
                    .to_string()
            }
            AgentError::BackendUnavailable(_) => {
                "The reasoning service is currently unreachable. Please try again shortly."
                    .to_string()
            }
            AgentError::BackendError(_) => {
                "The reasoning service returned an unusable response. Please try again."
                    .to_string()
            }
            other => format!("Query failed: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors_map_to_friendly_messages() {
        let err = AgentError::StepLimitExceeded(5);
        assert_eq!(err.kind(), "step_limit_exceeded");
        let msg = err.user_message();
        assert!(!msg.contains("Step limit"));
        assert!(msg.contains("rephrasing"));

        let err = AgentError::BackendUnavailable("connection refused".to_string());
        assert_eq!(err.kind(), "backend_unavailable");
        assert!(!err.user_message().contains("connection refused"));
    }
}
