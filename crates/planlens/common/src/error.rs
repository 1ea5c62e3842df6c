//! Errors raised at the boundary between PlanLens and the database engine.

use thiserror::Error;

/// User-facing message for statements the engine refused to run.
pub const INVALID_QUERY_MESSAGE: &str = "Invalid SQL query!";

/// User-facing message for an unreachable engine.
pub const UNAVAILABLE_MESSAGE: &str = "An error has occurred: Failed to connect to the database! Please ensure that the database is running.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The engine rejected the statement. Any open transaction has already
    /// been rolled back by the executor that reported this.
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },
    /// The engine could not be reached or the session was lost.
    #[error("Database unavailable: {message}")]
    Unavailable { message: String },
}

impl ExecutionError {
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery { message: message.into() }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    /// Fixed message shown to end users; the detailed message stays in logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidQuery { .. } => INVALID_QUERY_MESSAGE,
            Self::Unavailable { .. } => UNAVAILABLE_MESSAGE,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let invalid = ExecutionError::invalid_query("syntax error at or near \"SELEC\"");
        assert_eq!(invalid.user_message(), "Invalid SQL query!");
        assert!(!invalid.is_unavailable());

        let unavailable = ExecutionError::unavailable("connection refused");
        assert!(unavailable.user_message().contains("Failed to connect to the database"));
        assert!(unavailable.is_unavailable());
    }

    #[test]
    fn test_display_keeps_detail() {
        let err = ExecutionError::invalid_query("relation \"foo\" does not exist");
        assert_eq!(err.to_string(), "Invalid query: relation \"foo\" does not exist");
    }
}
