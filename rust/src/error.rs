//! Error taxonomy shared by every planner operation.

use thiserror::Error;

/// Broad error category, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Internal,
}

/// Errors surfaced by planner operations.
///
/// Validation errors are raised before any scheduling begins. Not-found errors abort
/// only the operation that hit them. Internal errors never leave partial state behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("Internal scheduling error: {0}")]
    Internal(String),
}

impl PlannerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn meal_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: "Meal",
            id: id.to_string(),
        }
    }

    pub fn task_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: "Task",
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Upper-case tag used by transport layers.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}
