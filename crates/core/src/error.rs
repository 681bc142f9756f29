use crate::types::DbId;

/// Closed set of failure categories understood by the HTTP boundary.
///
/// Every error type in the workspace reports one of these; the API layer
/// turns a kind into a status code through a single lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input.
    Validation,
    /// The requested entity does not exist.
    NotFound,
    /// A uniqueness rule was violated.
    Conflict,
    /// The operation is intentionally left unimplemented.
    NotImplemented,
    /// Anything unexpected. Details are logged, never returned.
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl CoreError {
    /// Shorthand for a validation failure with a single message.
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(vec![message.into()])
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}
