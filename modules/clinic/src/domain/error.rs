use praxis_db::scoped::ScopeError;
use thiserror::Error;

/// Domain-level failure of a clinic operation.
///
/// Cross-organisation access never gets its own variant: a row that belongs
/// to another organisation surfaces as [`DomainError::NotFound`], exactly
/// like a row that does not exist.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: i64 },

    #[error("validation failed: {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("operation not permitted: {0}")]
    Forbidden(&'static str),

    #[error("stored row invalid: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] ScopeError),
}

impl DomainError {
    pub fn not_found(what: &'static str, id: i64) -> Self {
        Self::NotFound { what, id }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }
}
