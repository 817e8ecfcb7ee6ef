//! Error type shared by all scoped operations.

use thiserror::Error;

/// Failure of a scoped data operation.
///
/// Store failures are passed through unchanged inside [`ScopeError::Db`];
/// the scoping layer never converts them into domain outcomes such as
/// not-found.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// Underlying database error, unchanged.
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    /// The rows involved violate what the scoped layer relies on, e.g. an
    /// organisation-owned row without a readable organisation id.
    #[error("scoped operation invalid: {0}")]
    Invalid(&'static str),
}
