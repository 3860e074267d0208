use sea_orm::error::DbErr;
use thiserror::Error;

/// Error type shared by every service in the crate.
///
/// Transactional methods guarantee that any error leaves persisted state
/// unchanged: all mutations happen inside a single transaction that rolls
/// back when the error propagates, so failed calls are safely retryable.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    /// A referenced goal/product/item id does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A recipe line names an inventory item id that does not exist in the
    /// ledger at create/revise time. The whole operation is rejected.
    #[error("Invalid recipe reference: {0}")]
    InvalidRecipeReference(String),

    /// The requested state transition is not legal for the current history,
    /// e.g. undoing a fulfilment when the last action was not a pack.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A pack request clamped to zero: no cooler stock (or no remaining
    /// need) was available. Partial packs are not an error; callers must
    /// inspect the returned quantity instead.
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }
}
