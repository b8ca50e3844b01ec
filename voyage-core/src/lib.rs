pub mod identity;
pub mod payment;
pub mod search;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Authentication failed: {0}")]
    Unauthorized(String),
    #[error("Access denied: {0}")]
    Forbidden(String),
    #[error("Payment declined: {0}")]
    PaymentDeclined(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
