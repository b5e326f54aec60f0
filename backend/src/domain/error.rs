//! Error taxonomy shared by the domain and storage layers.

/// Every failure a ledger, rating or trust operation can surface to a caller
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Malformed input: bad enum value, out-of-range rating, negative money
    #[error("{0}")]
    Validation(String),

    /// Actor is not a party, or lacks the role for the requested change
    #[error("{0}")]
    Permission(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate rating, second open transaction on a book, self-request
    #[error("{0}")]
    Conflict(String),

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Translate a unique-constraint violation into `Conflict`, anything else into `Storage`
    pub fn from_insert(err: sqlx::Error, conflict_msg: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Conflict(conflict_msg.to_string())
            }
            _ => Self::Storage(err),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
