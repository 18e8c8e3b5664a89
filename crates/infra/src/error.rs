//! Errors surfaced by ledger operations.

use thiserror::Error;

use rentbook_core::DomainError;

use crate::store::StoreError;

/// Failure of a ledger operation.
///
/// Domain and storage failures are folded into one taxonomy so callers can
/// match on the kind without caring which layer raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Malformed input; nothing was read or written.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Name clash, or optimistic retries were exhausted.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Illegal status transition or corrupted state.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl LedgerError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}

impl From<DomainError> for LedgerError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                LedgerError::Validation(msg)
            }
            DomainError::InvariantViolation(msg) => LedgerError::InvariantViolation(msg),
            DomainError::NotFound(what) => LedgerError::NotFound(what),
            DomainError::Conflict(msg) => LedgerError::Conflict(msg),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => LedgerError::Conflict(msg),
            StoreError::TenantIsolation(msg) => LedgerError::TenantIsolation(msg),
            StoreError::InvalidBatch(msg) => LedgerError::InvariantViolation(msg),
            StoreError::Unavailable(msg) => LedgerError::StorageUnavailable(msg),
        }
    }
}
